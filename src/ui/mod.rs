pub mod admin;
pub mod appointments;
pub mod booking;
pub mod establishments;
pub mod layout;
pub mod login;
pub mod main_window;
pub mod professional;
pub mod profile;
pub mod register;
pub mod widgets;
