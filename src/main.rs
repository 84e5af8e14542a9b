mod api;
mod app;
mod forms;
mod routes;
mod session;
mod slots;
mod ui;
mod utils;
mod views;

use adw::prelude::*;
use adw::Application;
use tracing_subscriber::EnvFilter;

fn main() -> glib::ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("serviflex_gtk=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    log::info!("starting ServiFlex {}", env!("CARGO_PKG_VERSION"));

    let app = Application::builder()
        .application_id("br.serviflex.ServiFlexGtk")
        .build();
    app.connect_activate(|app| {
        crate::app::build_ui(app);
    });
    app.run()
}
