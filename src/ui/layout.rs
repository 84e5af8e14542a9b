use adw::prelude::*;
use chrono::Datelike;
use gtk4 as gtk;

use crate::ui::main_window::Navigator;

/// Frames a page: header bar (with "Sair" on protected pages), scrolling
/// content and the footer.
pub fn wrap(nav: &Navigator, content: &gtk::Widget, protected: bool) -> gtk::Widget {
    let container = gtk::Box::new(gtk::Orientation::Vertical, 0);

    let header = adw::HeaderBar::new();
    let title = gtk::Label::new(Some("ServiFlex"));
    title.add_css_class("title-3");
    header.set_title_widget(Some(&title));
    if protected {
        if let Some(name) = nav.session().user_name() {
            let who = gtk::Label::new(Some(&name));
            who.add_css_class("dim-label");
            header.pack_start(&who);
        }
        let logout = gtk::Button::with_label("Sair");
        logout.add_css_class("destructive-action");
        let nav = nav.clone();
        logout.connect_clicked(move |_| nav.logout());
        header.pack_end(&logout);
    }
    container.append(&header);

    let scroller = gtk::ScrolledWindow::builder()
        .vexpand(true)
        .hexpand(true)
        .hscrollbar_policy(gtk::PolicyType::Never)
        .build();
    let clamp = adw::Clamp::builder().maximum_size(720).child(content).build();
    scroller.set_child(Some(&clamp));
    container.append(&scroller);

    let footer = gtk::Label::new(Some(&format!(
        "© {} Serviflex. Todos os direitos reservados.",
        chrono::Local::now().year()
    )));
    footer.add_css_class("dim-label");
    footer.add_css_class("caption");
    footer.set_margin_top(8);
    footer.set_margin_bottom(8);
    container.append(&footer);

    container.upcast()
}
