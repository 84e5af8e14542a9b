use adw::prelude::*;
use gtk4 as gtk;

/// Vertical page body with a heading.
pub fn page(title: &str) -> gtk::Box {
    let root = gtk::Box::new(gtk::Orientation::Vertical, 12);
    root.set_margin_top(24);
    root.set_margin_bottom(24);
    root.set_margin_start(24);
    root.set_margin_end(24);

    let heading = gtk::Label::new(Some(title));
    heading.add_css_class("title-2");
    heading.set_halign(gtk::Align::Start);
    heading.set_wrap(true);
    root.append(&heading);
    root
}

/// Inline message shown under a form or above a list. Hidden while empty.
#[derive(Clone)]
pub struct Banner {
    label: gtk::Label,
}

impl Banner {
    pub fn new() -> Self {
        let label = gtk::Label::new(None);
        label.set_halign(gtk::Align::Start);
        label.set_wrap(true);
        label.set_visible(false);
        Self { label }
    }

    pub fn widget(&self) -> &gtk::Label {
        &self.label
    }

    pub fn error(&self, text: &str) {
        self.show(text, "error");
    }

    pub fn success(&self, text: &str) {
        self.show(text, "success");
    }

    pub fn info(&self, text: &str) {
        self.show(text, "dim-label");
    }

    fn show(&self, text: &str, class: &str) {
        for c in ["error", "success", "dim-label"] {
            self.label.remove_css_class(c);
        }
        self.label.add_css_class(class);
        self.label.set_label(text);
        self.label.set_visible(true);
    }

    pub fn clear(&self) {
        self.label.set_label("");
        self.label.set_visible(false);
    }
}

pub fn entry(placeholder: &str) -> gtk::Entry {
    let entry = gtk::Entry::new();
    entry.set_placeholder_text(Some(placeholder));
    entry.set_hexpand(true);
    entry
}

pub fn entry_with(placeholder: &str, text: &str) -> gtk::Entry {
    let e = entry(placeholder);
    e.set_text(text);
    e
}

pub fn password(placeholder: &str) -> gtk::PasswordEntry {
    let entry = gtk::PasswordEntry::new();
    entry.set_placeholder_text(Some(placeholder));
    entry.set_show_peek_icon(true);
    entry.set_hexpand(true);
    entry
}

/// Label stacked over a field.
pub fn field(label: &str, widget: &impl IsA<gtk::Widget>) -> gtk::Box {
    let b = gtk::Box::new(gtk::Orientation::Vertical, 4);
    let l = gtk::Label::new(Some(label));
    l.set_halign(gtk::Align::Start);
    l.add_css_class("heading");
    b.append(&l);
    b.append(widget);
    b
}

pub fn button(label: &str, class: Option<&str>) -> gtk::Button {
    let b = gtk::Button::with_label(label);
    if let Some(c) = class {
        b.add_css_class(c);
    }
    b
}

pub fn back_button(label: &str) -> gtk::Button {
    let b = gtk::Button::with_label(label);
    b.add_css_class("flat");
    b.set_halign(gtk::Align::Start);
    b
}

pub fn list() -> gtk::ListBox {
    let list = gtk::ListBox::new();
    list.add_css_class("boxed-list");
    list.set_selection_mode(gtk::SelectionMode::None);
    list
}

pub fn row(title: &str, subtitle: &str) -> adw::ActionRow {
    let row = adw::ActionRow::new();
    row.set_title(&glib::markup_escape_text(title));
    row.set_subtitle(&glib::markup_escape_text(subtitle));
    row
}

pub fn button_row() -> gtk::Box {
    let b = gtk::Box::new(gtk::Orientation::Horizontal, 8);
    b.set_halign(gtk::Align::End);
    b
}

pub fn clear_list(list: &gtk::ListBox) {
    while let Some(child) = list.first_child() {
        list.remove(&child);
    }
}

pub fn placeholder(text: &str) -> gtk::Label {
    let l = gtk::Label::new(Some(text));
    l.add_css_class("dim-label");
    l.set_margin_top(12);
    l.set_margin_bottom(12);
    l.set_wrap(true);
    l
}

/// Yes/no question; `on_yes` runs only when confirmed.
pub fn confirm<F: Fn() + 'static>(parent: &adw::ApplicationWindow, question: &str, on_yes: F) {
    let dialog = gtk::Dialog::builder()
        .title("Confirmar")
        .transient_for(parent)
        .modal(true)
        .build();
    let content = gtk::Label::new(Some(question));
    content.set_wrap(true);
    content.set_margin_top(12);
    content.set_margin_bottom(12);
    content.set_margin_start(12);
    content.set_margin_end(12);
    dialog.content_area().append(&content);
    let _ = dialog.add_button("Cancelar", gtk::ResponseType::Cancel);
    let ok = dialog.add_button("Sim", gtk::ResponseType::Ok);
    ok.add_css_class("destructive-action");
    dialog.connect_response(move |dlg, resp| {
        if resp == gtk::ResponseType::Ok {
            on_yes();
        }
        dlg.close();
    });
    dialog.present();
}

/// Modal notice the user has to dismiss.
pub fn notify(parent: &adw::ApplicationWindow, text: &str) {
    let dialog = gtk::Dialog::builder()
        .title("ServiFlex")
        .transient_for(parent)
        .modal(true)
        .build();
    let label = gtk::Label::new(Some(text));
    label.set_wrap(true);
    label.set_margin_top(12);
    label.set_margin_bottom(12);
    label.set_margin_start(12);
    label.set_margin_end(12);
    dialog.content_area().append(&label);
    let _ = dialog.add_button("OK", gtk::ResponseType::Ok);
    dialog.connect_response(|dlg, _| dlg.close());
    dialog.present();
}
