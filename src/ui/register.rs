use adw::prelude::*;
use gtk4 as gtk;

use crate::api::error::Operation;
use crate::api::models::UserKind;
use crate::forms::RegisterForm;
use crate::routes::Route;
use crate::ui::main_window::Navigator;
use crate::ui::widgets::{self, Banner};

const KINDS: [(&str, UserKind); 2] = [("Cliente", UserKind::Client), ("Profissional", UserKind::Professional)];

pub fn page(nav: &Navigator) -> gtk::Widget {
    let root = widgets::page("Cadastro");
    root.set_valign(gtk::Align::Center);

    let kind = gtk::DropDown::from_strings(&KINDS.map(|(label, _)| label));
    let nome = widgets::entry("Digite seu nome");
    let email = widgets::entry("Digite seu e-mail");
    email.set_input_purpose(gtk::InputPurpose::Email);
    let senha = widgets::password("Digite sua senha");

    root.append(&widgets::field("Tipo de conta", &kind));
    root.append(&widgets::field("Nome", &nome));
    root.append(&widgets::field("Email", &email));
    root.append(&widgets::field("Senha", &senha));

    let banner = Banner::new();
    root.append(banner.widget());

    let submit = widgets::button("Cadastrar", Some("suggested-action"));
    submit.set_halign(gtk::Align::End);
    root.append(&submit);

    let login_link = widgets::back_button("Já tem conta? Entre aqui");
    {
        let nav = nav.clone();
        login_link.connect_clicked(move |_| nav.navigate(Route::Login));
    }
    root.append(&login_link);

    let nav = nav.clone();
    submit.connect_clicked(move |btn| {
        banner.clear();
        let tipo = KINDS
            .get(kind.selected() as usize)
            .map(|(_, k)| *k)
            .unwrap_or(UserKind::Client);
        let request = match (RegisterForm {
            nome: nome.text().to_string(),
            email: email.text().to_string(),
            senha: senha.text().to_string(),
            tipo,
        })
        .into_request()
        {
            Ok(r) => r,
            Err(e) => {
                banner.error(&e.to_string());
                return;
            }
        };

        btn.set_sensitive(false);
        btn.set_label("Cadastrando...");
        let api = nav.api();
        let nav = nav.clone();
        let banner = banner.clone();
        let btn = btn.clone();
        crate::utils::run_async_to_main(
            async move { api.register(&request).await },
            move |res| {
                btn.set_sensitive(true);
                btn.set_label("Cadastrar");
                match res {
                    Ok(mensagem) => {
                        let text = if mensagem.is_empty() { "Cadastro realizado com sucesso!".into() } else { mensagem };
                        banner.success(&text);
                        glib::timeout_add_seconds_local_once(2, move || nav.navigate(Route::Login));
                    }
                    Err(err) => {
                        log::warn!("registration failed: {err}");
                        banner.error(&err.user_message(Operation::Register));
                    }
                }
            },
        );
    });

    root.upcast()
}
