use adw::prelude::*;
use gtk4 as gtk;
use std::rc::Rc;

use crate::api::error::Operation;
use crate::forms::LoginForm;
use crate::routes::{home_for, Route};
use crate::ui::main_window::Navigator;
use crate::ui::widgets::{self, Banner};

pub fn page(nav: &Navigator) -> gtk::Widget {
    let root = widgets::page("Login");
    root.set_valign(gtk::Align::Center);

    let email_entry = widgets::entry("Digite seu e-mail");
    email_entry.set_input_purpose(gtk::InputPurpose::Email);
    let pass_entry = widgets::password("Digite sua senha");

    let form = gtk::Box::new(gtk::Orientation::Vertical, 8);
    form.append(&widgets::field("Email", &email_entry));
    form.append(&widgets::field("Senha", &pass_entry));
    root.append(&form);

    let banner = Banner::new();
    root.append(banner.widget());

    let login_btn = widgets::button("Entrar", Some("suggested-action"));
    login_btn.set_halign(gtk::Align::End);
    root.append(&login_btn);

    let register_link = widgets::back_button("Não tem conta? Cadastre-se aqui");
    {
        let nav = nav.clone();
        register_link.connect_clicked(move |_| nav.navigate(Route::Register));
    }
    root.append(&register_link);

    let on_login = {
        let nav = nav.clone();
        let email_entry = email_entry.clone();
        let pass_entry = pass_entry.clone();
        let login_btn = login_btn.clone();
        move || {
            banner.clear();
            let form = LoginForm {
                email: email_entry.text().trim().to_string(),
                senha: pass_entry.text().to_string(),
            };
            if let Err(e) = form.validate() {
                banner.error(&e.to_string());
                return;
            }

            login_btn.set_sensitive(false);
            login_btn.set_label("Entrando...");

            let api = nav.api();
            let nav = nav.clone();
            let banner = banner.clone();
            let login_btn = login_btn.clone();
            crate::utils::run_async_to_main(
                async move { api.login(&form.email, &form.senha).await },
                move |res| {
                    login_btn.set_sensitive(true);
                    login_btn.set_label("Entrar");
                    let resp = match res {
                        Ok(resp) => resp,
                        Err(err) => {
                            log::warn!("login failed: {err}");
                            banner.error(&err.user_message(Operation::Login));
                            return;
                        }
                    };
                    log::info!("logged in as {} ({})", resp.usuario.id, resp.usuario.tipo.as_str());
                    if !resp.mensagem.is_empty() {
                        banner.success(&resp.mensagem);
                    }
                    let stored = nav.session_mut().store_login(&resp.usuario);
                    if let Err(e) = stored {
                        log::error!("could not store session: {e}");
                        banner.error("Não foi possível salvar a sessão.");
                        return;
                    }
                    match home_for(resp.usuario.tipo) {
                        Some(route) => nav.navigate(route),
                        None => banner.error("Tipo de usuário não suportado por este aplicativo."),
                    }
                },
            );
        }
    };

    let on_login: Rc<dyn Fn()> = Rc::new(on_login);
    {
        let on_login = on_login.clone();
        login_btn.connect_clicked(move |_| (on_login)());
    }
    {
        let on_login = on_login.clone();
        email_entry.connect_activate(move |_| (on_login)());
    }
    {
        let on_login = on_login.clone();
        pass_entry.connect_activate(move |_| (on_login)());
    }

    root.upcast()
}
