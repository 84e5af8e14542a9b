use adw::prelude::*;
use gtk4 as gtk;

use crate::api::error::{ApiError, Operation};
use crate::api::models::UserKind;
use crate::forms::ProfileForm;
use crate::ui::main_window::Navigator;
use crate::ui::widgets::{self, Banner};

enum SaveError {
    Profile(ApiError),
    Photo(ApiError),
}

/// Profile editor shared by clients and professionals; only professionals
/// get the photo field.
pub fn page(nav: &Navigator, kind: UserKind) -> gtk::Widget {
    let root = widgets::page("Editar Perfil");
    let back = widgets::back_button("← Voltar");
    {
        let nav = nav.clone();
        back.connect_clicked(move |_| nav.go_home());
    }
    root.prepend(&back);

    let banner = Banner::new();
    let user = match nav.session().user() {
        Ok(Some(user)) => user,
        Ok(None) => {
            banner.error("Sessão sem dados do usuário. Entre novamente.");
            root.append(banner.widget());
            return root.upcast();
        }
        Err(e) => {
            log::error!("stored user unreadable: {e}");
            banner.error("Não foi possível ler os dados da sessão.");
            root.append(banner.widget());
            return root.upcast();
        }
    };
    let initial = ProfileForm::from_user(&user);

    let nome = widgets::entry_with("Nome", &initial.nome);
    let email = widgets::entry_with("Email", &initial.email);
    email.set_input_purpose(gtk::InputPurpose::Email);
    let senha = widgets::password("Deixe em branco para manter a atual");
    let imagem = widgets::entry_with("https://...", &initial.imagem_url);

    root.append(&widgets::field("Nome", &nome));
    root.append(&widgets::field("Email", &email));
    root.append(&widgets::field("Nova senha", &senha));
    if kind == UserKind::Professional {
        root.append(&widgets::field("URL da foto", &imagem));
    }
    root.append(banner.widget());

    let save = widgets::button("Salvar", Some("suggested-action"));
    save.set_halign(gtk::Align::End);
    root.append(&save);

    let nav = nav.clone();
    save.connect_clicked(move |btn| {
        banner.clear();
        // re-read so a second save starts from the stored copy
        let user = match nav.session().user() {
            Ok(Some(u)) => u,
            _ => user.clone(),
        };
        let form = ProfileForm {
            nome: nome.text().to_string(),
            email: email.text().to_string(),
            senha: senha.text().to_string(),
            imagem_url: imagem.text().to_string(),
        };
        let body = match form.to_body(&user) {
            Ok(b) => b,
            Err(e) => {
                banner.error(&e.to_string());
                return;
            }
        };
        let photo = if kind == UserKind::Professional {
            form.changed_image(&user).map(str::to_string)
        } else {
            None
        };

        btn.set_sensitive(false);
        let api = nav.api();
        let id = user.id.clone();
        let tipo = user.tipo;
        let photo_sent = photo.clone();
        let nav = nav.clone();
        let banner = banner.clone();
        let btn = btn.clone();
        let senha = senha.clone();
        crate::utils::run_async_to_main(
            async move {
                api.update_user(&id, tipo, &body).await.map_err(SaveError::Profile)?;
                if let Some(url) = photo_sent {
                    api.upload_professional_photo(&id, &url).await.map_err(SaveError::Photo)?;
                }
                Ok::<_, SaveError>(())
            },
            move |res| {
                btn.set_sensitive(true);
                let remember = |photo: Option<&str>| {
                    let stored = nav.session_mut().update_profile(form.nome.trim(), form.email.trim(), photo);
                    if let Err(e) = stored {
                        log::error!("profile saved but session not updated: {e}");
                    }
                };
                match res {
                    Ok(()) => {
                        remember(photo.as_deref());
                        senha.set_text("");
                        banner.success("Dados atualizados com sucesso!");
                    }
                    Err(SaveError::Profile(err)) => {
                        log::error!("profile update failed: {err}");
                        banner.error(&err.user_message(Operation::Plain("Erro ao atualizar dados.")));
                    }
                    // name and email went through before the photo failed
                    Err(SaveError::Photo(err)) => {
                        log::error!("photo upload failed: {err}");
                        remember(None);
                        banner.error(&err.user_message(Operation::Plain("Erro ao atualizar imagem.")));
                    }
                }
            },
        );
    });

    root.upcast()
}
