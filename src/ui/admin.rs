use adw::prelude::*;
use chrono::Local;
use gtk4 as gtk;

use crate::api::error::{ApiError, Operation};
use crate::api::models::EstablishmentPayload;
use crate::forms::{self, EstablishmentForm};
use crate::routes::Route;
use crate::ui::main_window::Navigator;
use crate::ui::widgets::{self, Banner};
use crate::views;

pub fn dashboard_page(nav: &Navigator) -> gtk::Widget {
    let root = widgets::page("Painel do Administrador");
    let name = nav.session().user_name().unwrap_or_default();
    let welcome = gtk::Label::new(Some(&format!("Bem-vindo(a), {name}!")));
    welcome.set_halign(gtk::Align::Start);
    root.append(&welcome);

    let list = widgets::list();
    for (title, subtitle, route) in [
        (
            "Gerenciar Estabelecimentos",
            "Edite seus estabelecimentos e a equipe de profissionais",
            Route::ManageEstablishments,
        ),
        ("Criar Estabelecimento", "Cadastre um novo estabelecimento", Route::CreateEstablishment),
    ] {
        let row = widgets::row(title, subtitle);
        row.set_activatable(true);
        row.add_suffix(&gtk::Image::from_icon_name("go-next-symbolic"));
        let nav = nav.clone();
        row.connect_activated(move |_| nav.navigate(route.clone()));
        list.append(&row);
    }
    root.append(&list);
    root.upcast()
}

/// Establishments owned by the logged-in admin.
pub fn manage_page(nav: &Navigator) -> gtk::Widget {
    let root = widgets::page("Meus Estabelecimentos");
    let back = widgets::back_button("← Voltar ao painel");
    {
        let nav = nav.clone();
        back.connect_clicked(move |_| nav.navigate(Route::AdminDashboard));
    }
    root.prepend(&back);

    let create = widgets::button("Novo Estabelecimento", Some("suggested-action"));
    create.set_halign(gtk::Align::End);
    {
        let nav = nav.clone();
        create.connect_clicked(move |_| nav.navigate(Route::CreateEstablishment));
    }
    root.append(&create);

    let banner = Banner::new();
    root.append(banner.widget());
    let list = widgets::list();
    list.append(&widgets::placeholder("Carregando..."));
    root.append(&list);

    let api = nav.api();
    let owner = nav.user_id();
    let nav = nav.clone();
    crate::utils::run_async_to_main(async move { api.establishments().await }, move |res| {
        widgets::clear_list(&list);
        let all = match res {
            Ok(all) => all,
            Err(err) => {
                log::error!("failed to load establishments: {err}");
                banner.error(&err.user_message(Operation::Plain("Erro ao carregar estabelecimentos.")));
                return;
            }
        };
        let mine = views::owned_by(&all, &owner);
        if mine.is_empty() {
            list.append(&widgets::placeholder("Você ainda não cadastrou estabelecimentos."));
            return;
        }
        for est in mine {
            let subtitle = [est.categoria.as_str(), est.city().unwrap_or_default()]
                .into_iter()
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(" · ");
            let row = widgets::row(&est.nome, &subtitle);
            let edit = widgets::button("Editar", None);
            let staff = widgets::button("Profissionais", None);
            for (b, route) in [
                (&edit, Route::EditEstablishment { establishment_id: est.id.clone() }),
                (&staff, Route::EstablishmentStaff { establishment_id: est.id.clone() }),
            ] {
                b.set_valign(gtk::Align::Center);
                let nav = nav.clone();
                b.connect_clicked(move |_| nav.navigate(route.clone()));
                row.add_suffix(b);
            }
            list.append(&row);
        }
    });

    root.upcast()
}

#[derive(Clone)]
struct EstablishmentEntries {
    nome: gtk::Entry,
    descricao: gtk::Entry,
    foto_url: gtk::Entry,
    categoria: gtk::Entry,
    endereco: gtk::Entry,
    cidade: gtk::Entry,
    uf: gtk::Entry,
}

impl EstablishmentEntries {
    fn new() -> Self {
        let uf = widgets::entry("PE");
        uf.set_max_length(2);
        Self {
            nome: widgets::entry("Nome do estabelecimento"),
            descricao: widgets::entry("Descrição"),
            foto_url: widgets::entry("URL da foto"),
            categoria: widgets::entry("Ex.: Barbearia, Salão de beleza"),
            endereco: widgets::entry("Rua, número, bairro"),
            cidade: widgets::entry("Cidade"),
            uf,
        }
    }

    fn read(&self) -> EstablishmentForm {
        EstablishmentForm {
            nome: self.nome.text().to_string(),
            descricao: self.descricao.text().to_string(),
            foto_url: self.foto_url.text().to_string(),
            categoria: self.categoria.text().to_string(),
            endereco: self.endereco.text().to_string(),
            cidade: self.cidade.text().to_string(),
            uf: self.uf.text().to_string(),
        }
    }

    fn fill(&self, form: &EstablishmentForm) {
        self.nome.set_text(&form.nome);
        self.descricao.set_text(&form.descricao);
        self.foto_url.set_text(&form.foto_url);
        self.categoria.set_text(&form.categoria);
        self.endereco.set_text(&form.endereco);
        self.cidade.set_text(&form.cidade);
        self.uf.set_text(&form.uf);
    }
}

/// Create form when `establishment_id` is None, edit form otherwise.
pub fn establishment_form_page(nav: &Navigator, establishment_id: Option<String>) -> gtk::Widget {
    let editing = establishment_id.is_some();
    let root = widgets::page(if editing { "Editar Estabelecimento" } else { "Criar Estabelecimento" });
    let back = widgets::back_button("← Voltar para meus estabelecimentos");
    {
        let nav = nav.clone();
        back.connect_clicked(move |_| nav.navigate(Route::ManageEstablishments));
    }
    root.prepend(&back);

    let entries = EstablishmentEntries::new();
    root.append(&widgets::field("Nome", &entries.nome));
    root.append(&widgets::field("Descrição", &entries.descricao));
    root.append(&widgets::field("Categoria", &entries.categoria));
    root.append(&widgets::field("Foto (URL)", &entries.foto_url));
    root.append(&widgets::field("Endereço", &entries.endereco));
    let place = gtk::Box::new(gtk::Orientation::Horizontal, 8);
    place.append(&widgets::field("Cidade", &entries.cidade));
    place.append(&widgets::field("UF", &entries.uf));
    root.append(&place);

    let banner = Banner::new();
    root.append(banner.widget());
    let save = widgets::button(if editing { "Salvar alterações" } else { "Criar" }, Some("suggested-action"));
    save.set_halign(gtk::Align::End);
    root.append(&save);

    if let Some(id) = establishment_id.clone() {
        save.set_sensitive(false);
        let api = nav.api();
        let entries = entries.clone();
        let banner = banner.clone();
        let save = save.clone();
        crate::utils::run_async_to_main(async move { api.establishment(&id).await }, move |res| match res {
            Ok(est) => {
                entries.fill(&EstablishmentForm::from_payload(&EstablishmentPayload::from(&est)));
                save.set_sensitive(true);
            }
            Err(err) => {
                log::error!("failed to load establishment for editing: {err}");
                banner.error(&err.user_message(Operation::Plain("Erro ao carregar estabelecimento.")));
            }
        });
    }

    let nav = nav.clone();
    save.connect_clicked(move |btn| {
        banner.clear();
        let payload = match entries.read().to_payload(&nav.user_id()) {
            Ok(p) => p,
            Err(e) => {
                banner.error(&e.to_string());
                return;
            }
        };
        btn.set_sensitive(false);
        let api = nav.api();
        let id = establishment_id.clone();
        let nav = nav.clone();
        let banner = banner.clone();
        let btn = btn.clone();
        crate::utils::run_async_to_main(
            async move {
                match id {
                    Some(id) => api.update_establishment(&id, &payload).await,
                    None => api.create_establishment(&payload).await,
                }
            },
            move |res: Result<(), ApiError>| {
                btn.set_sensitive(true);
                match res {
                    Ok(()) => {
                        let text = if editing {
                            "Estabelecimento atualizado com sucesso!"
                        } else {
                            "Estabelecimento criado com sucesso!"
                        };
                        widgets::notify(nav.window(), text);
                        nav.navigate(Route::ManageEstablishments);
                    }
                    Err(err) => {
                        log::error!("saving establishment failed: {err}");
                        banner.error(&err.user_message(Operation::Detailed("Erro ao salvar estabelecimento.")));
                    }
                }
            },
        );
    });

    root.upcast()
}

/// Professionals linked to one establishment.
pub fn staff_page(nav: &Navigator, establishment_id: String) -> gtk::Widget {
    let root = widgets::page("Profissionais do Estabelecimento");
    let back = widgets::back_button("← Voltar para meus estabelecimentos");
    {
        let nav = nav.clone();
        back.connect_clicked(move |_| nav.navigate(Route::ManageEstablishments));
    }
    root.prepend(&back);

    let invite = widgets::button("Adicionar Profissional", Some("suggested-action"));
    invite.set_halign(gtk::Align::End);
    {
        let nav = nav.clone();
        let route = Route::InviteProfessional { establishment_id: establishment_id.clone() };
        invite.connect_clicked(move |_| nav.navigate(route.clone()));
    }
    root.append(&invite);

    let heading = gtk::Label::new(Some("Carregando..."));
    heading.add_css_class("title-4");
    heading.set_halign(gtk::Align::Start);
    root.append(&heading);
    let banner = Banner::new();
    root.append(banner.widget());
    let list = widgets::list();
    list.append(&widgets::placeholder("Carregando..."));
    root.append(&list);

    {
        let api = nav.api();
        let id = establishment_id.clone();
        crate::utils::run_async_to_main(async move { api.establishment(&id).await }, move |res| match res {
            Ok(est) => heading.set_label(&est.nome),
            Err(e) => {
                log::warn!("establishment name unavailable: {e}");
                heading.set_label(views::UNKNOWN_NAME);
            }
        });
    }

    let api = nav.api();
    let id = establishment_id.clone();
    let nav = nav.clone();
    crate::utils::run_async_to_main(
        async move {
            let members = api.establishment_members(&id).await?;
            let handles: Vec<_> = members
                .into_iter()
                .map(|member| {
                    let api = api.clone();
                    tokio::spawn(async move {
                        let looked_up = api.professional(&member.uid).await.ok().map(|p| p.nome);
                        let name = views::member_name(&member, looked_up.as_deref());
                        (member, name)
                    })
                })
                .collect();
            let mut out = Vec::with_capacity(handles.len());
            for handle in handles {
                match handle.await {
                    Ok(item) => out.push(item),
                    Err(e) => log::warn!("member lookup task failed: {e}"),
                }
            }
            Ok::<_, ApiError>(out)
        },
        move |res| {
            widgets::clear_list(&list);
            let members = match res {
                Ok(m) => m,
                Err(err) => {
                    log::error!("failed to load staff: {err}");
                    banner.error(&err.user_message(Operation::Plain("Erro ao carregar profissionais.")));
                    return;
                }
            };
            if members.is_empty() {
                list.append(&widgets::placeholder("Nenhum profissional vinculado."));
                return;
            }
            for (member, name) in members {
                let row = widgets::row(&name, &views::member_subtitle(&member, &Local));
                let remove = widgets::button("Remover", Some("destructive-action"));
                remove.set_valign(gtk::Align::Center);
                row.add_suffix(&remove);

                let nav = nav.clone();
                let list_ref = list.clone();
                let banner = banner.clone();
                let target = row.clone();
                let establishment_id = establishment_id.clone();
                remove.connect_clicked(move |_| {
                    let api = nav.api();
                    let list = list_ref.clone();
                    let banner = banner.clone();
                    let target = target.clone();
                    let establishment_id = establishment_id.clone();
                    let uid = member.uid.clone();
                    let question = format!("Remover {name} deste estabelecimento?");
                    widgets::confirm(nav.window(), &question, move || {
                        let api = api.clone();
                        let list = list.clone();
                        let banner = banner.clone();
                        let target = target.clone();
                        let establishment_id = establishment_id.clone();
                        let uid = uid.clone();
                        crate::utils::run_async_to_main(
                            async move { api.remove_member(&establishment_id, &uid).await },
                            move |res| match res {
                                Ok(()) => {
                                    list.remove(&target);
                                    banner.success("Profissional removido.");
                                }
                                Err(err) => {
                                    log::error!("removing member failed: {err}");
                                    banner.error(&err.user_message(Operation::Plain("Erro ao remover profissional.")));
                                }
                            },
                        );
                    });
                });
                list.append(&row);
            }
        },
    );

    root.upcast()
}

pub fn invite_page(nav: &Navigator, establishment_id: String) -> gtk::Widget {
    let root = widgets::page("Convidar Profissional");
    let back = widgets::back_button("← Voltar para profissionais");
    {
        let nav = nav.clone();
        let route = Route::EstablishmentStaff { establishment_id: establishment_id.clone() };
        back.connect_clicked(move |_| nav.navigate(route.clone()));
    }
    root.prepend(&back);

    let uid = widgets::entry("ID do profissional");
    root.append(&widgets::field("ID do profissional", &uid));
    let banner = Banner::new();
    root.append(banner.widget());
    let send = widgets::button("Enviar convite", Some("suggested-action"));
    send.set_halign(gtk::Align::End);
    root.append(&send);

    let nav = nav.clone();
    send.connect_clicked(move |btn| {
        banner.clear();
        let professional_id = match forms::validate_invite(&uid.text()) {
            Ok(id) => id,
            Err(e) => {
                banner.error(&e.to_string());
                return;
            }
        };
        btn.set_sensitive(false);
        let api = nav.api();
        let est = establishment_id.clone();
        let banner = banner.clone();
        let btn = btn.clone();
        let uid = uid.clone();
        crate::utils::run_async_to_main(
            async move { api.invite_professional(&est, &professional_id).await },
            move |res| {
                btn.set_sensitive(true);
                match res {
                    Ok(()) => {
                        uid.set_text("");
                        banner.success("Convite enviado com sucesso!");
                    }
                    Err(err) => {
                        log::error!("invite failed: {err}");
                        banner.error(&err.user_message(Operation::Detailed("Erro ao enviar convite")));
                    }
                }
            },
        );
    });

    root.upcast()
}
