use adw::prelude::*;
use gtk4 as gtk;
use std::cell::RefCell;
use std::rc::Rc;

use crate::api::error::Operation;
use crate::api::models::{Establishment, Professional};
use crate::routes::Route;
use crate::ui::main_window::Navigator;
use crate::ui::widgets::{self, Banner};
use crate::views;

const ALL_CITIES: &str = "Todas as cidades";

pub fn list_page(nav: &Navigator) -> gtk::Widget {
    let root = widgets::page("Lista de Estabelecimentos");

    let filters = gtk::Box::new(gtk::Orientation::Horizontal, 8);
    let search = gtk::SearchEntry::new();
    search.set_placeholder_text(Some("Pesquisar por nome..."));
    search.set_hexpand(true);
    let city_drop = gtk::DropDown::from_strings(&[ALL_CITIES]);
    filters.append(&search);
    filters.append(&city_drop);
    root.append(&filters);

    let banner = Banner::new();
    root.append(banner.widget());
    let list = widgets::list();
    list.append(&widgets::placeholder("Carregando..."));
    root.append(&list);

    let actions = widgets::button_row();
    let mine = widgets::button("Meus Agendamentos", Some("suggested-action"));
    let profile = widgets::button("Editar Perfil", None);
    actions.append(&mine);
    actions.append(&profile);
    root.append(&actions);
    {
        let nav = nav.clone();
        mine.connect_clicked(move |_| nav.navigate(Route::MyAppointments));
    }
    {
        let nav = nav.clone();
        profile.connect_clicked(move |_| nav.navigate(Route::ClientProfile));
    }

    let all: Rc<RefCell<Vec<Establishment>>> = Rc::new(RefCell::new(Vec::new()));
    let cities: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));

    let render: Rc<dyn Fn()> = {
        let nav = nav.clone();
        let list = list.clone();
        let search = search.clone();
        let city_drop = city_drop.clone();
        let all = all.clone();
        let cities = cities.clone();
        Rc::new(move || {
            widgets::clear_list(&list);
            let selected = city_drop.selected() as usize;
            let city = match selected {
                0 => String::new(),
                n => cities.borrow().get(n - 1).cloned().unwrap_or_default(),
            };
            let all = all.borrow();
            let shown = views::filter_establishments(&all, &search.text(), &city);
            if shown.is_empty() {
                list.append(&widgets::placeholder("Nenhum estabelecimento encontrado."));
                return;
            }
            for est in shown {
                let subtitle = match est.city() {
                    Some(c) if !est.descricao.is_empty() => format!("{c} · {}", est.descricao),
                    Some(c) => c.to_string(),
                    None => est.descricao.clone(),
                };
                let row = widgets::row(&est.nome, &subtitle);
                row.set_activatable(true);
                row.add_suffix(&gtk::Image::from_icon_name("go-next-symbolic"));
                let nav = nav.clone();
                let id = est.id.clone();
                row.connect_activated(move |_| {
                    nav.navigate(Route::EstablishmentProfessionals { establishment_id: id.clone() })
                });
                list.append(&row);
            }
        })
    };

    {
        let render = render.clone();
        search.connect_search_changed(move |_| render());
    }
    {
        let render = render.clone();
        city_drop.connect_selected_notify(move |_| render());
    }

    let api = nav.api();
    crate::utils::run_async_to_main(async move { api.establishments().await }, move |res| match res {
        Ok(items) => {
            let found = views::cities(&items);
            let mut labels = vec![ALL_CITIES];
            labels.extend(found.iter().map(String::as_str));
            city_drop.set_model(Some(&gtk::StringList::new(&labels)));
            *cities.borrow_mut() = found;
            *all.borrow_mut() = items;
            render();
        }
        Err(err) => {
            log::error!("failed to load establishments: {err}");
            widgets::clear_list(&list);
            banner.error(&err.user_message(Operation::Plain("Erro ao carregar os estabelecimentos.")));
        }
    });

    root.upcast()
}

pub fn professionals_page(nav: &Navigator, establishment_id: String) -> gtk::Widget {
    let root = widgets::page("Profissionais do Estabelecimento");
    let back = widgets::back_button("← Voltar para estabelecimentos");
    {
        let nav = nav.clone();
        back.connect_clicked(move |_| nav.navigate(Route::Establishments));
    }
    root.prepend(&back);

    let search = gtk::SearchEntry::new();
    search.set_placeholder_text(Some("Buscar por profissional ou procedimento..."));
    root.append(&search);
    let banner = Banner::new();
    root.append(banner.widget());
    let list = widgets::list();
    list.append(&widgets::placeholder("Carregando..."));
    root.append(&list);

    let loaded: Rc<RefCell<Vec<(Professional, Vec<String>)>>> = Rc::new(RefCell::new(Vec::new()));
    let render: Rc<dyn Fn()> = {
        let nav = nav.clone();
        let list = list.clone();
        let search = search.clone();
        let loaded = loaded.clone();
        let establishment_id = establishment_id.clone();
        Rc::new(move || {
            widgets::clear_list(&list);
            let loaded = loaded.borrow();
            let shown = views::filter_professionals(&loaded, &search.text());
            if shown.is_empty() {
                list.append(&widgets::placeholder("Nenhum profissional encontrado."));
                return;
            }
            for (pro, procedures) in shown {
                let subtitle = if procedures.is_empty() {
                    "Sem procedimentos cadastrados".to_string()
                } else {
                    procedures.join(", ")
                };
                let row = widgets::row(&pro.nome, &subtitle);
                row.set_tooltip_text(pro.photo());
                row.set_activatable(true);
                row.add_suffix(&gtk::Image::from_icon_name("go-next-symbolic"));
                let nav = nav.clone();
                let route = Route::Procedures {
                    professional_id: pro.id.clone(),
                    establishment_id: Some(establishment_id.clone()),
                };
                row.connect_activated(move |_| nav.navigate(route.clone()));
                list.append(&row);
            }
        })
    };
    {
        let render = render.clone();
        search.connect_search_changed(move |_| render());
    }

    let api = nav.api();
    crate::utils::run_async_to_main(
        async move {
            let members = api.establishment_members(&establishment_id).await?;
            let handles: Vec<_> = members
                .into_iter()
                .map(|member| {
                    let api = api.clone();
                    tokio::spawn(async move {
                        let procedures = api.procedures(&member.uid).await.unwrap_or_default();
                        let pro = match api.professional(&member.uid).await {
                            Ok(p) => {
                                let nome = views::member_name(&member, Some(&p.nome));
                                Professional { id: member.uid.clone(), nome, ..p }
                            }
                            Err(e) => {
                                log::warn!("could not load professional {}: {e}", member.uid);
                                Professional {
                                    id: member.uid.clone(),
                                    nome: views::member_name(&member, None),
                                    ..Default::default()
                                }
                            }
                        };
                        (pro, views::procedure_names_lower(&procedures))
                    })
                })
                .collect();
            let mut out = Vec::with_capacity(handles.len());
            for handle in handles {
                if let Ok(item) = handle.await {
                    out.push(item);
                }
            }
            Ok::<_, crate::api::error::ApiError>(out)
        },
        move |res| match res {
            Ok(items) => {
                *loaded.borrow_mut() = items;
                render();
            }
            Err(err) => {
                log::error!("failed to load professionals: {err}");
                widgets::clear_list(&list);
                banner.error(&err.user_message(Operation::Plain("Erro ao carregar profissionais.")));
            }
        },
    );

    root.upcast()
}
