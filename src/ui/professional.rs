use adw::prelude::*;
use chrono::{Local, NaiveDate};
use gtk4 as gtk;
use std::cell::RefCell;
use std::rc::Rc;

use crate::api::error::{ApiError, Operation};
use crate::api::models::{Appointment, InvitationAnswer, Procedure};
use crate::forms::{ProcedureForm, ScheduleForm};
use crate::routes::Route;
use crate::slots::{self, WEEKDAY_LABELS};
use crate::ui::main_window::Navigator;
use crate::ui::widgets::{self, Banner};
use crate::views;

fn calendar_day(calendar: &gtk::Calendar) -> Option<NaiveDate> {
    let dt = calendar.date();
    NaiveDate::from_ymd_opt(dt.year(), dt.month() as u32, dt.day_of_month() as u32)
}

/// Day view of the professional's bookings.
pub fn agenda_page(nav: &Navigator) -> gtk::Widget {
    let root = widgets::page("Minha Agenda");
    let user = nav.session().user().ok().flatten();
    let user_id = nav.user_id();

    let linked = gtk::Label::new(None);
    linked.set_halign(gtk::Align::Start);
    linked.add_css_class("dim-label");
    root.append(&linked);

    let actions = widgets::button_row();
    actions.set_halign(gtk::Align::Start);
    for (label, route) in [
        ("Meus Horários", Route::ProfessionalHours),
        ("Meus Procedimentos", Route::ProfessionalProcedures { professional_id: user_id.clone() }),
        ("Convites", Route::Invitations),
        ("Editar Perfil", Route::ProfessionalProfile),
    ] {
        let b = widgets::button(label, None);
        let nav = nav.clone();
        b.connect_clicked(move |_| nav.navigate(route.clone()));
        actions.append(&b);
    }
    root.append(&actions);

    match user.filter(|u| u.has_establishment()).and_then(|u| u.estabelecimento_id) {
        Some(est_id) => {
            linked.set_label("Estabelecimento: carregando...");
            let api = nav.api();
            let linked = linked.clone();
            crate::utils::run_async_to_main(async move { api.establishment(&est_id).await }, move |res| match res {
                Ok(est) => linked.set_label(&format!("Estabelecimento: {}", est.nome)),
                Err(e) => {
                    log::warn!("could not load linked establishment: {e}");
                    linked.set_label(&format!("Estabelecimento: {}", views::UNKNOWN_NAME));
                }
            });
        }
        None => {
            linked.set_label("Você ainda não está vinculado a nenhum estabelecimento. Verifique seus convites.");
        }
    }

    let calendar = gtk::Calendar::new();
    calendar.set_halign(gtk::Align::Center);
    root.append(&calendar);
    let day_label = gtk::Label::new(None);
    day_label.add_css_class("heading");
    day_label.set_halign(gtk::Align::Start);
    root.append(&day_label);
    let banner = Banner::new();
    root.append(banner.widget());
    let list = widgets::list();
    list.append(&widgets::placeholder("Carregando..."));
    root.append(&list);

    let all: Rc<RefCell<Vec<Appointment>>> = Rc::new(RefCell::new(Vec::new()));
    let render: Rc<dyn Fn()> = {
        let calendar = calendar.clone();
        let list = list.clone();
        let all = all.clone();
        Rc::new(move || {
            widgets::clear_list(&list);
            let Some(day) = calendar_day(&calendar) else { return };
            day_label.set_label(&views::long_date(day));
            let shown = views::appointments_on(&all.borrow(), day, &Local);
            if shown.is_empty() {
                list.append(&widgets::placeholder("Nenhum agendamento para este dia."));
                return;
            }
            for a in shown {
                let time = a
                    .starts_at()
                    .map(|at| views::format_time(&at, &Local))
                    .unwrap_or_else(|| a.data_hora.clone());
                let client = a.cliente_nome.as_deref().filter(|n| !n.is_empty()).unwrap_or(a.cliente_id.as_str());
                list.append(&widgets::row(&format!("{time} · {}", a.procedimento), &format!("Cliente: {client}")));
            }
        })
    };
    {
        let render = render.clone();
        calendar.connect_day_selected(move |_| render());
    }

    let api = nav.api();
    crate::utils::run_async_to_main(
        async move { api.professional_appointments(&user_id).await },
        move |res| match res {
            Ok(items) => {
                log::debug!("agenda has {} appointments", items.len());
                *all.borrow_mut() = items;
                render();
            }
            Err(err) => {
                log::error!("failed to load agenda: {err}");
                widgets::clear_list(&list);
                banner.error(&err.user_message(Operation::Plain("Erro ao carregar agendamentos.")));
            }
        },
    );

    root.upcast()
}

pub fn hours_page(nav: &Navigator) -> gtk::Widget {
    let root = widgets::page("Meus Horários");
    let back = widgets::back_button("← Voltar para agenda");
    {
        let nav = nav.clone();
        back.connect_clicked(move |_| nav.navigate(Route::ProfessionalAgenda));
    }
    root.prepend(&back);

    let list = widgets::list();
    root.append(&list);

    let form_title = gtk::Label::new(Some("Adicionar horários"));
    form_title.add_css_class("title-4");
    form_title.set_halign(gtk::Align::Start);
    root.append(&form_title);

    let form = Rc::new(RefCell::new(ScheduleForm::default()));
    let days = gtk::FlowBox::new();
    days.set_selection_mode(gtk::SelectionMode::None);
    days.set_max_children_per_line(6);
    let mut toggles = Vec::with_capacity(WEEKDAY_LABELS.len());
    for label in WEEKDAY_LABELS {
        let toggle = gtk::ToggleButton::with_label(label);
        {
            let form = form.clone();
            toggle.connect_toggled(move |_| form.borrow_mut().toggle_day(label));
        }
        days.append(&toggle);
        toggles.push(toggle);
    }
    root.append(&widgets::field("Dias da semana", &days));

    let times = gtk::Box::new(gtk::Orientation::Horizontal, 8);
    let start = widgets::entry("09:00");
    let end = widgets::entry("18:00");
    times.append(&widgets::field("Início", &start));
    times.append(&widgets::field("Fim", &end));
    root.append(&times);

    let banner = Banner::new();
    root.append(banner.widget());
    let save = widgets::button("Salvar horários", Some("suggested-action"));
    save.set_halign(gtk::Align::End);
    root.append(&save);

    let load: Rc<dyn Fn()> = {
        let nav = nav.clone();
        let list = list.clone();
        let banner = banner.clone();
        Rc::new(move || {
            widgets::clear_list(&list);
            list.append(&widgets::placeholder("Carregando..."));
            let api = nav.api();
            let id = nav.user_id();
            let list = list.clone();
            let banner = banner.clone();
            crate::utils::run_async_to_main(async move { api.availability(&id).await }, move |res| {
                widgets::clear_list(&list);
                match res {
                    Ok(mut rules) => {
                        if rules.is_empty() {
                            list.append(&widgets::placeholder("Nenhum horário cadastrado."));
                            return;
                        }
                        slots::sort_by_weekday(&mut rules);
                        for r in rules {
                            let mut hours = format!("{} - {}", r.hora_inicio, r.hora_fim);
                            if !r.disponivel {
                                hours.push_str(" (indisponível)");
                            }
                            list.append(&widgets::row(&r.dia_semana, &hours));
                        }
                    }
                    Err(err) => {
                        log::error!("failed to load weekly hours: {err}");
                        banner.error(&err.user_message(Operation::Plain("Erro ao carregar horários.")));
                    }
                }
            });
        })
    };
    load();

    let nav = nav.clone();
    save.connect_clicked(move |btn| {
        banner.clear();
        let request = {
            let mut form = form.borrow_mut();
            form.hora_inicio = start.text().to_string();
            form.hora_fim = end.text().to_string();
            form.to_request(&nav.user_id())
        };
        let request = match request {
            Ok(r) => r,
            Err(e) => {
                banner.error(&e.to_string());
                return;
            }
        };
        btn.set_sensitive(false);
        let api = nav.api();
        let banner = banner.clone();
        let btn = btn.clone();
        let load = load.clone();
        let form = form.clone();
        let toggles = toggles.clone();
        let start = start.clone();
        let end = end.clone();
        crate::utils::run_async_to_main(async move { api.create_availability(&request).await }, move |res| {
            btn.set_sensitive(true);
            match res {
                Ok(result) => {
                    banner.success(&result.summary());
                    // untoggling fires toggle_day, so the form is reset after
                    for t in &toggles {
                        t.set_active(false);
                    }
                    form.borrow_mut().reset();
                    start.set_text("");
                    end.set_text("");
                    load();
                }
                Err(err) => {
                    log::error!("saving weekly hours failed: {err}");
                    banner.error(&err.user_message(Operation::Detailed("Erro ao salvar horários.")));
                }
            }
        });
    });

    root.upcast()
}

struct ProcedureEntries {
    nome: gtk::Entry,
    descricao: gtk::Entry,
    preco: gtk::Entry,
    duracao: gtk::Entry,
    imagem: gtk::Entry,
}

impl ProcedureEntries {
    fn read(&self) -> ProcedureForm {
        ProcedureForm {
            nome: self.nome.text().to_string(),
            descricao: self.descricao.text().to_string(),
            preco: self.preco.text().to_string(),
            duracao: self.duracao.text().to_string(),
            imagem_url: self.imagem.text().to_string(),
        }
    }

    fn fill(&self, p: &Procedure) {
        self.nome.set_text(&p.nome);
        self.descricao.set_text(&p.descricao);
        self.preco.set_text(&format!("{:.2}", p.preco));
        self.duracao.set_text(&p.duracao_min.to_string());
        self.imagem.set_text(p.imagem_url.as_deref().unwrap_or_default());
    }

    fn clear(&self) {
        for e in [&self.nome, &self.descricao, &self.preco, &self.duracao, &self.imagem] {
            e.set_text("");
        }
    }
}

/// Add, edit and remove the professional's procedures.
pub fn procedures_page(nav: &Navigator, professional_id: String) -> gtk::Widget {
    let root = widgets::page("Meus Procedimentos");
    let back = widgets::back_button("← Voltar para agenda");
    {
        let nav = nav.clone();
        back.connect_clicked(move |_| nav.navigate(Route::ProfessionalAgenda));
    }
    root.prepend(&back);

    let banner = Banner::new();
    root.append(banner.widget());
    let list = widgets::list();
    root.append(&list);

    let form_title = gtk::Label::new(Some("Novo procedimento"));
    form_title.add_css_class("title-4");
    form_title.set_halign(gtk::Align::Start);
    root.append(&form_title);

    let entries = Rc::new(ProcedureEntries {
        nome: widgets::entry("Nome"),
        descricao: widgets::entry("Descrição"),
        preco: widgets::entry("Preço (ex.: 40,00)"),
        duracao: widgets::entry("Duração em minutos"),
        imagem: widgets::entry("URL da imagem (opcional)"),
    });
    root.append(&widgets::field("Nome", &entries.nome));
    root.append(&widgets::field("Descrição", &entries.descricao));
    let numbers = gtk::Box::new(gtk::Orientation::Horizontal, 8);
    numbers.append(&widgets::field("Preço", &entries.preco));
    numbers.append(&widgets::field("Duração", &entries.duracao));
    root.append(&numbers);
    root.append(&widgets::field("Imagem", &entries.imagem));

    let actions = widgets::button_row();
    let cancel_edit = widgets::button("Cancelar edição", None);
    cancel_edit.set_visible(false);
    let save = widgets::button("Adicionar", Some("suggested-action"));
    actions.append(&cancel_edit);
    actions.append(&save);
    root.append(&actions);

    // id of the procedure being edited; None while adding
    let editing: Rc<RefCell<Option<String>>> = Rc::new(RefCell::new(None));
    let set_editing: Rc<dyn Fn(Option<&Procedure>)> = {
        let editing = editing.clone();
        let entries = entries.clone();
        let form_title = form_title.clone();
        let save = save.clone();
        let cancel_edit = cancel_edit.clone();
        Rc::new(move |p| {
            match p {
                Some(p) => {
                    entries.fill(p);
                    *editing.borrow_mut() = Some(p.id.clone());
                    form_title.set_label("Editar procedimento");
                    save.set_label("Salvar alterações");
                }
                None => {
                    entries.clear();
                    *editing.borrow_mut() = None;
                    form_title.set_label("Novo procedimento");
                    save.set_label("Adicionar");
                }
            }
            cancel_edit.set_visible(p.is_some());
        })
    };
    {
        let set_editing = set_editing.clone();
        cancel_edit.connect_clicked(move |_| set_editing(None));
    }

    let load: Rc<dyn Fn()> = {
        let nav = nav.clone();
        let list = list.clone();
        let banner = banner.clone();
        let set_editing = set_editing.clone();
        let professional_id = professional_id.clone();
        Rc::new(move || {
            widgets::clear_list(&list);
            list.append(&widgets::placeholder("Carregando..."));
            let api = nav.api();
            let id = professional_id.clone();
            let nav = nav.clone();
            let list = list.clone();
            let banner = banner.clone();
            let set_editing = set_editing.clone();
            crate::utils::run_async_to_main(async move { api.procedures(&id).await }, move |res| {
                widgets::clear_list(&list);
                let procedures = match res {
                    Ok(p) => p,
                    Err(err) => {
                        log::error!("failed to load own procedures: {err}");
                        banner.error(&err.user_message(Operation::Plain("Erro ao carregar procedimentos.")));
                        return;
                    }
                };
                if procedures.is_empty() {
                    list.append(&widgets::placeholder("Nenhum procedimento cadastrado."));
                }
                for p in procedures {
                    list.append(&procedure_row(&nav, &list, &banner, &set_editing, p));
                }
            });
        })
    };
    load();

    let nav = nav.clone();
    save.connect_clicked(move |btn| {
        banner.clear();
        let form = entries.read();
        let editing_id = editing.borrow().clone();
        let payload = match form.to_payload(editing_id.as_deref(), &professional_id) {
            Ok(p) => p,
            Err(e) => {
                banner.error(&e.to_string());
                return;
            }
        };
        let image = form.image().map(str::to_string);

        btn.set_sensitive(false);
        let api = nav.api();
        let banner = banner.clone();
        let btn = btn.clone();
        let load = load.clone();
        let set_editing = set_editing.clone();
        let creating = editing_id.is_none();
        crate::utils::run_async_to_main(
            async move {
                let id = match editing_id {
                    Some(id) => {
                        api.update_procedure(&id, &payload).await?;
                        id
                    }
                    None => api.create_procedure(&payload).await?,
                };
                if let Some(url) = image {
                    api.upload_procedure_photo(&id, &url).await?;
                }
                Ok::<_, ApiError>(())
            },
            move |res| {
                btn.set_sensitive(true);
                match res {
                    Ok(()) => {
                        banner.success(if creating {
                            "Procedimento adicionado com sucesso!"
                        } else {
                            "Procedimento atualizado com sucesso!"
                        });
                        set_editing(None);
                        load();
                    }
                    Err(err) => {
                        log::error!("saving procedure failed: {err}");
                        banner.error(&err.user_message(Operation::Plain("Erro ao salvar procedimento.")));
                    }
                }
            },
        );
    });

    root.upcast()
}

fn procedure_row(
    nav: &Navigator,
    list: &gtk::ListBox,
    banner: &Banner,
    set_editing: &Rc<dyn Fn(Option<&Procedure>)>,
    procedure: Procedure,
) -> adw::ActionRow {
    let row = widgets::row(
        &procedure.nome,
        &format!("{} · {} min · {}", procedure.price_label(), procedure.duracao_min, procedure.descricao),
    );
    let edit = widgets::button("Editar", None);
    let delete = widgets::button("Excluir", Some("destructive-action"));
    for b in [&edit, &delete] {
        b.set_valign(gtk::Align::Center);
        row.add_suffix(b);
    }
    {
        let set_editing = set_editing.clone();
        let procedure = procedure.clone();
        edit.connect_clicked(move |_| set_editing(Some(&procedure)));
    }

    let nav = nav.clone();
    let list = list.clone();
    let banner = banner.clone();
    let target = row.clone();
    delete.connect_clicked(move |_| {
        let api = nav.api();
        let list = list.clone();
        let banner = banner.clone();
        let target = target.clone();
        let id = procedure.id.clone();
        let question = format!("Excluir o procedimento \"{}\"?", procedure.nome);
        widgets::confirm(nav.window(), &question, move || {
            let api = api.clone();
            let list = list.clone();
            let banner = banner.clone();
            let target = target.clone();
            let id = id.clone();
            crate::utils::run_async_to_main(async move { api.delete_procedure(&id).await }, move |res| match res {
                Ok(()) => {
                    list.remove(&target);
                    banner.success("Procedimento excluído.");
                }
                Err(err) => {
                    log::error!("deleting procedure failed: {err}");
                    banner.error(&err.user_message(Operation::Plain("Erro ao excluir procedimento.")));
                }
            });
        });
    });

    row
}

pub fn invitations_page(nav: &Navigator) -> gtk::Widget {
    let linked = nav.session().user().ok().flatten().is_some_and(|u| u.has_establishment());
    let root = widgets::page("Convites Pendentes");
    if linked {
        log::info!("professional already linked, skipping invitations");
        root.append(&widgets::placeholder("Você já está vinculado a um estabelecimento."));
        nav.redirect(Route::ProfessionalAgenda);
        return root.upcast();
    }
    let back = widgets::back_button("← Voltar para agenda");
    {
        let nav = nav.clone();
        back.connect_clicked(move |_| nav.navigate(Route::ProfessionalAgenda));
    }
    root.prepend(&back);

    let banner = Banner::new();
    root.append(banner.widget());
    let list = widgets::list();
    list.append(&widgets::placeholder("Carregando..."));
    root.append(&list);

    let api = nav.api();
    let id = nav.user_id();
    let nav = nav.clone();
    crate::utils::run_async_to_main(async move { api.pending_invitations(&id).await }, move |res| {
        widgets::clear_list(&list);
        let invitations = match res {
            Ok(i) => i,
            Err(err) => {
                log::error!("failed to load invitations: {err}");
                banner.error(&err.user_message(Operation::Plain("Erro ao carregar convites.")));
                return;
            }
        };
        if invitations.is_empty() {
            list.append(&widgets::placeholder("Nenhum convite pendente."));
            return;
        }
        for invitation in invitations {
            let row = widgets::row(invitation.sender(), invitation.message());
            let accept = widgets::button("Aceitar", Some("suggested-action"));
            let decline = widgets::button("Recusar", None);
            for b in [&accept, &decline] {
                b.set_valign(gtk::Align::Center);
                row.add_suffix(b);
            }
            for (button, answer) in [(&accept, InvitationAnswer::Accept), (&decline, InvitationAnswer::Decline)] {
                let nav = nav.clone();
                let list = list.clone();
                let banner = banner.clone();
                let row = row.clone();
                let invitation = invitation.clone();
                button.connect_clicked(move |_| {
                    let api = nav.api();
                    let nav = nav.clone();
                    let list = list.clone();
                    let banner = banner.clone();
                    let row = row.clone();
                    let invitation = invitation.clone();
                    let id = invitation.id.clone();
                    row.set_sensitive(false);
                    crate::utils::run_async_to_main(
                        async move { api.answer_invitation(&id, answer).await },
                        move |res| match res {
                            Ok(()) if answer == InvitationAnswer::Accept => {
                                if let Some(est) = invitation.estabelecimento_id.as_deref() {
                                    let stored = nav.session_mut().set_establishment(est);
                                    if let Err(e) = stored {
                                        log::error!("could not record establishment link: {e}");
                                    }
                                }
                                banner.success("Convite aceito! Redirecionando para sua agenda...");
                                list.remove(&row);
                                glib::timeout_add_seconds_local_once(1, move || {
                                    nav.navigate(Route::ProfessionalAgenda)
                                });
                            }
                            Ok(()) => {
                                banner.info("Convite recusado.");
                                list.remove(&row);
                                if list.first_child().is_none() {
                                    list.append(&widgets::placeholder("Nenhum convite pendente."));
                                }
                            }
                            Err(err) => {
                                row.set_sensitive(true);
                                log::error!("answering invitation failed: {err}");
                                banner.error(&err.user_message(Operation::Plain("Erro ao responder convite.")));
                            }
                        },
                    );
                });
            }
            list.append(&row);
        }
    });

    root.upcast()
}
