use adw::prelude::*;
use chrono::{Local, NaiveDate};
use gtk4 as gtk;
use std::cell::RefCell;
use std::rc::Rc;

use crate::api::error::Operation;
use crate::api::models::{Appointment, Procedure};
use crate::routes::Route;
use crate::slots;
use crate::ui::booking::SlotPicker;
use crate::ui::main_window::Navigator;
use crate::ui::widgets::{self, Banner};
use crate::views::{self, AppointmentRow};

pub fn list_page(nav: &Navigator) -> gtk::Widget {
    let root = widgets::page("Meus Agendamentos");
    let back = widgets::back_button("← Voltar para estabelecimentos");
    {
        let nav = nav.clone();
        back.connect_clicked(move |_| nav.navigate(Route::Establishments));
    }
    root.prepend(&back);

    let banner = Banner::new();
    root.append(banner.widget());
    let list = widgets::list();
    list.append(&widgets::placeholder("Carregando..."));
    root.append(&list);

    let api = nav.api();
    let client_id = nav.user_id();
    let nav = nav.clone();
    crate::utils::run_async_to_main(
        async move {
            let (appointments, pros, ests) = tokio::join!(
                api.client_appointments(&client_id),
                api.professionals(),
                api.establishments()
            );
            let pros = pros.unwrap_or_else(|e| {
                log::warn!("professional names unavailable: {e}");
                Vec::new()
            });
            let ests = ests.unwrap_or_else(|e| {
                log::warn!("establishment names unavailable: {e}");
                Vec::new()
            });
            appointments.map(|a| views::enrich_appointments(a, &pros, &ests))
        },
        move |res| {
            widgets::clear_list(&list);
            let rows = match res {
                Ok(rows) => rows,
                Err(err) => {
                    log::error!("failed to load appointments: {err}");
                    banner.error(&err.user_message(Operation::Plain("Erro ao buscar agendamentos.")));
                    return;
                }
            };
            if rows.is_empty() {
                list.append(&widgets::placeholder("Você ainda não possui agendamentos."));
                return;
            }
            for row in rows {
                list.append(&appointment_row(&nav, &list, &banner, row));
            }
        },
    );

    root.upcast()
}

fn appointment_row(nav: &Navigator, list: &gtk::ListBox, banner: &Banner, item: AppointmentRow) -> adw::ActionRow {
    let when = match item.appointment.starts_at() {
        Some(at) => format!("{} às {}", views::format_date(&at, &Local), views::format_time(&at, &Local)),
        None => item.appointment.data_hora.clone(),
    };
    let subtitle = format!(
        "{when}\nProfissional: {}\nEstabelecimento: {}",
        item.professional_name, item.establishment_name
    );
    let row = widgets::row(&item.appointment.procedimento, &subtitle);

    let edit = widgets::button("Editar", None);
    let cancel = widgets::button("Cancelar", Some("destructive-action"));
    for b in [&edit, &cancel] {
        b.set_valign(gtk::Align::Center);
        row.add_suffix(b);
    }
    {
        let nav = nav.clone();
        let appointment = item.appointment.clone();
        edit.connect_clicked(move |_| nav.navigate(Route::EditAppointment(appointment.clone())));
    }

    let nav = nav.clone();
    let list = list.clone();
    let banner = banner.clone();
    let target = row.clone();
    let id = item.appointment.id;
    cancel.connect_clicked(move |_| {
        let api = nav.api();
        let list = list.clone();
        let banner = banner.clone();
        let target = target.clone();
        let id = id.clone();
        widgets::confirm(nav.window(), "Tem certeza que deseja cancelar este agendamento?", move || {
            let api = api.clone();
            let list = list.clone();
            let banner = banner.clone();
            let target = target.clone();
            let id = id.clone();
            crate::utils::run_async_to_main(async move { api.cancel_appointment(&id).await }, move |res| match res {
                Ok(()) => {
                    list.remove(&target);
                    banner.success("Agendamento cancelado com sucesso!");
                    if list.first_child().is_none() {
                        list.append(&widgets::placeholder("Você ainda não possui agendamentos."));
                    }
                }
                Err(err) => {
                    log::error!("cancel failed: {err}");
                    banner.error(&err.user_message(Operation::Plain("Erro ao cancelar agendamento.")));
                }
            });
        });
    });

    row
}

pub fn edit_page(nav: &Navigator, appointment: Appointment) -> gtk::Widget {
    let root = widgets::page("Editar Agendamento");
    let back = widgets::back_button("← Voltar para meus agendamentos");
    {
        let nav = nav.clone();
        back.connect_clicked(move |_| nav.navigate(Route::MyAppointments));
    }
    root.prepend(&back);

    let current = match appointment.starts_at() {
        Some(at) => format!("{} às {}", views::format_date(&at, &Local), views::format_time(&at, &Local)),
        None => appointment.data_hora.clone(),
    };
    let info = widgets::list();
    info.append(&widgets::row("Agendamento atual", &format!("{} · {current}", appointment.procedimento)));
    root.append(&info);

    let procedure_drop = gtk::DropDown::from_strings(&[appointment.procedimento.as_str()]);
    root.append(&widgets::field("Procedimento", &procedure_drop));

    let chosen: Rc<RefCell<Option<(NaiveDate, String)>>> = Rc::new(RefCell::new(None));
    let chosen_label = gtk::Label::new(Some("Mantendo data e horário atuais."));
    chosen_label.set_halign(gtk::Align::Start);
    chosen_label.add_css_class("dim-label");

    let on_pick: Rc<dyn Fn(NaiveDate, String)> = {
        let chosen = chosen.clone();
        let chosen_label = chosen_label.clone();
        Rc::new(move |date, slot| {
            chosen_label.set_label(&format!("Novo horário: {} às {slot}", views::long_date(date)));
            *chosen.borrow_mut() = Some((date, slot));
        })
    };
    let procedure_id = Rc::new(RefCell::new(String::new()));
    let picker = Rc::new(SlotPicker::new(
        nav,
        appointment.profissional_id.clone(),
        procedure_id.clone(),
        on_pick,
    ));
    root.append(picker.widget());
    root.append(&chosen_label);
    if let Some(at) = appointment.starts_at() {
        let day = at.with_timezone(&Local).date_naive();
        if day >= Local::now().date_naive() {
            picker.select(day);
        }
    }

    let banner = Banner::new();
    root.append(banner.widget());
    let save = widgets::button("Salvar alterações", Some("suggested-action"));
    save.set_halign(gtk::Align::End);
    root.append(&save);

    let procedures: Rc<RefCell<Vec<Procedure>>> = Rc::new(RefCell::new(Vec::new()));
    {
        let procedures = procedures.clone();
        let procedure_id = procedure_id.clone();
        let picker = picker.clone();
        procedure_drop.connect_selected_notify(move |drop| {
            let picked = procedures.borrow().get(drop.selected() as usize).map(|p| p.id.clone());
            if let Some(id) = picked {
                *procedure_id.borrow_mut() = id;
                picker.refresh();
            }
        });
    }
    {
        let api = nav.api();
        let pid = appointment.profissional_id.clone();
        let name = appointment.procedimento.clone();
        let procedures = procedures.clone();
        let procedure_drop = procedure_drop.clone();
        let banner = banner.clone();
        crate::utils::run_async_to_main(async move { api.procedures(&pid).await }, move |res| match res {
            Ok(list) if !list.is_empty() => {
                let names: Vec<&str> = list.iter().map(|p| p.nome.as_str()).collect();
                let model = gtk::StringList::new(&names);
                let index = list.iter().position(|p| p.nome == name).unwrap_or(0) as u32;
                *procedures.borrow_mut() = list;
                procedure_drop.set_model(Some(&model));
                procedure_drop.set_selected(index);
                procedure_drop.notify("selected");
            }
            Ok(_) => log::info!("professional has no procedures to switch to"),
            Err(err) => {
                log::error!("failed to load procedures: {err}");
                banner.error(&err.user_message(Operation::Plain("Erro ao carregar procedimentos.")));
            }
        });
    }

    let nav = nav.clone();
    save.connect_clicked(move |btn| {
        banner.clear();
        let procedimento = procedures
            .borrow()
            .get(procedure_drop.selected() as usize)
            .map(|p| p.nome.clone())
            .unwrap_or_else(|| appointment.procedimento.clone());
        let data_hora = match chosen.borrow().as_ref() {
            Some((date, slot)) => match slots::slot_datetime(*date, slot, &Local) {
                Some(at) => at.to_rfc3339(),
                None => {
                    banner.error("Horário inválido.");
                    return;
                }
            },
            None => appointment.data_hora.clone(),
        };
        let updated = Appointment { procedimento, data_hora, ..appointment.clone() };

        btn.set_sensitive(false);
        let api = nav.api();
        let nav = nav.clone();
        let banner = banner.clone();
        let btn = btn.clone();
        crate::utils::run_async_to_main(async move { api.update_appointment(&updated).await }, move |res| {
            btn.set_sensitive(true);
            match res {
                Ok(()) => {
                    widgets::notify(nav.window(), "Agendamento atualizado com sucesso!");
                    nav.navigate(Route::MyAppointments);
                }
                Err(err) => {
                    log::error!("update failed: {err}");
                    banner.error(&err.user_message(Operation::Plain("Erro ao atualizar agendamento.")));
                }
            }
        });
    });

    root.upcast()
}
