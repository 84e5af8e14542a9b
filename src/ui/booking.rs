use adw::prelude::*;
use chrono::{Datelike, Local, NaiveDate};
use gtk4 as gtk;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::api::error::Operation;
use crate::api::models::{AvailabilityRule, NewAppointment, Procedure};
use crate::routes::{BookingDraft, Route};
use crate::slots;
use crate::ui::main_window::Navigator;
use crate::ui::widgets::{self, Banner};
use crate::views;

pub fn procedures_page(nav: &Navigator, professional_id: String, establishment_id: Option<String>) -> gtk::Widget {
    let root = widgets::page("Procedimentos");
    let back = widgets::back_button("← Voltar");
    {
        let nav = nav.clone();
        back.connect_clicked(move |_| nav.back());
    }
    root.prepend(&back);

    let who = gtk::Label::new(None);
    who.set_halign(gtk::Align::Start);
    who.add_css_class("dim-label");
    root.append(&who);
    let banner = Banner::new();
    root.append(banner.widget());
    let list = widgets::list();
    list.append(&widgets::placeholder("Carregando..."));
    root.append(&list);

    let api = nav.api();
    let nav = nav.clone();
    let id = professional_id.clone();
    crate::utils::run_async_to_main(
        async move {
            let (pro, procedures) = tokio::join!(api.professional(&id), api.procedures(&id));
            (pro.ok(), procedures)
        },
        move |(pro, procedures)| {
            widgets::clear_list(&list);
            if let Some(pro) = pro {
                who.set_label(&format!("Profissional: {}", pro.nome));
            }
            let procedures = match procedures {
                Ok(p) => p,
                Err(err) => {
                    log::error!("failed to load procedures of {professional_id}: {err}");
                    banner.error(&err.user_message(Operation::Plain("Erro ao carregar procedimentos.")));
                    return;
                }
            };
            if procedures.is_empty() {
                list.append(&widgets::placeholder("Este profissional ainda não cadastrou procedimentos."));
                return;
            }
            for procedure in procedures {
                let mut subtitle = format!("{} · {} min", procedure.price_label(), procedure.duracao_min);
                if !procedure.descricao.is_empty() {
                    subtitle = format!("{subtitle}\n{}", procedure.descricao);
                }
                let row = widgets::row(&procedure.nome, &subtitle);
                let pick = widgets::button("Agendar", Some("suggested-action"));
                pick.set_valign(gtk::Align::Center);
                row.add_suffix(&pick);
                let nav = nav.clone();
                let route = Route::Booking {
                    professional_id: professional_id.clone(),
                    procedure,
                    establishment_id: establishment_id.clone(),
                };
                pick.connect_clicked(move |_| nav.navigate(route.clone()));
                list.append(&row);
            }
        },
    );

    root.upcast()
}

/// Calendar plus the grid of free slots for the picked day.
///
/// Slots come from the backend when a procedure is known; otherwise, or when
/// that request fails, they are derived hour by hour from the weekly rules.
pub(crate) struct SlotPicker {
    widget: gtk::Box,
    calendar: gtk::Calendar,
    refresh: Rc<dyn Fn()>,
}

impl SlotPicker {
    pub fn new(
        nav: &Navigator,
        professional_id: String,
        procedure_id: Rc<RefCell<String>>,
        on_pick: Rc<dyn Fn(NaiveDate, String)>,
    ) -> Self {
        let widget = gtk::Box::new(gtk::Orientation::Vertical, 12);
        let calendar = gtk::Calendar::new();
        calendar.set_halign(gtk::Align::Center);
        let day_label = gtk::Label::new(None);
        day_label.add_css_class("heading");
        day_label.set_halign(gtk::Align::Start);
        let banner = Banner::new();
        let grid = gtk::FlowBox::new();
        grid.set_selection_mode(gtk::SelectionMode::None);
        grid.set_max_children_per_line(6);
        grid.set_homogeneous(true);
        grid.set_column_spacing(6);
        grid.set_row_spacing(6);
        widget.append(&calendar);
        widget.append(&day_label);
        widget.append(banner.widget());
        widget.append(&grid);

        let rules: Rc<RefCell<Vec<AvailabilityRule>>> = Rc::new(RefCell::new(Vec::new()));
        let days: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));
        let loaded = Rc::new(Cell::new(false));
        let generation = Rc::new(Cell::new(0u64));

        let refresh: Rc<dyn Fn()> = {
            let nav = nav.clone();
            let calendar = calendar.clone();
            let banner = banner.clone();
            let rules = rules.clone();
            let days = days.clone();
            let loaded = loaded.clone();
            let professional_id = professional_id.clone();
            Rc::new(move || {
                let current = generation.get() + 1;
                generation.set(current);
                clear_grid(&grid);
                banner.clear();
                let Some(date) = selected_date(&calendar) else { return };
                day_label.set_label(&views::long_date(date));
                if !loaded.get() {
                    return;
                }
                if date < Local::now().date_naive() {
                    banner.info("Selecione uma data a partir de hoje.");
                    return;
                }
                if !slots::is_bookable(date, &days.borrow()) {
                    banner.info("O profissional não atende neste dia.");
                    return;
                }

                grid.append(&widgets::placeholder("Carregando horários..."));

                let fallback = slots::hourly_slots(&rules.borrow(), date);
                let procedure_id = procedure_id.borrow().clone();
                let api = nav.api();
                let pid = professional_id.clone();
                let generation = generation.clone();
                let grid = grid.clone();
                let on_pick = on_pick.clone();
                crate::utils::run_async_to_main(
                    async move {
                        if procedure_id.is_empty() {
                            return fallback;
                        }
                        match api.available_slots(&pid, date, &procedure_id).await {
                            Ok(found) => found,
                            Err(e) => {
                                log::warn!("slot lookup failed for {pid} on {date}, using weekly hours: {e}");
                                fallback
                            }
                        }
                    },
                    move |found| {
                        // a newer day was picked while this one loaded
                        if generation.get() != current {
                            return;
                        }
                        clear_grid(&grid);
                        if found.is_empty() {
                            grid.append(&widgets::placeholder("Nenhum horário disponível para esta data."));
                            return;
                        }
                        for slot in found {
                            let b = gtk::Button::with_label(&slot);
                            let on_pick = on_pick.clone();
                            b.connect_clicked(move |_| on_pick(date, slot.clone()));
                            grid.append(&b);
                        }
                    },
                );
            })
        };

        let remark: Rc<dyn Fn()> = {
            let calendar = calendar.clone();
            let days = days.clone();
            Rc::new(move || mark_bookable(&calendar, &days.borrow()))
        };
        {
            let refresh = refresh.clone();
            let remark = remark.clone();
            calendar.connect_day_selected(move |_| {
                remark();
                refresh();
            });
        }
        {
            let r = remark.clone();
            calendar.connect_next_month(move |_| r());
            let r = remark.clone();
            calendar.connect_prev_month(move |_| r());
            let r = remark.clone();
            calendar.connect_next_year(move |_| r());
            let r = remark.clone();
            calendar.connect_prev_year(move |_| r());
        }

        let api = nav.api();
        let refresh_after = refresh.clone();
        crate::utils::run_async_to_main(
            async move { api.availability(&professional_id).await },
            move |res| match res {
                Ok(list) => {
                    *days.borrow_mut() = slots::available_days(&list);
                    *rules.borrow_mut() = list;
                    loaded.set(true);
                    remark();
                    let none = days.borrow().is_empty();
                    if none {
                        banner.info("Este profissional ainda não cadastrou horários.");
                    } else {
                        refresh_after();
                    }
                }
                Err(err) => {
                    log::error!("failed to load availability: {err}");
                    banner.error(&err.user_message(Operation::Plain("Erro ao carregar horários do profissional.")));
                }
            },
        );

        Self { widget, calendar, refresh }
    }

    pub fn widget(&self) -> &gtk::Box {
        &self.widget
    }

    pub fn select(&self, date: NaiveDate) {
        match glib::DateTime::from_local(date.year(), date.month() as i32, date.day() as i32, 0, 0, 0.0) {
            Ok(dt) => self.calendar.select_day(&dt),
            Err(e) => log::warn!("cannot select {date} on the calendar: {e}"),
        }
    }

    /// Reloads the slots of the selected day.
    pub fn refresh(&self) {
        (self.refresh)();
    }
}

fn selected_date(calendar: &gtk::Calendar) -> Option<NaiveDate> {
    let dt = calendar.date();
    NaiveDate::from_ymd_opt(dt.year(), dt.month() as u32, dt.day_of_month() as u32)
}

fn mark_bookable(calendar: &gtk::Calendar, days: &[String]) {
    calendar.clear_marks();
    let Some(first) = selected_date(calendar).and_then(|d| d.with_day(1)) else { return };
    for day in first.iter_days().take_while(|d| d.month() == first.month()) {
        if slots::is_bookable(day, days) {
            calendar.mark_day(day.day());
        }
    }
}

fn clear_grid(grid: &gtk::FlowBox) {
    while let Some(child) = grid.first_child() {
        grid.remove(&child);
    }
}

pub fn calendar_page(
    nav: &Navigator,
    professional_id: String,
    procedure: Procedure,
    establishment_id: Option<String>,
) -> gtk::Widget {
    let root = widgets::page("Escolha data e horário");
    let back = widgets::back_button("← Voltar para procedimentos");
    {
        let nav = nav.clone();
        let route = Route::Procedures {
            professional_id: professional_id.clone(),
            establishment_id: establishment_id.clone(),
        };
        back.connect_clicked(move |_| nav.navigate(route.clone()));
    }
    root.prepend(&back);

    let summary = widgets::row(&procedure.nome, &format!("{} · {} min", procedure.price_label(), procedure.duracao_min));
    let card = widgets::list();
    card.append(&summary);
    root.append(&card);

    let on_pick: Rc<dyn Fn(NaiveDate, String)> = {
        let nav = nav.clone();
        let professional_id = professional_id.clone();
        let procedure = procedure.clone();
        Rc::new(move |date, slot| {
            let Some(at) = slots::slot_datetime(date, &slot, &Local) else {
                log::warn!("slot {slot} on {date} does not exist locally");
                return;
            };
            nav.navigate(Route::ConfirmBooking(BookingDraft {
                professional_id: professional_id.clone(),
                procedure_name: procedure.nome.clone(),
                price: procedure.preco,
                establishment_id: establishment_id.clone().unwrap_or_default(),
                starts_at: at.to_rfc3339(),
            }))
        })
    };
    let procedure_id = Rc::new(RefCell::new(procedure.id.clone()));
    let picker = SlotPicker::new(nav, professional_id, procedure_id, on_pick);
    root.append(picker.widget());

    root.upcast()
}

pub fn confirm_page(nav: &Navigator, draft: BookingDraft) -> gtk::Widget {
    let root = widgets::page("Confirmar Agendamento");
    let back = widgets::back_button("← Voltar");
    {
        let nav = nav.clone();
        back.connect_clicked(move |_| nav.back());
    }
    root.prepend(&back);

    let at = crate::api::models::parse_timestamp(&draft.starts_at, &Local);
    let details = widgets::list();
    let professional_row = widgets::row("Profissional", "Carregando...");
    details.append(&professional_row);
    details.append(&widgets::row("Procedimento", &draft.procedure_name));
    if let Some(at) = at {
        details.append(&widgets::row("Data", &views::format_date(&at, &Local)));
        details.append(&widgets::row("Horário", &views::format_time(&at, &Local)));
    }
    details.append(&widgets::row("Valor", &views::format_price(draft.price)));
    root.append(&details);

    let banner = Banner::new();
    root.append(banner.widget());
    let actions = widgets::button_row();
    let cancel = widgets::button("Cancelar", None);
    let confirm = widgets::button("Confirmar", Some("suggested-action"));
    actions.append(&cancel);
    actions.append(&confirm);
    root.append(&actions);
    {
        let nav = nav.clone();
        cancel.connect_clicked(move |_| nav.back());
    }

    let establishment_id = Rc::new(RefCell::new(draft.establishment_id.clone()));
    {
        let api = nav.api();
        let id = draft.professional_id.clone();
        let establishment_id = establishment_id.clone();
        crate::utils::run_async_to_main(async move { api.professional(&id).await }, move |res| match res {
            Ok(pro) => {
                professional_row.set_subtitle(&glib::markup_escape_text(&pro.nome));
                let missing = establishment_id.borrow().is_empty();
                if missing {
                    if let Some(est) = pro.estabelecimento_id {
                        *establishment_id.borrow_mut() = est;
                    }
                }
            }
            Err(e) => {
                log::warn!("could not load professional for confirmation: {e}");
                professional_row.set_subtitle("Profissional");
            }
        });
    }

    let nav = nav.clone();
    confirm.connect_clicked(move |btn| {
        banner.clear();
        let body = NewAppointment {
            cliente_id: nav.user_id(),
            profissional_id: draft.professional_id.clone(),
            procedimento: draft.procedure_name.clone(),
            data_hora: draft.starts_at.clone(),
            estabelecimento_id: establishment_id.borrow().clone(),
        };
        btn.set_sensitive(false);
        let api = nav.api();
        let nav = nav.clone();
        let banner = banner.clone();
        let btn = btn.clone();
        crate::utils::run_async_to_main(async move { api.create_appointment(&body).await }, move |res| {
            btn.set_sensitive(true);
            match res {
                Ok(()) => {
                    widgets::notify(nav.window(), "Agendamento confirmado com sucesso!");
                    nav.navigate(Route::MyAppointments);
                }
                Err(err) => {
                    log::error!("booking failed: {err}");
                    banner.error(&err.user_message(Operation::Plain("Erro ao confirmar agendamento.")));
                }
            }
        });
    });

    root.upcast()
}
