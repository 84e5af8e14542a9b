use adw::prelude::*;
use adw::Application;
use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

use crate::api::client::ApiClient;
use crate::app::AppConfig;
use crate::routes::{guard, home_for, History, Route};
use crate::session::SessionStore;

struct Inner {
    window: adw::ApplicationWindow,
    api: ApiClient,
    session: RefCell<SessionStore>,
    history: RefCell<History>,
}

/// Owns the window and swaps its content on every navigation. Cloned into
/// every signal handler that needs to change screens.
#[derive(Clone)]
pub struct Navigator {
    inner: Rc<Inner>,
}

impl Navigator {
    pub fn window(&self) -> &adw::ApplicationWindow {
        &self.inner.window
    }

    pub fn api(&self) -> ApiClient {
        self.inner.api.clone()
    }

    pub fn session(&self) -> Ref<'_, SessionStore> {
        self.inner.session.borrow()
    }

    pub fn session_mut(&self) -> RefMut<'_, SessionStore> {
        self.inner.session.borrow_mut()
    }

    /// Stored user id; protected pages are only built when it exists.
    pub fn user_id(&self) -> String {
        self.session().user_id().unwrap_or_default()
    }

    pub fn navigate(&self, route: Route) {
        let authenticated = self.session().is_authenticated();
        let route = guard(route, authenticated);
        log::debug!("navigating to {}", route.path());
        let content = self.build(&route);
        let page = crate::ui::layout::wrap(self, &content, route.is_protected());
        self.inner.window.set_content(Some(&page));
        self.inner.history.borrow_mut().push(route);
    }

    /// Goes to the previous screen, or the user's home when there is none.
    pub fn back(&self) {
        let previous = self.inner.history.borrow_mut().back();
        match previous {
            Some(route) => self.navigate(route),
            None => self.go_home(),
        }
    }

    /// Leaves the screen being shown for `route` without keeping it in the
    /// back history. Deferred to idle so the current build can finish.
    pub fn redirect(&self, route: Route) {
        let nav = self.clone();
        glib::idle_add_local_once(move || {
            nav.inner.history.borrow_mut().drop_current();
            nav.navigate(route);
        });
    }

    pub fn go_home(&self) {
        let kind = self.session().user_kind();
        self.navigate(home_for(kind).unwrap_or(Route::Login));
    }

    pub fn logout(&self) {
        if let Err(e) = self.session().clear() {
            log::error!("failed to clear session: {e}");
        }
        self.inner.history.borrow_mut().clear();
        self.navigate(Route::Login);
    }

    fn build(&self, route: &Route) -> gtk4::Widget {
        use crate::ui::{admin, appointments, booking, establishments, login, professional, profile, register};
        match route.clone() {
            Route::Login => login::page(self),
            Route::Register => register::page(self),
            Route::Establishments => establishments::list_page(self),
            Route::EstablishmentProfessionals { establishment_id } => {
                establishments::professionals_page(self, establishment_id)
            }
            Route::Procedures { professional_id, establishment_id } => {
                booking::procedures_page(self, professional_id, establishment_id)
            }
            Route::Booking { professional_id, procedure, establishment_id } => {
                booking::calendar_page(self, professional_id, procedure, establishment_id)
            }
            Route::ConfirmBooking(draft) => booking::confirm_page(self, draft),
            Route::MyAppointments => appointments::list_page(self),
            Route::EditAppointment(appointment) => appointments::edit_page(self, appointment),
            Route::ClientProfile => profile::page(self, crate::api::models::UserKind::Client),
            Route::ProfessionalAgenda => professional::agenda_page(self),
            Route::ProfessionalHours => professional::hours_page(self),
            Route::ProfessionalProcedures { professional_id } => {
                professional::procedures_page(self, professional_id)
            }
            Route::ProfessionalProfile => profile::page(self, crate::api::models::UserKind::Professional),
            Route::Invitations => professional::invitations_page(self),
            Route::AdminDashboard => admin::dashboard_page(self),
            Route::ManageEstablishments => admin::manage_page(self),
            Route::CreateEstablishment => admin::establishment_form_page(self, None),
            Route::EditEstablishment { establishment_id } => {
                admin::establishment_form_page(self, Some(establishment_id))
            }
            Route::EstablishmentStaff { establishment_id } => admin::staff_page(self, establishment_id),
            Route::InviteProfessional { establishment_id } => admin::invite_page(self, establishment_id),
        }
    }
}

pub fn show_main_window(app: &Application, config: AppConfig) {
    let window = adw::ApplicationWindow::builder()
        .application(app)
        .title("ServiFlex")
        .default_width(960)
        .default_height(720)
        .build();

    let api = match ApiClient::new(&config) {
        Ok(api) => api,
        Err(e) => {
            log::error!("invalid API configuration {}: {e}", config.api_url);
            show_fatal(&window, &format!("Endereço da API inválido: {}", config.api_url));
            return;
        }
    };
    let session = match SessionStore::open_default() {
        Ok(store) => store,
        Err(e) => {
            log::warn!("falling back to an in-memory session: {e}");
            match SessionStore::open_in_memory() {
                Ok(store) => store,
                Err(e) => {
                    log::error!("no session store available: {e}");
                    show_fatal(&window, "Não foi possível iniciar a sessão.");
                    return;
                }
            }
        }
    };

    let nav = Navigator {
        inner: Rc::new(Inner {
            window: window.clone(),
            api,
            session: RefCell::new(session),
            history: RefCell::new(History::default()),
        }),
    };
    if nav.session().is_authenticated() {
        nav.go_home();
    } else {
        nav.navigate(Route::Login);
    }
    window.present();
}

fn show_fatal(window: &adw::ApplicationWindow, message: &str) {
    let label = gtk4::Label::new(Some(message));
    label.add_css_class("error");
    label.set_margin_top(48);
    window.set_content(Some(&label));
    window.present();
}
