use crate::api::models::{Appointment, Procedure, UserKind};

/// A booking being assembled between the calendar and the confirmation page.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingDraft {
    pub professional_id: String,
    pub procedure_name: String,
    pub price: f64,
    pub establishment_id: String,
    /// RFC 3339, UTC.
    pub starts_at: String,
}

/// Every screen of the client. Route parameters travel inside the variant.
#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    Login,
    Register,
    // client
    Establishments,
    EstablishmentProfessionals { establishment_id: String },
    Procedures { professional_id: String, establishment_id: Option<String> },
    Booking { professional_id: String, procedure: Procedure, establishment_id: Option<String> },
    ConfirmBooking(BookingDraft),
    MyAppointments,
    EditAppointment(Appointment),
    ClientProfile,
    // professional
    ProfessionalAgenda,
    ProfessionalHours,
    ProfessionalProcedures { professional_id: String },
    ProfessionalProfile,
    Invitations,
    // admin
    AdminDashboard,
    ManageEstablishments,
    CreateEstablishment,
    EditEstablishment { establishment_id: String },
    EstablishmentStaff { establishment_id: String },
    InviteProfessional { establishment_id: String },
}

impl Route {
    pub fn is_protected(&self) -> bool {
        !matches!(self, Route::Login | Route::Register)
    }

    /// Web path of the screen, used for logging.
    pub fn path(&self) -> String {
        match self {
            Route::Login => "/".into(),
            Route::Register => "/cadastro".into(),
            Route::Establishments => "/listaEstabelecimentos".into(),
            Route::EstablishmentProfessionals { establishment_id } => {
                format!("/estabelecimento/{establishment_id}/profissionais")
            }
            Route::Procedures { professional_id, .. } => format!("/procedimentos/{professional_id}"),
            Route::Booking { professional_id, .. } => format!("/verAgenda/{professional_id}"),
            Route::ConfirmBooking(_) => "/ConfirmarAgendamento".into(),
            Route::MyAppointments => "/MeusAgendamentos".into(),
            Route::EditAppointment(_) => "/editar-agendamento".into(),
            Route::ClientProfile => "/cliente/editar-perfil".into(),
            Route::ProfessionalAgenda => "/agendaProfissional".into(),
            Route::ProfessionalHours => "/horarios-profissional".into(),
            Route::ProfessionalProcedures { professional_id } => {
                format!("/meus-procedimentos/{professional_id}")
            }
            Route::ProfessionalProfile => "/profissional/editar-perfil".into(),
            Route::Invitations => "/convites".into(),
            Route::AdminDashboard => "/admin".into(),
            Route::ManageEstablishments => "/admin/estabelecimentos".into(),
            Route::CreateEstablishment => "/admin/estabelecimentos/criar".into(),
            Route::EditEstablishment { establishment_id } => {
                format!("/admin/estabelecimentos/editar/{establishment_id}")
            }
            Route::EstablishmentStaff { establishment_id } => {
                format!("/admin/estabelecimentos/{establishment_id}/profissionais")
            }
            Route::InviteProfessional { establishment_id } => {
                format!("/admin/estabelecimentos/{establishment_id}/profissionais/adicionar")
            }
        }
    }
}

/// Screens visited so far, newest last. Only the most recent
/// `History::LIMIT` entries are kept.
#[derive(Debug, Default)]
pub struct History {
    visited: Vec<Route>,
}

impl History {
    pub const LIMIT: usize = 20;

    pub fn push(&mut self, route: Route) {
        self.visited.push(route);
        if self.visited.len() > Self::LIMIT {
            let excess = self.visited.len() - Self::LIMIT;
            self.visited.drain(..excess);
        }
    }

    /// Drops the current screen and returns the one before it.
    pub fn back(&mut self) -> Option<Route> {
        self.visited.pop();
        self.visited.pop()
    }

    /// Forgets the current screen, for pages that redirect on arrival.
    pub fn drop_current(&mut self) {
        self.visited.pop();
    }

    pub fn clear(&mut self) {
        self.visited.clear();
    }
}

/// Protected screens need a stored user id; without one the user lands on
/// the login screen.
pub fn guard(route: Route, authenticated: bool) -> Route {
    if route.is_protected() && !authenticated {
        log::info!("{} requires a session, redirecting to login", route.path());
        Route::Login
    } else {
        route
    }
}

/// Landing screen after login.
pub fn home_for(kind: UserKind) -> Option<Route> {
    match kind {
        UserKind::Client => Some(Route::Establishments),
        UserKind::Professional => Some(Route::ProfessionalAgenda),
        UserKind::Admin => Some(Route::AdminDashboard),
        UserKind::Unknown => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protected_routes_redirect_without_session() {
        assert_eq!(guard(Route::MyAppointments, false), Route::Login);
        assert_eq!(guard(Route::ProfessionalAgenda, false), Route::Login);
        assert_eq!(
            guard(Route::EditEstablishment { establishment_id: "e1".into() }, false),
            Route::Login
        );
        assert_eq!(guard(Route::MyAppointments, true), Route::MyAppointments);
    }

    #[test]
    fn public_routes_stay_open() {
        assert_eq!(guard(Route::Login, false), Route::Login);
        assert_eq!(guard(Route::Register, false), Route::Register);
    }

    #[test]
    fn home_depends_on_user_kind() {
        assert_eq!(home_for(UserKind::Client), Some(Route::Establishments));
        assert_eq!(home_for(UserKind::Professional), Some(Route::ProfessionalAgenda));
        assert_eq!(home_for(UserKind::Admin), Some(Route::AdminDashboard));
        assert_eq!(home_for(UserKind::Unknown), None);
    }

    #[test]
    fn history_is_capped_and_goes_back() {
        let mut history = History::default();
        for i in 0..History::LIMIT + 5 {
            history.push(Route::EstablishmentStaff { establishment_id: i.to_string() });
        }
        assert_eq!(history.visited.len(), History::LIMIT);
        assert_eq!(history.visited[0], Route::EstablishmentStaff { establishment_id: "5".into() });
        let last = History::LIMIT + 4;
        assert_eq!(
            history.back(),
            Some(Route::EstablishmentStaff { establishment_id: (last - 1).to_string() })
        );

        history.clear();
        history.push(Route::ProfessionalAgenda);
        history.push(Route::Invitations);
        history.drop_current();
        history.push(Route::ProfessionalAgenda);
        assert_eq!(history.back(), Some(Route::ProfessionalAgenda));
        assert_eq!(history.back(), None);
    }

    #[test]
    fn paths_match_web_routes() {
        assert_eq!(Route::Establishments.path(), "/listaEstabelecimentos");
        assert_eq!(
            Route::Procedures { professional_id: "p1".into(), establishment_id: None }.path(),
            "/procedimentos/p1"
        );
        assert_eq!(
            Route::InviteProfessional { establishment_id: "e1".into() }.path(),
            "/admin/estabelecimentos/e1/profissionais/adicionar"
        );
    }
}
