//! Page logic that does not touch widgets: filtering, joining and formatting
//! the records the backend returns.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use crate::api::models::{parse_timestamp, Appointment, Establishment, EstablishmentMember, Procedure, Professional};

pub const UNKNOWN_NAME: &str = "Desconhecido";
pub const NOT_INFORMED: &str = "Não informado";
pub const MEMBER_NAME_MISSING: &str = "Nome não informado";

/// Case-insensitive name search plus an exact city filter (empty = any).
pub fn filter_establishments<'a>(
    list: &'a [Establishment],
    query: &str,
    city: &str,
) -> Vec<&'a Establishment> {
    let query = query.trim().to_lowercase();
    list.iter()
        .filter(|e| e.nome.to_lowercase().contains(&query))
        .filter(|e| city.is_empty() || e.city() == Some(city))
        .collect()
}

/// Distinct cities, sorted, for the city filter.
pub fn cities(list: &[Establishment]) -> Vec<String> {
    list.iter()
        .filter_map(|e| e.city())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Establishments managed by the given admin.
pub fn owned_by<'a>(list: &'a [Establishment], user_id: &str) -> Vec<&'a Establishment> {
    list.iter().filter(|e| e.responsavel_uid == user_id).collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppointmentRow {
    pub appointment: Appointment,
    pub professional_name: String,
    pub establishment_name: String,
}

/// Resolves professional and establishment names and sorts newest first.
pub fn enrich_appointments(
    appointments: Vec<Appointment>,
    professionals: &[Professional],
    establishments: &[Establishment],
) -> Vec<AppointmentRow> {
    let pros: HashMap<&str, &str> = professionals
        .iter()
        .map(|p| (p.id.as_str(), p.nome.as_str()))
        .collect();
    let ests: HashMap<&str, &str> = establishments
        .iter()
        .map(|e| (e.id.as_str(), e.nome.as_str()))
        .collect();

    let mut rows: Vec<AppointmentRow> = appointments
        .into_iter()
        .map(|a| {
            let professional_name = pros
                .get(a.profissional_id.as_str())
                .copied()
                .unwrap_or(UNKNOWN_NAME)
                .to_string();
            let establishment_name = match a.estabelecimento_id.as_deref() {
                Some(id) if !id.is_empty() => ests.get(id).copied().unwrap_or(UNKNOWN_NAME),
                _ => NOT_INFORMED,
            }
            .to_string();
            AppointmentRow { appointment: a, professional_name, establishment_name }
        })
        .collect();
    rows.sort_by(|a, b| b.appointment.starts_at().cmp(&a.appointment.starts_at()));
    rows
}

/// Appointments whose start falls on `day` in `tz`, earliest first.
pub fn appointments_on<Tz: TimeZone>(appointments: &[Appointment], day: NaiveDate, tz: &Tz) -> Vec<Appointment> {
    let mut out: Vec<Appointment> = appointments
        .iter()
        .filter(|a| {
            a.starts_at_in(tz)
                .map(|at| at.with_timezone(tz).date_naive() == day)
                .unwrap_or(false)
        })
        .cloned()
        .collect();
    out.sort_by_key(|a| a.starts_at_in(tz));
    out
}

/// Member display name: looked-up name, then the name on the link, then a
/// placeholder.
pub fn member_name(member: &EstablishmentMember, looked_up: Option<&str>) -> String {
    let filled = |n: &&str| !n.trim().is_empty();
    looked_up
        .filter(filled)
        .or(member.nome.as_deref().filter(filled))
        .unwrap_or(MEMBER_NAME_MISSING)
        .to_string()
}

/// Second line of a staff row: UID, link status and the date it was added.
pub fn member_subtitle<Tz: TimeZone>(member: &EstablishmentMember, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let added = parse_timestamp(&member.adicionado_em, tz)
        .map(|at| format_date(&at, tz))
        .unwrap_or_else(|| member.adicionado_em.clone());
    let status = if member.status.is_empty() { NOT_INFORMED } else { member.status.as_str() };
    format!("UID: {} · Status: {status} · Adicionado em: {added}", member.uid)
}

/// Professionals whose name or procedures match the search text.
pub fn filter_professionals<'a>(
    list: &'a [(Professional, Vec<String>)],
    query: &str,
) -> Vec<&'a (Professional, Vec<String>)> {
    let query = query.trim().to_lowercase();
    list.iter()
        .filter(|(p, procs)| {
            query.is_empty()
                || p.nome.to_lowercase().contains(&query)
                || procs.iter().any(|n| n.contains(&query))
        })
        .collect()
}

pub fn procedure_names_lower(procedures: &[Procedure]) -> Vec<String> {
    procedures.iter().map(|p| p.nome.to_lowercase()).collect()
}

pub fn format_date<Tz: TimeZone>(at: &DateTime<Utc>, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.with_timezone(tz).format("%d/%m/%Y").to_string()
}

pub fn format_time<Tz: TimeZone>(at: &DateTime<Utc>, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.with_timezone(tz).format("%H:%M").to_string()
}

pub fn format_price(value: f64) -> String {
    format!("R${value:.2}")
}

/// Long date used above the slot grid, e.g. "10 de março de 2025".
pub fn long_date(date: NaiveDate) -> String {
    use chrono::Datelike;
    const MONTHS: [&str; 12] = [
        "janeiro", "fevereiro", "março", "abril", "maio", "junho", "julho", "agosto", "setembro",
        "outubro", "novembro", "dezembro",
    ];
    format!("{:02} de {} de {}", date.day(), MONTHS[date.month0() as usize], date.year())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::Location;
    use chrono::FixedOffset;

    fn est(id: &str, nome: &str, city: &str, owner: &str) -> Establishment {
        Establishment {
            id: id.into(),
            nome: nome.into(),
            localizacao: Location { cidade: city.into(), ..Default::default() },
            responsavel_uid: owner.into(),
            ..Default::default()
        }
    }

    fn appt(id: &str, pro: &str, est: Option<&str>, at: &str) -> Appointment {
        Appointment {
            id: id.into(),
            profissional_id: pro.into(),
            estabelecimento_id: est.map(str::to_string),
            data_hora: at.into(),
            ..Default::default()
        }
    }

    #[test]
    fn establishment_search_and_city() {
        let list = vec![
            est("1", "Barbearia Central", "Recife", "a"),
            est("2", "Salão Bela", "Olinda", "a"),
            est("3", "Barber Shop", "Olinda", "b"),
        ];
        let ids = |v: Vec<&Establishment>| v.iter().map(|e| e.id.clone()).collect::<Vec<_>>();
        assert_eq!(ids(filter_establishments(&list, "BARB", "")), vec!["1", "3"]);
        assert_eq!(ids(filter_establishments(&list, "barb", "Olinda")), vec!["3"]);
        assert_eq!(ids(filter_establishments(&list, "", "")).len(), 3);
        assert_eq!(cities(&list), vec!["Olinda", "Recife"]);
        assert_eq!(ids(owned_by(&list, "b")), vec!["3"]);
    }

    #[test]
    fn city_filter_ignores_stored_whitespace() {
        let list = vec![est("1", "Studio", "Recife ", "a"), est("2", "Salão", " Olinda", "a")];
        assert_eq!(cities(&list), vec!["Olinda", "Recife"]);
        let found = filter_establishments(&list, "", "Recife");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "1");
        assert_eq!(filter_establishments(&list, "", "Olinda")[0].id, "2");
    }

    #[test]
    fn appointments_get_names_and_newest_first() {
        let pros = vec![Professional { id: "p1".into(), nome: "Rui".into(), ..Default::default() }];
        let ests = vec![est("e1", "Studio", "", "")];
        let rows = enrich_appointments(
            vec![
                appt("a", "p1", Some("e1"), "2025-03-01T10:00:00Z"),
                appt("b", "p9", Some("e9"), "2025-03-05T10:00:00Z"),
                appt("c", "p1", None, "2025-02-01T10:00:00Z"),
            ],
            &pros,
            &ests,
        );
        let order: Vec<&str> = rows.iter().map(|r| r.appointment.id.as_str()).collect();
        assert_eq!(order, vec!["b", "a", "c"]);
        assert_eq!(rows[0].professional_name, UNKNOWN_NAME);
        assert_eq!(rows[0].establishment_name, UNKNOWN_NAME);
        assert_eq!(rows[1].professional_name, "Rui");
        assert_eq!(rows[1].establishment_name, "Studio");
        assert_eq!(rows[2].establishment_name, NOT_INFORMED);
    }

    #[test]
    fn agenda_filters_by_local_day() {
        let brt = FixedOffset::west_opt(3 * 3600).unwrap();
        let list = vec![
            appt("late", "p", None, "2025-03-11T01:30:00Z"), // 10/03 22:30 local
            appt("morning", "p", None, "2025-03-10T12:00:00Z"),
            appt("next", "p", None, "2025-03-11T12:00:00Z"),
            appt("bad", "p", None, "ontem"),
        ];
        let day = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let ids: Vec<String> = appointments_on(&list, day, &brt).into_iter().map(|a| a.id).collect();
        assert_eq!(ids, vec!["morning", "late"]);
    }

    #[test]
    fn agenda_reads_zoneless_times_as_local() {
        let brt = FixedOffset::west_opt(3 * 3600).unwrap();
        let list = vec![appt("early", "p", None, "2025-03-10T01:30:00")];
        let day = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let shown = appointments_on(&list, day, &brt);
        assert_eq!(shown.len(), 1);
        let at = shown[0].starts_at_in(&brt).unwrap();
        assert_eq!(format_time(&at, &brt), "01:30");
    }

    #[test]
    fn member_name_fallbacks() {
        let member = EstablishmentMember { uid: "p1".into(), nome: Some("Rui".into()), ..Default::default() };
        assert_eq!(member_name(&member, Some("Rui Costa")), "Rui Costa");
        assert_eq!(member_name(&member, None), "Rui");
        assert_eq!(member_name(&member, Some("")), "Rui");
        let bare = EstablishmentMember { uid: "p2".into(), ..Default::default() };
        assert_eq!(member_name(&bare, None), MEMBER_NAME_MISSING);
    }

    #[test]
    fn member_subtitle_shows_uid_status_and_date() {
        let brt = FixedOffset::west_opt(3 * 3600).unwrap();
        let member = EstablishmentMember {
            uid: "p1".into(),
            status: "ativo".into(),
            adicionado_em: "2025-03-10T01:00:00Z".into(),
            ..Default::default()
        };
        assert_eq!(member_subtitle(&member, &brt), "UID: p1 · Status: ativo · Adicionado em: 09/03/2025");
        let bare = EstablishmentMember { uid: "p2".into(), ..Default::default() };
        assert_eq!(member_subtitle(&bare, &brt), format!("UID: p2 · Status: {NOT_INFORMED} · Adicionado em: "));
    }

    #[test]
    fn professional_search_matches_procedures() {
        let list = vec![
            (Professional { id: "1".into(), nome: "Rui".into(), ..Default::default() }, vec!["corte".into()]),
            (Professional { id: "2".into(), nome: "Lia".into(), ..Default::default() }, vec!["manicure".into()]),
        ];
        assert_eq!(filter_professionals(&list, "MANI").len(), 1);
        assert_eq!(filter_professionals(&list, "rui")[0].0.id, "1");
        assert_eq!(filter_professionals(&list, "").len(), 2);
    }

    #[test]
    fn formatting() {
        let at = "2025-03-10T12:05:00Z".parse::<DateTime<Utc>>().unwrap();
        let brt = FixedOffset::west_opt(3 * 3600).unwrap();
        assert_eq!(format_date(&at, &brt), "10/03/2025");
        assert_eq!(format_time(&at, &brt), "09:05");
        assert_eq!(format_price(40.0), "R$40.00");
        assert_eq!(long_date(NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()), "01 de março de 2025");
    }
}
