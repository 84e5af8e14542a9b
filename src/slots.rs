//! Weekly availability and time-slot helpers.
//!
//! Availability rules name their weekday in Portuguese ("Segunda", "Terça",
//! ...). Matching against a calendar date goes through [`normalize_day`], so
//! accented and unaccented spellings are the same day.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};

use crate::api::models::AvailabilityRule;

/// Days a professional can pick when publishing hours.
pub const WEEKDAY_LABELS: [&str; 6] = ["Segunda", "Terça", "Quarta", "Quinta", "Sexta", "Sábado"];

const WEEK_ORDER: [&str; 7] = ["segunda", "terca", "quarta", "quinta", "sexta", "sabado", "domingo"];

/// Lower-cases and strips diacritics: `"Terça"` becomes `"terca"`.
pub fn normalize_day(name: &str) -> String {
    name.trim()
        .chars()
        .filter(|c| !('\u{0300}'..='\u{036f}').contains(c))
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            'ñ' => 'n',
            other => other,
        })
        .collect()
}

pub fn weekday_key(day: Weekday) -> &'static str {
    match day {
        Weekday::Sun => "domingo",
        Weekday::Mon => "segunda",
        Weekday::Tue => "terca",
        Weekday::Wed => "quarta",
        Weekday::Thu => "quinta",
        Weekday::Fri => "sexta",
        Weekday::Sat => "sabado",
    }
}

/// Normalised names of the days that have at least one available rule.
pub fn available_days(rules: &[AvailabilityRule]) -> Vec<String> {
    let mut days: Vec<String> = rules
        .iter()
        .filter(|r| r.disponivel)
        .map(|r| normalize_day(&r.dia_semana))
        .collect();
    days.sort_unstable();
    days.dedup();
    days
}

/// Whether the calendar should let the user pick `date`.
pub fn is_bookable(date: NaiveDate, days: &[String]) -> bool {
    let key = weekday_key(date.weekday());
    days.iter().any(|d| d == key)
}

/// Parses `HH:MM` or `HH:MM:SS`.
pub fn parse_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .ok()
}

/// Hour-by-hour slots for `date`, from the first available rule whose day
/// matches: start inclusive, end exclusive. Empty when nothing matches or
/// the rule's times do not parse.
pub fn hourly_slots(rules: &[AvailabilityRule], date: NaiveDate) -> Vec<String> {
    let key = weekday_key(date.weekday());
    let Some(rule) = rules
        .iter()
        .find(|r| r.disponivel && normalize_day(&r.dia_semana) == key)
    else {
        return Vec::new();
    };
    let (Some(start), Some(end)) = (parse_time(&rule.hora_inicio), parse_time(&rule.hora_fim)) else {
        log::warn!(
            "availability rule {} has unreadable hours {:?}-{:?}",
            rule.id,
            rule.hora_inicio,
            rule.hora_fim
        );
        return Vec::new();
    };

    let mut slots = Vec::new();
    let mut current = start;
    while current < end {
        slots.push(current.format("%H:%M").to_string());
        let (next, wrapped) = current.overflowing_add_signed(Duration::hours(1));
        if wrapped != 0 {
            break;
        }
        current = next;
    }
    slots
}

/// Combines a picked calendar day and an `HH:MM` slot in `tz` into the
/// absolute instant sent to the backend.
pub fn slot_datetime<Tz: TimeZone>(date: NaiveDate, slot: &str, tz: &Tz) -> Option<DateTime<Utc>> {
    let time = parse_time(slot)?;
    tz.from_local_datetime(&date.and_time(time))
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Orders rules Monday first, Sunday last; unrecognised day names go to the end.
pub fn sort_by_weekday(rules: &mut [AvailabilityRule]) {
    rules.sort_by_key(|r| {
        let day = normalize_day(&r.dia_semana);
        WEEK_ORDER.iter().position(|d| *d == day).unwrap_or(WEEK_ORDER.len())
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn rule(day: &str, start: &str, end: &str, available: bool) -> AvailabilityRule {
        AvailabilityRule {
            id: format!("{day}-{start}"),
            profissional_id: "p1".into(),
            dia_semana: day.into(),
            hora_inicio: start.into(),
            hora_fim: end.into(),
            disponivel: available,
        }
    }

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
    }

    #[test]
    fn monday_morning_yields_three_slots() {
        let rules = [rule("Segunda", "09:00", "12:00", true)];
        assert_eq!(hourly_slots(&rules, monday()), vec!["09:00", "10:00", "11:00"]);
    }

    #[test]
    fn no_matching_rule_yields_nothing() {
        let rules = [rule("Terça", "09:00", "12:00", true)];
        assert!(hourly_slots(&rules, monday()).is_empty());
    }

    #[test]
    fn unavailable_rule_is_skipped() {
        let rules = [
            rule("Segunda", "08:00", "10:00", false),
            rule("segunda", "14:00", "16:00", true),
        ];
        assert_eq!(hourly_slots(&rules, monday()), vec!["14:00", "15:00"]);
        assert!(hourly_slots(&rules[..1], monday()).is_empty());
    }

    #[test]
    fn half_hour_start_and_partial_last_hour() {
        let rules = [rule("Segunda", "09:30", "11:45", true)];
        assert_eq!(hourly_slots(&rules, monday()), vec!["09:30", "10:30", "11:30"]);
    }

    #[test]
    fn late_evening_does_not_wrap() {
        let rules = [rule("Segunda", "22:00", "23:59", true)];
        assert_eq!(hourly_slots(&rules, monday()), vec!["22:00", "23:00"]);
    }

    #[test]
    fn malformed_or_inverted_hours_yield_nothing() {
        assert!(hourly_slots(&[rule("Segunda", "nove", "12:00", true)], monday()).is_empty());
        assert!(hourly_slots(&[rule("Segunda", "12:00", "09:00", true)], monday()).is_empty());
    }

    #[test]
    fn seconds_are_accepted() {
        let rules = [rule("Segunda", "09:00:00", "11:00:00", true)];
        assert_eq!(hourly_slots(&rules, monday()), vec!["09:00", "10:00"]);
    }

    #[test]
    fn diacritics_normalize() {
        assert_eq!(normalize_day("Terça"), "terca");
        assert_eq!(normalize_day("terca"), "terca");
        assert_eq!(normalize_day("SÁBADO"), "sabado");
        // decomposed "Terc\u{0327}a"
        assert_eq!(normalize_day("Terc\u{0327}a"), "terca");
        let tuesday = NaiveDate::from_ymd_opt(2025, 3, 11).unwrap();
        let rules = [rule("Terça", "10:00", "11:00", true)];
        assert_eq!(hourly_slots(&rules, tuesday), vec!["10:00"]);
    }

    #[test]
    fn bookable_days_follow_available_rules() {
        let rules = [
            rule("Segunda", "09:00", "12:00", true),
            rule("Sábado", "09:00", "12:00", true),
            rule("Domingo", "09:00", "12:00", false),
        ];
        let days = available_days(&rules);
        assert_eq!(days, vec!["sabado", "segunda"]);
        assert!(is_bookable(monday(), &days));
        let saturday = NaiveDate::from_ymd_opt(2025, 3, 15).unwrap();
        let sunday = NaiveDate::from_ymd_opt(2025, 3, 16).unwrap();
        assert!(is_bookable(saturday, &days));
        assert!(!is_bookable(sunday, &days));
    }

    #[test]
    fn available_days_drop_scattered_duplicates() {
        let rules = [
            rule("Segunda", "09:00", "12:00", true),
            rule("Terça", "09:00", "12:00", true),
            rule("segunda", "14:00", "18:00", true),
            rule("Terca", "14:00", "18:00", true),
        ];
        assert_eq!(available_days(&rules), vec!["segunda", "terca"]);
    }

    #[test]
    fn slot_becomes_utc_instant() {
        let brt = FixedOffset::west_opt(3 * 3600).unwrap();
        let at = slot_datetime(monday(), "09:00", &brt).unwrap();
        assert_eq!(at.to_rfc3339(), "2025-03-10T12:00:00+00:00");
        assert_eq!(slot_datetime(monday(), "25:00", &Utc), None);
    }

    #[test]
    fn rules_sort_monday_first() {
        let mut rules = vec![
            rule("Domingo", "09:00", "10:00", true),
            rule("Feriado", "09:00", "10:00", true),
            rule("Quarta", "09:00", "10:00", true),
            rule("Segunda", "09:00", "10:00", true),
            rule("Terça", "09:00", "10:00", true),
        ];
        sort_by_weekday(&mut rules);
        let order: Vec<&str> = rules.iter().map(|r| r.dia_semana.as_str()).collect();
        assert_eq!(order, vec!["Segunda", "Terça", "Quarta", "Domingo", "Feriado"]);
    }
}
