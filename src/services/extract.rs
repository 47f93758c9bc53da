use chrono::{Datelike, Days, NaiveDate, Weekday};
use once_cell::sync::Lazy;
use regex::Regex;

pub const DATE_SENTINEL: &str = "Data a confirmar";
pub const TIME_SENTINEL: &str = "Horario a confirmar";
pub const SERVICE_SENTINEL: &str = "Servico a confirmar";

static DATE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d{1,2})/(\d{1,2})").unwrap());
static TIME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d{1,2})[h:]").unwrap());

#[derive(Debug, Clone, Copy)]
enum DayRef {
    Today,
    Tomorrow,
    Next(Weekday),
}

// Scanned in this order; first keyword found as a substring wins.
const DAY_KEYWORDS: &[(&str, DayRef)] = &[
    ("amanha", DayRef::Tomorrow),
    ("hoje", DayRef::Today),
    ("segunda", DayRef::Next(Weekday::Mon)),
    ("terca", DayRef::Next(Weekday::Tue)),
    ("quarta", DayRef::Next(Weekday::Wed)),
    ("quinta", DayRef::Next(Weekday::Thu)),
    ("sexta", DayRef::Next(Weekday::Fri)),
    ("sabado", DayRef::Next(Weekday::Sat)),
];

const SERVICE_KEYWORDS: &[(&str, &str)] = &[
    ("manicure", "Manicure"),
    ("pedicure", "Pedicure"),
    ("alongamento", "Alongamento"),
    ("spa", "Spa dos pes"),
];

/// The three fields pulled out of a booking-details message. Missing fields
/// hold their sentinel placeholder, never an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingFields {
    pub date: String,
    pub time: String,
    pub service: String,
}

/// Extract date, time and service from the original (non-normalized)
/// message text. Each field is independent and order-insensitive.
pub fn extract_fields(message: &str, today: NaiveDate) -> BookingFields {
    BookingFields {
        date: extract_date(message, today),
        time: extract_time(message),
        service: extract_service(message),
    }
}

fn extract_date(message: &str, today: NaiveDate) -> String {
    if let Some(caps) = DATE_RE.captures(message) {
        let day: u32 = caps[1].parse().unwrap_or(0);
        let month: u32 = caps[2].parse().unwrap_or(0);
        return match resolve_day_month(day, month, today) {
            Some(date) => format_date(date),
            None => DATE_SENTINEL.to_string(),
        };
    }

    let lowered = message.to_lowercase();
    for (keyword, day_ref) in DAY_KEYWORDS {
        if lowered.contains(keyword) {
            let date = match day_ref {
                DayRef::Today => today,
                DayRef::Tomorrow => today + Days::new(1),
                DayRef::Next(weekday) => next_weekday(today, *weekday),
            };
            return format_date(date);
        }
    }

    DATE_SENTINEL.to_string()
}

/// Resolve a day/month token to the current year, rolling to the next year
/// when that date has already passed. Invalid day/month pairs resolve to
/// nothing and the caller falls back to the sentinel.
fn resolve_day_month(day: u32, month: u32, today: NaiveDate) -> Option<NaiveDate> {
    if let Some(date) = NaiveDate::from_ymd_opt(today.year(), month, day) {
        if date >= today {
            return Some(date);
        }
    }
    NaiveDate::from_ymd_opt(today.year() + 1, month, day)
}

/// Closest occurrence of `weekday` strictly after `today`: asking for
/// today's own weekday lands a full week out.
fn next_weekday(today: NaiveDate, weekday: Weekday) -> NaiveDate {
    let mut ahead = (weekday.num_days_from_monday() + 7
        - today.weekday().num_days_from_monday())
        % 7;
    if ahead == 0 {
        ahead = 7;
    }
    today + Days::new(u64::from(ahead))
}

fn format_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

fn extract_time(message: &str) -> String {
    match TIME_RE.captures(message) {
        Some(caps) => format!("{}:00", &caps[1]),
        None => TIME_SENTINEL.to_string(),
    }
}

fn extract_service(message: &str) -> String {
    let lowered = message.to_lowercase();
    for (keyword, service) in SERVICE_KEYWORDS {
        if lowered.contains(keyword) {
            return (*service).to_string();
        }
    }

    // Unknown service: take whatever follows the last "-" in the message.
    if let Some(idx) = message.rfind('-') {
        let rest = message[idx + 1..].trim();
        if !rest.is_empty() {
            return rest.to_string();
        }
    }

    SERVICE_SENTINEL.to_string()
}
