//! Turns the show-time strings scrapers emit into canonical
//! `YYYY-MM-DDTHH:MM` entries.
//!
//! Structured input (a list) is trusted and passed through. Free text is
//! matched against the known cinema formats in order; the first match wins.
//! Only the `"13 de setembro | quarta-feira | 19h"` form carries its own day
//! and month, every other form is anchored to `today`.

use std::sync::LazyLock;

use jiff::civil::Date;
use regex::{Captures, Regex};

use crate::models::{ShowTime, TimeInput};

const HORARIOS_PREFIX: &str = "\n\n\nHorários: ";

static HORARIOS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2})(?:[:h](\d{2}))?h?").expect("valid regex"));

static DAY_MONTH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,2}) de (\p{L}+) \| [\p{L}-]+ \| (\d{1,2})h?(\d{2})?$").expect("valid regex")
});

static BARE_HOUR_MINUTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{2})h(\d{1,2})$").expect("valid regex"));

static SLASH_ELEMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2})h(\d{2})?$").expect("valid regex"));

static HOUR_ONLY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2})h$").expect("valid regex"));

const MONTHS: [&str; 12] = [
    "janeiro",
    "fevereiro",
    "março",
    "abril",
    "maio",
    "junho",
    "julho",
    "agosto",
    "setembro",
    "outubro",
    "novembro",
    "dezembro",
];

/// `None` means the text matched no known format, which is not the same as
/// an empty list (no showings at all).
pub fn parse(input: &TimeInput, today: Date) -> Option<Vec<String>> {
    match input {
        TimeInput::List(entries) => Some(entries.clone()),
        TimeInput::Text(text) => parse_text(text, today),
    }
}

pub fn parse_text(input: &str, today: Date) -> Option<Vec<String>> {
    parse_show_times(input, today)
        .map(|times| times.into_iter().map(|t| t.to_string()).collect())
}

fn parse_show_times(input: &str, today: Date) -> Option<Vec<ShowTime>> {
    if input.trim().is_empty() {
        return Some(Vec::new());
    }

    if let Some(rest) = input.strip_prefix(HORARIOS_PREFIX) {
        let caps = HORARIOS.captures(rest)?;
        return clock(&caps, 1, 2).map(|(h, m)| vec![ShowTime::new(today, h, m)]);
    }

    let text = input.trim();

    if let Some(show_time) = parse_day_month(text, today) {
        return Some(vec![show_time]);
    }

    // One "DD de Month | weekday | time" per line.
    if text.contains('\n') {
        let lines: Option<Vec<ShowTime>> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| parse_day_month(line, today))
            .collect();
        if let Some(lines) = lines {
            return Some(lines);
        }
    }

    if let Some(caps) = BARE_HOUR_MINUTE.captures(text) {
        return clock(&caps, 1, 2).map(|(h, m)| vec![ShowTime::new(today, h, m)]);
    }

    if text.contains('/') {
        return text
            .split('/')
            .map(|element| {
                let caps = SLASH_ELEMENT.captures(element.trim())?;
                clock(&caps, 1, 2).map(|(h, m)| ShowTime::new(today, h, m))
            })
            .collect();
    }

    if let Some(caps) = HOUR_ONLY.captures(text) {
        return clock(&caps, 1, 2).map(|(h, m)| vec![ShowTime::new(today, h, m)]);
    }

    None
}

fn parse_day_month(text: &str, today: Date) -> Option<ShowTime> {
    let caps = DAY_MONTH.captures(text)?;
    let day: i8 = caps[1].parse().ok()?;
    let month_name = caps[2].to_lowercase();
    let month = MONTHS.iter().position(|m| *m == month_name)? as i8 + 1;
    let date = Date::new(today.year(), month, day).ok()?;
    let (hour, minute) = clock(&caps, 3, 4)?;
    Some(ShowTime::new(date, hour, minute))
}

/// Reads hour and optional minute groups; minutes default to zero.
fn clock(caps: &Captures<'_>, hour_group: usize, minute_group: usize) -> Option<(u8, u8)> {
    let hour: u8 = caps.get(hour_group)?.as_str().parse().ok()?;
    let minute: u8 = match caps.get(minute_group) {
        Some(m) => m.as_str().parse().ok()?,
        None => 0,
    };
    (hour < 24 && minute < 60).then_some((hour, minute))
}

/// Converts canonical entries into show times, returning the first entry
/// that is not in `YYYY-MM-DDTHH:MM` form as the error.
pub fn to_show_times(entries: &[String]) -> Result<Vec<ShowTime>, String> {
    entries.iter().map(|entry| ShowTime::parse(entry).ok_or_else(|| entry.clone())).collect()
}
