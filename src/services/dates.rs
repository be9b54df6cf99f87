// src/services/dates.rs

//! Locale-specific date normalization.
//!
//! The source page renders dates as day, abbreviated Norwegian month name,
//! and 4-digit year ("12. jan. 2025"). Anything that does not match falls
//! back to the ingestion-run timestamp so every record stays sortable.

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;

/// Abbreviated month names in Bokmål order.
const MONTHS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "mai", "jun", "jul", "aug", "sep", "okt", "nov", "des",
];

/// Parses date strings from the source page into absolute timestamps.
pub struct DateNormalizer {
    run_started_at: DateTime<Utc>,
    pattern: Regex,
}

impl DateNormalizer {
    /// Create a normalizer anchored to the current run's start time.
    pub fn new(run_started_at: DateTime<Utc>) -> Self {
        // Dots after day and month are optional: "1. mai 2025" has none
        let pattern =
            Regex::new(r"^(\d{1,2})\.?\s*(\p{L}+)\.?\s*(\d{4})$").expect("date pattern compiles");
        Self {
            run_started_at,
            pattern,
        }
    }

    /// Parse `text`, returning the run start time on any failure.
    pub fn normalize(&self, text: &str) -> DateTime<Utc> {
        self.parse(text).unwrap_or(self.run_started_at)
    }

    fn parse(&self, text: &str) -> Option<DateTime<Utc>> {
        let caps = self.pattern.captures(text.trim())?;
        let day: u32 = caps[1].parse().ok()?;
        let month = month_number(&caps[2])?;
        let year: i32 = caps[3].parse().ok()?;

        let date = NaiveDate::from_ymd_opt(year, month, day)?;
        Some(date.and_hms_opt(0, 0, 0)?.and_utc())
    }
}

fn month_number(token: &str) -> Option<u32> {
    let token = token.to_lowercase();
    MONTHS
        .iter()
        .position(|month| *month == token)
        .map(|index| index as u32 + 1)
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, TimeZone};

    use super::*;

    fn normalizer() -> DateNormalizer {
        DateNormalizer::new(Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap())
    }

    #[test]
    fn parses_standard_form() {
        let ts = normalizer().normalize("12. jan. 2025");
        assert_eq!((ts.year(), ts.month(), ts.day()), (2025, 1, 12));
    }

    #[test]
    fn parses_month_without_dot() {
        let ts = normalizer().normalize("1. mai 2025");
        assert_eq!((ts.year(), ts.month(), ts.day()), (2025, 5, 1));
    }

    #[test]
    fn parses_all_months_case_insensitively() {
        let n = normalizer();
        for (index, month) in MONTHS.iter().enumerate() {
            let upper = month.to_uppercase();
            let ts = n.normalize(&format!("3. {upper}. 2024"));
            assert_eq!(ts.month(), index as u32 + 1, "month {month}");
        }
    }

    #[test]
    fn falls_back_on_unknown_month() {
        let n = normalizer();
        assert_eq!(n.normalize("12. januar. 2025"), n.run_started_at);
        assert_eq!(n.normalize("12. xyz. 2025"), n.run_started_at);
    }

    #[test]
    fn falls_back_on_impossible_date() {
        let n = normalizer();
        assert_eq!(n.normalize("31. feb. 2025"), n.run_started_at);
    }

    #[test]
    fn falls_back_on_garbage() {
        let n = normalizer();
        assert_eq!(n.normalize(""), n.run_started_at);
        assert_eq!(n.normalize("yesterday"), n.run_started_at);
        assert_eq!(n.normalize("2025-01-12"), n.run_started_at);
    }
}
