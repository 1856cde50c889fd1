//! Weekly recurrence rules for repeating bookings.
//!
//! A rule is a list of weekday tokens separated by commas, semicolons or
//! spaces. English abbreviations and full names, Vietnamese day labels
//! (`T2`..`T7`, `CN`) and numbers (`1` = Monday .. `6` = Saturday, `0`/`7` =
//! Sunday) are all accepted.

use chrono::{Datelike, NaiveDate, Weekday};
use std::collections::BTreeSet;

use crate::domain::UnrecognizedValue;

/// Hard cap on generated occurrences; extra matching dates are dropped.
pub const MAX_OCCURRENCES: usize = 20;

const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurrenceRule {
    days: BTreeSet<u32>,
}

fn parse_token(token: &str) -> Option<Weekday> {
    let day = match token {
        "MON" | "MONDAY" | "T2" | "1" => Weekday::Mon,
        "TUE" | "TUESDAY" | "T3" | "2" => Weekday::Tue,
        "WED" | "WEDNESDAY" | "T4" | "3" => Weekday::Wed,
        "THU" | "THURSDAY" | "T5" | "4" => Weekday::Thu,
        "FRI" | "FRIDAY" | "T6" | "5" => Weekday::Fri,
        "SAT" | "SATURDAY" | "T7" | "6" => Weekday::Sat,
        "SUN" | "SUNDAY" | "CN" | "0" | "7" => Weekday::Sun,
        _ => return None,
    };
    Some(day)
}

impl RecurrenceRule {
    /// Parse a rule; unknown tokens are rejected rather than skipped.
    pub fn parse(rule: &str) -> Result<Self, UnrecognizedValue> {
        let mut days = BTreeSet::new();
        for raw in rule.split([',', ';', ' ']) {
            let token = raw.trim().to_ascii_uppercase();
            if token.is_empty() {
                continue;
            }
            let day = parse_token(&token).ok_or_else(|| UnrecognizedValue {
                field: "weekday",
                value: raw.trim().to_string(),
            })?;
            days.insert(day.num_days_from_monday());
        }

        if days.is_empty() {
            return Err(UnrecognizedValue {
                field: "recurrence rule",
                value: rule.to_string(),
            });
        }
        Ok(RecurrenceRule { days })
    }

    pub fn includes(&self, day: Weekday) -> bool {
        self.days.contains(&day.num_days_from_monday())
    }

    pub fn weekdays(&self) -> Vec<Weekday> {
        self.days
            .iter()
            .map(|d| WEEK[*d as usize])
            .collect()
    }

    /// Matching dates in `[from, to]` in calendar order, at most `cap` of them.
    pub fn expand(&self, from: NaiveDate, to: NaiveDate, cap: usize) -> Vec<NaiveDate> {
        from.iter_days()
            .take_while(|d| *d <= to)
            .filter(|d| self.includes(d.weekday()))
            .take(cap)
            .collect()
    }
}
