//! Best-effort extraction of a leave request from free text.
//!
//! Nothing here fails: anything that cannot be recognised is left unset so
//! the caller can ask for it.

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use strum::IntoEnumIterator;
use utoipa::ToSchema;

use crate::model::leave_request::{LeaveRequest, LeaveType};

static LEAVE_TYPE_RE: Lazy<Regex> = Lazy::new(|| {
    let names = LeaveType::names().join("|");
    Regex::new(&format!("(?i)({names})")).expect("leave type pattern is valid")
});

static DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\d{4}-\d{2}-\d{2}|\d{1,2}/\d{1,2}/\d{4}|\d{1,2}-\d{1,2}-\d{4}")
        .expect("date pattern is valid")
});

/// Tried in order; the first that matches wins.
static REASON_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)(?:reason|for|because):?\s+(.+?)(?:\.|\n|$)",
        r"(?i)(?:due to|as|since)\s+(.+?)(?:\.|\n|$)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("reason pattern is valid"))
    .collect()
});

static DURATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d+)\s+(days?|weeks?|months?)\b").expect("duration pattern is valid")
});

pub fn extract(text: &str) -> LeaveRequest {
    let leave_type = LEAVE_TYPE_RE
        .captures(text)
        .and_then(|c| c[1].parse::<LeaveType>().ok());

    let dates = extract_dates(text);
    let start_date = dates.first().copied();
    let end_date = dates.get(1).copied().or(start_date);

    LeaveRequest {
        leave_type,
        start_date,
        end_date,
        reason: extract_reason(text),
    }
}

/// Every recognisable date, normalised, in order of appearance.
pub fn extract_dates(text: &str) -> Vec<NaiveDate> {
    DATE_RE
        .find_iter(text)
        .filter_map(|m| normalize_date(m.as_str()))
        .collect()
}

fn normalize_date(raw: &str) -> Option<NaiveDate> {
    let parts: Vec<&str> = raw.split(['/', '-']).collect();
    let [a, b, c] = parts.as_slice() else {
        return None;
    };
    let (year, month, day) = if a.len() == 4 {
        (a.parse().ok()?, b.parse().ok()?, c.parse().ok()?)
    } else {
        (c.parse().ok()?, a.parse().ok()?, b.parse().ok()?)
    };
    NaiveDate::from_ymd_opt(year, month, day)
}

fn extract_reason(text: &str) -> Option<String> {
    REASON_RES.iter().find_map(|re| {
        re.captures(text)
            .map(|c| c[1].trim().to_string())
            .filter(|r| !r.is_empty())
    })
}

/// Softer signals that never fill a [`LeaveRequest`] but help phrase a
/// follow-up question.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct LeaveHints {
    /// Leave types suggested by wording such as "vacation" or "funeral".
    pub keyword_types: Vec<LeaveType>,
    /// Relative expressions resolved against today.
    #[schema(value_type = Object, example = json!({"tomorrow": "2025-06-02"}))]
    pub relative_dates: BTreeMap<String, NaiveDate>,
    /// Duration phrases such as "3 days".
    #[schema(example = json!(["3 days"]))]
    pub durations: Vec<String>,
}

impl LeaveHints {
    pub fn is_empty(&self) -> bool {
        self.keyword_types.is_empty() && self.relative_dates.is_empty() && self.durations.is_empty()
    }

    /// One-line summary appended to follow-up prompts.
    pub fn summary(&self) -> Option<String> {
        if self.is_empty() {
            return None;
        }
        let mut parts = Vec::new();
        if !self.keyword_types.is_empty() {
            let types: Vec<String> = self.keyword_types.iter().map(|t| t.to_string()).collect();
            parts.push(format!("possible leave type: {}", types.join(" or ")));
        }
        for (phrase, date) in &self.relative_dates {
            parts.push(format!("\"{phrase}\" = {date}"));
        }
        if !self.durations.is_empty() {
            parts.push(format!("duration mentioned: {}", self.durations.join(", ")));
        }
        Some(format!("Hints: {}.", parts.join("; ")))
    }
}

fn keywords(leave_type: LeaveType) -> &'static [&'static str] {
    match leave_type {
        LeaveType::Annual => &["annual", "vacation", "holiday", "time off", "days off", "break"],
        LeaveType::Sick => &["sick", "ill", "illness", "doctor", "medical", "health", "unwell"],
        LeaveType::Personal => &["personal", "errands", "appointments", "matters", "affairs"],
        LeaveType::Bereavement => &["bereavement", "funeral", "death", "passed away", "loss"],
        LeaveType::Maternity => &["maternity", "baby", "childbirth", "pregnancy", "pregnant"],
        LeaveType::Paternity => &["paternity", "baby", "childbirth", "new father", "new child"],
    }
}

const RELATIVE_EXPRESSIONS: [(&str, u64); 3] =
    [("tomorrow", 1), ("next week", 7), ("next month", 30)];

pub fn detect_hints(text: &str, today: NaiveDate) -> LeaveHints {
    let lower = text.to_lowercase();

    let keyword_types = LeaveType::iter()
        .filter(|t| keywords(*t).iter().any(|k| lower.contains(k)))
        .collect();

    let relative_dates = RELATIVE_EXPRESSIONS
        .iter()
        .filter(|(phrase, _)| lower.contains(phrase))
        .filter_map(|(phrase, offset)| {
            today
                .checked_add_days(Days::new(*offset))
                .map(|d| (phrase.to_string(), d))
        })
        .collect();

    let durations = DURATION_RE
        .captures_iter(&lower)
        .map(|c| format!("{} {}", &c[1], &c[2]))
        .collect();

    LeaveHints {
        keyword_types,
        relative_dates,
        durations,
    }
}
