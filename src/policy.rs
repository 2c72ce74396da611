use std::fmt::Write as _;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::Serialize;
use utoipa::ToSchema;

use crate::model::leave_request::LeaveType;

/// Policy text per leave type, in catalog order.
const POLICIES: [(LeaveType, &str); 6] = [
    (
        LeaveType::Annual,
        "Annual leave requires at least 2 weeks advance notice for periods longer than 3 days. Maximum consecutive days is 15.",
    ),
    (
        LeaveType::Sick,
        "Sick leave can be taken as needed with notification to manager. Doctor's note required for absences longer than 3 consecutive days.",
    ),
    (
        LeaveType::Personal,
        "Personal leave requires 3 days advance notice. Maximum 3 days per year.",
    ),
    (
        LeaveType::Bereavement,
        "Up to 5 days for immediate family members, 2 days for extended family.",
    ),
    (
        LeaveType::Maternity,
        "12 weeks of paid leave available after 1 year of employment.",
    ),
    (
        LeaveType::Paternity,
        "4 weeks of paid leave available after 1 year of employment.",
    ),
];

const HOLIDAYS: [((i32, u32, u32), &str); 5] = [
    ((2025, 5, 26), "Memorial Day"),
    ((2025, 7, 4), "Independence Day"),
    ((2025, 9, 1), "Labor Day"),
    ((2025, 11, 27), "Thanksgiving"),
    ((2025, 12, 25), "Christmas"),
];

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Holiday {
    #[schema(example = "2025-07-04", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = "Independence Day")]
    pub name: &'static str,
}

/// Static leave policies and company holidays.
#[derive(Debug, Clone, Copy, Default)]
pub struct PolicyCatalog;

impl PolicyCatalog {
    pub fn policy(&self, leave_type: LeaveType) -> &'static str {
        POLICIES
            .iter()
            .find(|(t, _)| *t == leave_type)
            .map(|(_, text)| *text)
            .unwrap_or_default()
    }

    /// The single policy for a recognised type, otherwise every policy.
    pub fn policy_text(&self, leave_type: Option<&str>) -> String {
        if let Some(t) = leave_type.and_then(|t| LeaveType::from_str(t.trim()).ok()) {
            return format!("{} Leave Policy: {}", t.label(), self.policy(t));
        }
        let mut out = String::from("Leave Policies:\n");
        for (t, text) in POLICIES {
            let _ = write!(out, "- {} Leave: {}\n\n", t.label(), text);
        }
        out
    }

    /// Declared order; no filtering by today's date.
    pub fn holidays(&self) -> Vec<Holiday> {
        HOLIDAYS
            .iter()
            .filter_map(|((y, m, d), name)| {
                NaiveDate::from_ymd_opt(*y, *m, *d).map(|date| Holiday { date, name: *name })
            })
            .collect()
    }

    pub fn upcoming_holidays(&self) -> String {
        let mut out = String::from("Upcoming Holidays:\n");
        for h in self.holidays() {
            let _ = writeln!(out, "- {}: {}", h.date, h.name);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_policy_for_known_type() {
        let text = PolicyCatalog.policy_text(Some("SICK"));
        assert!(text.starts_with("Sick Leave Policy: Sick leave can be taken as needed"));
    }

    #[test]
    fn all_policies_when_type_missing_or_unknown() {
        for arg in [None, Some("sabbatical")] {
            let text = PolicyCatalog.policy_text(arg);
            assert!(text.starts_with("Leave Policies:\n- Annual Leave: "));
            assert_eq!(text.matches("\n\n").count(), 6);
            let annual = text.find("- Annual Leave").unwrap();
            let paternity = text.find("- Paternity Leave").unwrap();
            assert!(annual < paternity);
        }
    }

    #[test]
    fn holidays_in_declared_order() {
        let text = PolicyCatalog.upcoming_holidays();
        assert_eq!(
            text,
            "Upcoming Holidays:\n- 2025-05-26: Memorial Day\n- 2025-07-04: Independence Day\n- 2025-09-01: Labor Day\n- 2025-11-27: Thanksgiving\n- 2025-12-25: Christmas\n"
        );
    }
}
