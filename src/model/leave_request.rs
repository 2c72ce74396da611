use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};
use utoipa::ToSchema;

/// Status text of an auto-approved (or manually approved) request.
pub const STATUS_APPROVED: &str = "approved";
/// Status text of a request that waits for a manager.
pub const STATUS_PENDING: &str = "pending manager approval";

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    EnumString,
    EnumIter,
    Display,
    IntoStaticStr,
    ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LeaveType {
    Annual,
    Sick,
    Personal,
    Bereavement,
    Maternity,
    Paternity,
}

impl LeaveType {
    /// Annual, sick and personal leave are tracked against a day balance;
    /// everything else always goes to a manager.
    pub fn is_balance_bearing(&self) -> bool {
        matches!(self, LeaveType::Annual | LeaveType::Sick | LeaveType::Personal)
    }

    /// Capitalised form used in reports ("Annual").
    pub fn label(&self) -> &'static str {
        match self {
            LeaveType::Annual => "Annual",
            LeaveType::Sick => "Sick",
            LeaveType::Personal => "Personal",
            LeaveType::Bereavement => "Bereavement",
            LeaveType::Maternity => "Maternity",
            LeaveType::Paternity => "Paternity",
        }
    }

    pub fn names() -> Vec<&'static str> {
        LeaveType::iter().map(Into::into).collect()
    }
}

/// Status of a leave record.
///
/// Only `approved` carries balance semantics; updates may set any other
/// string and it is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaveStatus {
    Approved,
    PendingManagerApproval,
    Other(String),
}

impl LeaveStatus {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case(STATUS_APPROVED) {
            LeaveStatus::Approved
        } else if trimmed.eq_ignore_ascii_case(STATUS_PENDING) {
            LeaveStatus::PendingManagerApproval
        } else {
            LeaveStatus::Other(trimmed.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            LeaveStatus::Approved => STATUS_APPROVED,
            LeaveStatus::PendingManagerApproval => STATUS_PENDING,
            LeaveStatus::Other(s) => s,
        }
    }

    pub fn is_approved(&self) -> bool {
        matches!(self, LeaveStatus::Approved)
    }
}

impl fmt::Display for LeaveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for LeaveStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for LeaveStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(LeaveStatus::parse(&raw))
    }
}

/// One entry of an employee's leave history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LeaveRecord {
    #[schema(example = "REQ2")]
    pub request_id: String,
    #[schema(example = "annual")]
    pub leave_type: LeaveType,
    #[schema(example = "2025-02-10", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2025-02-14", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    /// inclusive calendar days
    #[schema(example = 5)]
    pub days: u32,
    #[schema(example = "No reason provided")]
    pub reason: String,
    #[schema(example = "approved", value_type = String)]
    pub status: LeaveStatus,
    /// Whether `days` are currently deducted from the balance.
    #[serde(default)]
    #[schema(example = true)]
    pub charged: bool,
}

/// Best-effort structured form of a free-text leave request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LeaveRequest {
    #[schema(example = "sick", nullable = true)]
    pub leave_type: Option<LeaveType>,
    #[schema(example = "2025-06-01", format = "date", value_type = Option<String>)]
    pub start_date: Option<NaiveDate>,
    #[schema(example = "2025-06-03", format = "date", value_type = Option<String>)]
    pub end_date: Option<NaiveDate>,
    #[schema(example = "of a checkup", nullable = true)]
    pub reason: Option<String>,
}

impl LeaveRequest {
    /// Names of the fields that must be present before submission.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.leave_type.is_none() {
            missing.push("leave type");
        }
        if self.start_date.is_none() {
            missing.push("start date");
        }
        missing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn leave_type_parses_case_insensitively() {
        assert_eq!(LeaveType::from_str("Annual").unwrap(), LeaveType::Annual);
        assert_eq!(LeaveType::from_str("SICK").unwrap(), LeaveType::Sick);
        assert!(LeaveType::from_str("vacation").is_err());
        assert_eq!(LeaveType::Bereavement.to_string(), "bereavement");
    }

    #[test]
    fn only_three_types_bear_a_balance() {
        let bearing: Vec<_> = LeaveType::iter().filter(|t| t.is_balance_bearing()).collect();
        assert_eq!(
            bearing,
            vec![LeaveType::Annual, LeaveType::Sick, LeaveType::Personal]
        );
    }

    #[test]
    fn status_recognises_known_values_and_keeps_others() {
        assert_eq!(LeaveStatus::parse(" Approved "), LeaveStatus::Approved);
        assert_eq!(
            LeaveStatus::parse("pending manager approval"),
            LeaveStatus::PendingManagerApproval
        );
        assert_eq!(
            LeaveStatus::parse("rejected"),
            LeaveStatus::Other("rejected".into())
        );
        assert_eq!(LeaveStatus::Other("on hold".into()).to_string(), "on hold");
    }

    #[test]
    fn missing_fields_reports_type_and_start() {
        let req = LeaveRequest::default();
        assert_eq!(req.missing_fields(), vec!["leave type", "start date"]);
    }
}
