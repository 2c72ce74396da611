use std::fmt::Write as _;
use std::str::FromStr;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, instrument};
use utoipa::ToSchema;

use crate::error::LeaveError;
use crate::ledger::store::LedgerStore;
use crate::model::leave_request::{LeaveRecord, LeaveRequest, LeaveStatus, LeaveType};
use crate::utils::extractor;

/// Placeholder stored when a request carries no reason.
pub const NO_REASON: &str = "No reason provided";

/// Result of a successful submission.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SubmissionOutcome {
    #[schema(example = "REQ2")]
    pub request_id: String,
    #[schema(example = "annual")]
    pub leave_type: LeaveType,
    #[schema(example = 5)]
    pub days: u32,
    #[schema(example = "approved", value_type = String)]
    pub status: LeaveStatus,
    /// Balance before the submission, for balance-bearing types.
    #[schema(example = 14, nullable = true)]
    pub balance_before: Option<u32>,
    #[schema(example = 9, nullable = true)]
    pub balance_after: Option<u32>,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceEffect {
    Deducted(u32),
    Restored(u32),
    /// Approval recorded without deduction.
    InsufficientBalance,
    Unchanged,
}

/// Result of a status change.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StatusUpdateOutcome {
    #[schema(example = "REQ2")]
    pub request_id: String,
    #[schema(example = "pending manager approval", value_type = String)]
    pub previous_status: LeaveStatus,
    #[schema(example = "approved", value_type = String)]
    pub status: LeaveStatus,
    #[schema(value_type = Object, example = json!({"deducted": 2}))]
    pub balance_effect: BalanceEffect,
    pub message: String,
}

/// The only writer of the ledger.
///
/// Every operation validates its input before it takes the employee's lock
/// and mutates nothing when validation fails.
#[derive(Clone)]
pub struct LeaveEngine {
    store: Arc<LedgerStore>,
}

impl LeaveEngine {
    pub fn new(store: Arc<LedgerStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &LedgerStore {
        &self.store
    }

    /// Submits a leave request given as raw strings, the way both the HTTP
    /// form and the model hand it over.
    #[instrument(skip_all, fields(employee_id = %employee_id, leave_type = %leave_type))]
    pub fn submit(
        &self,
        employee_id: &str,
        leave_type: &str,
        start_date: &str,
        end_date: &str,
        reason: Option<&str>,
    ) -> Result<SubmissionOutcome, LeaveError> {
        if !self.store.contains(employee_id) {
            return Err(LeaveError::EmployeeNotFound(employee_id.to_string()));
        }
        let leave_type = parse_leave_type(leave_type)?;
        let start = parse_date(start_date)?;
        let end = parse_date(end_date)?;
        self.submit_validated(employee_id, leave_type, start, end, reason)
    }

    /// Submits an extracted request; type and start date must be present.
    pub fn submit_request(
        &self,
        employee_id: &str,
        request: &LeaveRequest,
    ) -> Result<SubmissionOutcome, LeaveError> {
        if !self.store.contains(employee_id) {
            return Err(LeaveError::EmployeeNotFound(employee_id.to_string()));
        }
        let (Some(leave_type), Some(start)) = (request.leave_type, request.start_date) else {
            return Err(LeaveError::MissingDetails(request.missing_fields()));
        };
        let end = request.end_date.unwrap_or(start);
        self.submit_validated(employee_id, leave_type, start, end, request.reason.as_deref())
    }

    /// Extracts a request from free text and submits it.
    pub fn submit_free_text(
        &self,
        employee_id: &str,
        text: &str,
    ) -> Result<SubmissionOutcome, LeaveError> {
        if !self.store.contains(employee_id) {
            return Err(LeaveError::EmployeeNotFound(employee_id.to_string()));
        }
        let request = extractor::extract(text);
        self.submit_request(employee_id, &request)
    }

    fn submit_validated(
        &self,
        employee_id: &str,
        leave_type: LeaveType,
        start: NaiveDate,
        end: NaiveDate,
        reason: Option<&str>,
    ) -> Result<SubmissionOutcome, LeaveError> {
        if start > end {
            return Err(LeaveError::EndBeforeStart {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        let days = day_count(start, end);
        let reason = match reason.map(str::trim) {
            Some(r) if !r.is_empty() => r.to_string(),
            _ => NO_REASON.to_string(),
        };

        let outcome = self.store.with_record_mut(employee_id, |record| {
            let request_id = record.next_request_id();
            let type_name = leave_type.to_string();

            let (status, balance_before, balance_after, message) = if leave_type
                .is_balance_bearing()
            {
                let balance = record.balances.get(&leave_type).copied().unwrap_or(0);
                if balance >= days {
                    let remaining = balance - days;
                    record.balances.insert(leave_type, remaining);
                    let message = format!(
                        "Current {type_name} leave balance: {balance} days. You have sufficient balance for this {days}-day request.\n\
                         Leave request automatically approved! Request ID: {request_id}. Status: {STATUS}. Remaining {type_name} balance: {remaining} days.",
                        STATUS = LeaveStatus::Approved,
                    );
                    (LeaveStatus::Approved, Some(balance), Some(remaining), message)
                } else {
                    let short = days - balance;
                    let message = format!(
                        "Current {type_name} leave balance: {balance} days. You have insufficient balance for this {days}-day request ({short} days short).\n\
                         Your request has been forwarded to your manager for special approval (Request ID: {request_id}). Status: {STATUS}.",
                        STATUS = LeaveStatus::PendingManagerApproval,
                    );
                    (
                        LeaveStatus::PendingManagerApproval,
                        Some(balance),
                        Some(balance),
                        message,
                    )
                }
            } else {
                let message = format!(
                    "Your leave request has been submitted (Request ID: {request_id}). Status: {STATUS}. You will be notified once your manager reviews it.",
                    STATUS = LeaveStatus::PendingManagerApproval,
                );
                (LeaveStatus::PendingManagerApproval, None, None, message)
            };

            record.history.push(LeaveRecord {
                request_id: request_id.clone(),
                leave_type,
                start_date: start,
                end_date: end,
                days,
                reason,
                charged: status.is_approved(),
                status: status.clone(),
            });

            SubmissionOutcome {
                request_id,
                leave_type,
                days,
                status,
                balance_before,
                balance_after,
                message,
            }
        })?;

        info!(
            request_id = %outcome.request_id,
            leave_type = %leave_type,
            days,
            status = %outcome.status,
            "Leave request recorded"
        );
        Ok(outcome)
    }

    /// Moves a request to `new_status`, adjusting the balance only when the
    /// request enters or leaves `approved`.
    #[instrument(skip_all, fields(employee_id = %employee_id, request_id = %request_id))]
    pub fn update_status(
        &self,
        employee_id: &str,
        request_id: &str,
        new_status: &str,
    ) -> Result<StatusUpdateOutcome, LeaveError> {
        let request_id = request_id.trim();
        let new_status = LeaveStatus::parse(new_status);

        let outcome = self.store.with_record_mut(employee_id, |record| {
            let Some(entry) = record
                .history
                .iter_mut()
                .find(|r| r.request_id.eq_ignore_ascii_case(request_id))
            else {
                return Err(LeaveError::RequestNotFound {
                    employee_id: employee_id.to_string(),
                    request_id: request_id.to_string(),
                });
            };

            let previous = entry.status.clone();
            let leave_type = entry.leave_type;
            let days = entry.days;

            let effect = if new_status.is_approved() && !previous.is_approved() {
                if leave_type.is_balance_bearing() {
                    let balance = record.balances.entry(leave_type).or_insert(0);
                    if *balance >= days {
                        *balance -= days;
                        entry.charged = true;
                        BalanceEffect::Deducted(days)
                    } else {
                        BalanceEffect::InsufficientBalance
                    }
                } else {
                    BalanceEffect::Unchanged
                }
            } else if previous.is_approved() && !new_status.is_approved() && entry.charged {
                *record.balances.entry(leave_type).or_insert(0) += days;
                entry.charged = false;
                BalanceEffect::Restored(days)
            } else {
                BalanceEffect::Unchanged
            };
            entry.status = new_status.clone();

            let id = entry.request_id.clone();
            let message = match effect {
                BalanceEffect::Deducted(d) => format!(
                    "Leave request {id} status updated from '{previous}' to '{new_status}'. {d} days deducted from {leave_type} leave balance."
                ),
                BalanceEffect::Restored(d) => format!(
                    "Leave request {id} status updated from '{previous}' to '{new_status}'. {d} days restored to {leave_type} leave balance."
                ),
                BalanceEffect::InsufficientBalance => format!(
                    "Warning: Insufficient balance for {leave_type} leave. Leave request {id} status updated from '{previous}' to '{new_status}' but balance not adjusted. Please review."
                ),
                BalanceEffect::Unchanged => format!(
                    "Leave request {id} status updated from '{previous}' to '{new_status}'."
                ),
            };

            Ok(StatusUpdateOutcome {
                request_id: id,
                previous_status: previous,
                status: new_status.clone(),
                balance_effect: effect,
                message,
            })
        })??;

        info!(
            request_id = %outcome.request_id,
            from = %outcome.previous_status,
            to = %outcome.status,
            effect = ?outcome.balance_effect,
            "Leave status updated"
        );
        Ok(outcome)
    }

    pub fn balance_report(&self, employee_id: &str) -> Result<String, LeaveError> {
        self.store.with_record(employee_id, |record| {
            let mut out = format!("Leave balance for {} (ID: {}):\n", record.name, record.id);
            for (leave_type, days) in &record.balances {
                let _ = writeln!(out, "- {} leave: {} days", leave_type.label(), days);
            }
            out
        })
    }

    pub fn history_report(&self, employee_id: &str) -> Result<String, LeaveError> {
        self.store.with_record(employee_id, |record| {
            if record.history.is_empty() {
                return format!("{} has no leave history.", record.name);
            }
            let mut out = format!("Leave history for {} (ID: {}):\n", record.name, record.id);
            for r in &record.history {
                let _ = writeln!(
                    out,
                    "- {} {} leave: {} to {} ({} days) - {}",
                    r.request_id,
                    r.leave_type.label(),
                    r.start_date,
                    r.end_date,
                    r.days,
                    r.status
                );
            }
            out
        })
    }
}

fn parse_leave_type(raw: &str) -> Result<LeaveType, LeaveError> {
    LeaveType::from_str(raw.trim()).map_err(|_| LeaveError::InvalidLeaveType(raw.to_string()))
}

fn parse_date(raw: &str) -> Result<NaiveDate, LeaveError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| LeaveError::InvalidDate(raw.to_string()))
}

/// Calendar days, both ends included.
pub fn day_count(start: NaiveDate, end: NaiveDate) -> u32 {
    ((end - start).num_days() + 1).max(0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::seed::demo_employees;
    use crate::model::employee::EmployeeRecord;

    fn engine() -> LeaveEngine {
        LeaveEngine::new(Arc::new(LedgerStore::new(demo_employees())))
    }

    fn balance(engine: &LeaveEngine, id: &str, t: LeaveType) -> u32 {
        engine.store().lookup(id).unwrap().balances[&t]
    }

    #[test]
    fn day_count_is_inclusive() {
        let start = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 3, 12).unwrap();
        assert_eq!(day_count(start, end), 3);
        assert_eq!(day_count(start, start), 1);
    }

    #[test]
    fn sufficient_balance_is_auto_approved() {
        let engine = engine();
        let out = engine
            .submit("E002", "sick", "2025-03-10", "2025-03-12", Some("flu"))
            .unwrap();
        assert_eq!(out.status, LeaveStatus::Approved);
        assert_eq!(out.days, 3);
        assert_eq!(out.request_id, "REQ1");
        assert_eq!(out.balance_before, Some(10));
        assert_eq!(out.balance_after, Some(7));
        assert_eq!(balance(&engine, "E002", LeaveType::Sick), 7);
        assert!(out.message.contains("automatically approved"));

        let record = engine.store().lookup("E002").unwrap();
        assert_eq!(record.history.len(), 1);
        assert_eq!(record.history[0].reason, "flu");
        assert!(record.history[0].charged);
    }

    #[test]
    fn shortfall_goes_to_manager_without_deduction() {
        let engine = engine();
        let out = engine
            .submit("E001", "Personal", "2025-04-01", "2025-04-05", None)
            .unwrap();
        assert_eq!(out.status, LeaveStatus::PendingManagerApproval);
        assert_eq!(balance(&engine, "E001", LeaveType::Personal), 3);
        assert!(out.message.contains("insufficient balance"));
        assert!(out.message.contains("2 days short"));
        assert!(out.message.contains("forwarded to your manager"));

        let record = engine.store().lookup("E001").unwrap();
        assert_eq!(record.history.last().unwrap().reason, NO_REASON);
        assert!(!record.history.last().unwrap().charged);
    }

    #[test]
    fn non_balance_types_never_touch_balances() {
        let engine = engine();
        let before = engine.store().lookup("E002").unwrap().balances;
        let out = engine
            .submit("E002", "maternity", "2025-05-01", "2025-07-23", None)
            .unwrap();
        assert_eq!(out.status, LeaveStatus::PendingManagerApproval);
        assert_eq!(out.balance_before, None);
        let after = engine.store().lookup("E002").unwrap().balances;
        assert_eq!(before, after);
        assert!(!after.contains_key(&LeaveType::Maternity));
    }

    #[test]
    fn validation_runs_in_order_and_mutates_nothing() {
        let engine = engine();
        assert!(matches!(
            engine.submit("E404", "holiday", "bad", "bad", None),
            Err(LeaveError::EmployeeNotFound(_))
        ));
        assert!(matches!(
            engine.submit("E001", "holiday", "bad", "bad", None),
            Err(LeaveError::InvalidLeaveType(_))
        ));
        assert!(matches!(
            engine.submit("E001", "annual", "03/10/2025", "2025-03-12", None),
            Err(LeaveError::InvalidDate(_))
        ));
        assert!(matches!(
            engine.submit("E001", "annual", "2025-03-12", "2025-03-10", None),
            Err(LeaveError::EndBeforeStart { .. })
        ));
        let record = engine.store().lookup("E001").unwrap();
        assert_eq!(record.history.len(), 1);
        assert_eq!(record.balances[&LeaveType::Annual], 14);
    }

    #[test]
    fn request_ids_follow_history_length() {
        let engine = engine();
        let first = engine
            .submit("E001", "sick", "2025-06-02", "2025-06-02", None)
            .unwrap();
        let second = engine
            .submit("E001", "bereavement", "2025-06-09", "2025-06-10", None)
            .unwrap();
        assert_eq!(first.request_id, "REQ2");
        assert_eq!(second.request_id, "REQ3");
    }

    #[test]
    fn approving_twice_deducts_once() {
        let engine = engine();
        let pending = engine
            .submit("E001", "personal", "2025-04-01", "2025-04-02", None)
            .unwrap();
        // 2 days fit in the balance of 3, so it was approved already; send it back first
        assert_eq!(pending.status, LeaveStatus::Approved);
        engine
            .update_status("E001", &pending.request_id, "pending manager approval")
            .unwrap();
        assert_eq!(balance(&engine, "E001", LeaveType::Personal), 3);

        let first = engine
            .update_status("E001", &pending.request_id, "approved")
            .unwrap();
        assert_eq!(first.balance_effect, BalanceEffect::Deducted(2));
        let second = engine
            .update_status("E001", &pending.request_id, "approved")
            .unwrap();
        assert_eq!(second.balance_effect, BalanceEffect::Unchanged);
        assert_eq!(balance(&engine, "E001", LeaveType::Personal), 1);
    }

    #[test]
    fn approve_then_reject_restores_exactly() {
        let engine = engine();
        let before = balance(&engine, "E001", LeaveType::Annual);
        let approved = engine
            .update_status("E001", "REQ1", "approved")
            .unwrap();
        assert_eq!(approved.balance_effect, BalanceEffect::Unchanged);

        let rejected = engine.update_status("E001", "REQ1", "rejected").unwrap();
        assert_eq!(rejected.balance_effect, BalanceEffect::Restored(5));
        assert_eq!(balance(&engine, "E001", LeaveType::Annual), before + 5);

        let again = engine.update_status("E001", "REQ1", "rejected").unwrap();
        assert_eq!(again.balance_effect, BalanceEffect::Unchanged);

        engine.update_status("E001", "REQ1", "approved").unwrap();
        assert_eq!(balance(&engine, "E001", LeaveType::Annual), before);
    }

    #[test]
    fn uncharged_approval_is_not_refunded() {
        let engine = engine();
        let out = engine
            .submit("E001", "personal", "2025-04-01", "2025-04-10", None)
            .unwrap();
        let approved = engine
            .update_status("E001", &out.request_id, "approved")
            .unwrap();
        assert_eq!(approved.balance_effect, BalanceEffect::InsufficientBalance);
        assert!(approved.message.starts_with("Warning"));
        assert_eq!(approved.status, LeaveStatus::Approved);

        let rejected = engine
            .update_status("E001", &out.request_id, "rejected")
            .unwrap();
        assert_eq!(rejected.balance_effect, BalanceEffect::Unchanged);
        assert_eq!(balance(&engine, "E001", LeaveType::Personal), 3);
    }

    #[test]
    fn update_status_of_unknown_request_or_employee() {
        let engine = engine();
        assert!(matches!(
            engine.update_status("E001", "REQ42", "approved"),
            Err(LeaveError::RequestNotFound { .. })
        ));
        assert!(matches!(
            engine.update_status("E404", "REQ1", "approved"),
            Err(LeaveError::EmployeeNotFound(_))
        ));
    }

    #[test]
    fn arbitrary_status_strings_are_kept() {
        let engine = engine();
        let out = engine.update_status("E001", "REQ1", "On Hold").unwrap();
        assert_eq!(out.status.to_string(), "On Hold");
        assert_eq!(out.balance_effect, BalanceEffect::Restored(5));
    }

    #[test]
    fn free_text_reports_missing_details() {
        let engine = engine();
        let err = engine
            .submit_free_text("E001", "I'd like some time off please")
            .unwrap_err();
        assert!(matches!(err, LeaveError::MissingDetails(ref f) if f == &vec!["leave type", "start date"]));

        let out = engine
            .submit_free_text("E002", "annual leave on 07/01/2025 because of a wedding")
            .unwrap();
        assert_eq!(out.days, 1);
        assert_eq!(out.status, LeaveStatus::Approved);
    }

    #[test]
    fn reports_render_balances_and_history() {
        let engine = engine();
        assert_eq!(
            engine.balance_report("E001").unwrap(),
            "Leave balance for Alice Smith (ID: E001):\n- Annual leave: 14 days\n- Sick leave: 7 days\n- Personal leave: 3 days\n"
        );
        assert_eq!(
            engine.history_report("E002").unwrap(),
            "Bob Johnson has no leave history."
        );
        assert_eq!(
            engine.history_report("E001").unwrap(),
            "Leave history for Alice Smith (ID: E001):\n- REQ1 Annual leave: 2025-02-10 to 2025-02-14 (5 days) - approved\n"
        );
    }

    #[test]
    fn missing_balance_entry_counts_as_zero() {
        let store = LedgerStore::new(vec![EmployeeRecord::new("E9", "Temp", "t@x", "s")]);
        let engine = LeaveEngine::new(Arc::new(store));
        let out = engine
            .submit("E9", "annual", "2025-01-01", "2025-01-01", None)
            .unwrap();
        assert_eq!(out.status, LeaveStatus::PendingManagerApproval);
        assert_eq!(out.balance_before, Some(0));
    }
}
