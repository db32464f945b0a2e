//! Derives the task/alert inbox from the current trip set.
//!
//! The list is never stored. It is rebuilt in full from the trips every time
//! they change, so two derivations over the same trips are equal.
use super::trip::{CmrStep, InvoiceStatus, PipelineStatus, Trip};
use chrono::NaiveDate;

// Declaration order is the sort order of the inbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Critical,
    Warning,
    Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    Cmr,
    Billing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskFilter {
    #[default]
    All,
    Documents,
    Financial,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskItem {
    pub id: String,
    pub trip_id: String, // route id, e.g. "FL-789012"
    pub client_name: String,
    pub kind: TaskKind,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    pub action_label: String,
    pub date: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TaskList {
    items: Vec<TaskItem>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TaskSummary {
    pub critical: usize,
    pub warning: usize,
    pub info: usize,
}

// What a rule produces before it is attached to a trip.
struct Rule {
    id_prefix: &'static str,
    severity: Severity,
    title: &'static str,
    description: String,
    action_label: &'static str,
}

fn cmr_rule(trip: &Trip) -> Option<Rule> {
    let cmr = &trip.cmr;
    match (cmr.status, cmr.current_step) {
        (PipelineStatus::Completed, _) => None,
        (PipelineStatus::Pending, _) | (_, CmrStep::Drafting) => Some(Rule {
            id_prefix: "cmr",
            severity: Severity::Critical,
            title: "Missing Documentation",
            description: "CMR document scan is required to proceed.".into(),
            action_label: "Upload Scan",
        }),
        (_, CmrStep::SentToClient) => Some(Rule {
            id_prefix: "cmr-conf",
            severity: Severity::Info,
            title: "Pending Client Signature",
            description: "Documents sent. Waiting for client confirmation.".into(),
            action_label: "Check Status",
        }),
        (_, CmrStep::Uploaded | CmrStep::Received) => None,
    }
}

// First match wins. Blocked/waiting-docs outranks an issued invoice, which
// outranks a plain pending review.
fn billing_rule(trip: &Trip) -> Option<Rule> {
    let billing = &trip.billing;
    match (billing.status, billing.invoice_status) {
        (PipelineStatus::Completed, _) => None,
        (PipelineStatus::Blocked, _) | (_, Some(InvoiceStatus::WaitingDocs)) => Some(Rule {
            id_prefix: "bill-create",
            severity: Severity::Warning,
            title: "Ready for Invoicing",
            description: "All transport docs verified. Issue invoice now.".into(),
            action_label: "Create Invoice",
        }),
        (_, Some(InvoiceStatus::Issued)) => Some(Rule {
            id_prefix: "bill-send",
            severity: Severity::Warning,
            title: "Invoice Not Sent",
            description: format!(
                "Invoice {} generated but not emailed.",
                billing.invoice_id.as_deref().unwrap_or("(unnumbered)")
            ),
            action_label: "Send Email",
        }),
        (PipelineStatus::Pending, _) => Some(Rule {
            id_prefix: "bill-gen",
            severity: Severity::Info,
            title: "Billing Review",
            description: "Verify trip data before invoice generation.".into(),
            action_label: "Review Data",
        }),
        _ => None,
    }
}

fn emit(trip: &Trip, kind: TaskKind, rule: Rule, date: &str) -> TaskItem {
    TaskItem {
        id: format!("{}-{}", rule.id_prefix, trip.id),
        trip_id: trip.task.id.clone(),
        client_name: trip.client_name.clone(),
        kind,
        severity: rule.severity,
        title: rule.title.into(),
        description: rule.description,
        action_label: rule.action_label.into(),
        date: date.into(),
    }
}

/// Scans `trips` in order and returns the outstanding items, most severe
/// first. `date` is the label stamped on every item.
pub fn derive_tasks(trips: &[Trip], date: &str) -> TaskList {
    let mut items = Vec::new();

    for trip in trips {
        if let Some(rule) = cmr_rule(trip) {
            items.push(emit(trip, TaskKind::Cmr, rule, date));
        }
        if let Some(rule) = billing_rule(trip) {
            items.push(emit(trip, TaskKind::Billing, rule, date));
        }
    }

    // stable: ties keep scan order, CMR before billing
    items.sort_by_key(|item| item.severity);

    TaskList { items }
}

/// Day/month label in the form the inbox shows, e.g. "04/02".
pub fn date_label(day: NaiveDate) -> String {
    day.format("%d/%m").to_string()
}

impl TaskList {
    pub fn items(&self) -> &[TaskItem] {
        &self.items
    }
    pub fn len(&self) -> usize {
        self.items.len()
    }
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
    /// Nothing outstanding. Views show the "all systems operational" panel.
    pub fn is_all_clear(&self) -> bool {
        self.is_empty()
    }
    pub fn summary(&self) -> TaskSummary {
        let mut summary = TaskSummary::default();
        for item in &self.items {
            match item.severity {
                Severity::Critical => summary.critical += 1,
                Severity::Warning => summary.warning += 1,
                Severity::Info => summary.info += 1,
            }
        }
        summary
    }
    pub fn filtered(&self, filter: TaskFilter) -> Vec<&TaskItem> {
        self.items
            .iter()
            .filter(|item| match filter {
                TaskFilter::All => true,
                TaskFilter::Documents => item.kind == TaskKind::Cmr,
                TaskFilter::Financial => item.kind == TaskKind::Billing,
            })
            .collect()
    }
}
