//! Forward-only state machines for the CMR and billing pipelines.
//!
//! Everything here is pure: a current state and an action go in, a
//! [`Transition`] (next state, log entry to append, button theme) comes out.
//! Writing the result back into a trip is the store's job.
use super::config::CmrCfg;
use super::trip::{
    BillingPipeline, CmrPipeline, CmrStep, InvoiceStatus, PipelineStatus, TripStatus,
};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineKind {
    Cmr,
    Billing,
}

/// Colour tag handed to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Amber,
    Blue,
    Emerald,
    Purple,
    Red,
    Gray,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BillingState {
    Pending,
    Issued,
    WaitingPayment,
    Paid,
}

/// A log entry waiting to be appended. The store assigns its id and date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepEntry {
    pub label: String,
    pub status: PipelineStatus,
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition<S> {
    pub from: S,
    pub to: S,
    pub entry: StepEntry,
    pub theme: Theme,
    pub trip_status: Option<TripStatus>, // only set when billing reaches Paid
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BillingAction {
    Trigger,
    InvoiceSubmitted { invoice_id: String },
    EmailSent { payment_term_days: u32 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum BillingOutcome {
    /// Pending: collect the invoice payload before committing.
    OpenInvoiceForm,
    /// Issued: collect the email before committing.
    OpenEmailForm,
    Advanced(Transition<BillingState>),
    /// Terminal state, or a commit that does not belong to the current state.
    Ignored,
}

impl StepEntry {
    pub fn new(label: &str, status: PipelineStatus, value: Option<String>) -> Self {
        Self {
            label: label.into(),
            status,
            value,
        }
    }
}

impl CmrStep {
    pub fn next(self) -> Option<CmrStep> {
        match self {
            CmrStep::Drafting => Some(CmrStep::Uploaded),
            CmrStep::Uploaded => Some(CmrStep::SentToClient),
            CmrStep::SentToClient => Some(CmrStep::Received),
            CmrStep::Received => None,
        }
    }
    pub fn is_terminal(self) -> bool {
        self == CmrStep::Received
    }
    pub fn theme(self) -> Theme {
        match self {
            CmrStep::Drafting => Theme::Amber,
            CmrStep::Uploaded => Theme::Blue,
            CmrStep::SentToClient => Theme::Emerald,
            CmrStep::Received => Theme::Gray,
        }
    }
    /// Button caption on cards and in the detail header. `None` once terminal.
    pub fn action_label(self) -> Option<&'static str> {
        match self {
            CmrStep::Drafting => Some("Upload CMR"),
            CmrStep::Uploaded => Some("Send Email"),
            CmrStep::SentToClient => Some("Confirm"),
            CmrStep::Received => None,
        }
    }
    pub fn pill(self) -> (&'static str, Theme) {
        match self {
            CmrStep::Drafting => ("Upload", Theme::Amber),
            CmrStep::Uploaded => ("Send", Theme::Blue),
            CmrStep::SentToClient => ("Waiting", Theme::Purple),
            CmrStep::Received => ("Done", Theme::Emerald),
        }
    }
    pub fn coarse_status(self) -> PipelineStatus {
        match self {
            CmrStep::Drafting => PipelineStatus::Pending,
            CmrStep::Uploaded => PipelineStatus::Active,
            CmrStep::SentToClient => PipelineStatus::Warning,
            CmrStep::Received => PipelineStatus::Completed,
        }
    }
}

impl BillingState {
    pub fn is_terminal(self) -> bool {
        self == BillingState::Paid
    }
    pub fn theme(self) -> Theme {
        match self {
            BillingState::Pending => Theme::Blue,
            BillingState::Issued => Theme::Amber,
            BillingState::WaitingPayment => Theme::Emerald,
            BillingState::Paid => Theme::Gray,
        }
    }
    pub fn action_label(self) -> Option<&'static str> {
        match self {
            BillingState::Pending => Some("Create Invoice"),
            BillingState::Issued => Some("Send Payment"),
            BillingState::WaitingPayment => Some("Mark Paid"),
            BillingState::Paid => None,
        }
    }
    pub fn pill(self) -> (&'static str, Theme) {
        match self {
            BillingState::Pending => ("Create", Theme::Blue),
            BillingState::Issued => ("Send", Theme::Amber),
            BillingState::WaitingPayment => ("Waiting", Theme::Purple),
            BillingState::Paid => ("Paid", Theme::Emerald),
        }
    }
    pub fn invoice_status(self) -> Option<InvoiceStatus> {
        match self {
            BillingState::Pending => None,
            BillingState::Issued => Some(InvoiceStatus::Issued),
            BillingState::WaitingPayment => Some(InvoiceStatus::WaitingPayment),
            BillingState::Paid => Some(InvoiceStatus::Paid),
        }
    }
    pub fn coarse_status(self) -> PipelineStatus {
        match self {
            BillingState::Pending => PipelineStatus::Pending,
            BillingState::Issued => PipelineStatus::Active,
            BillingState::WaitingPayment => PipelineStatus::Warning,
            BillingState::Paid => PipelineStatus::Completed,
        }
    }
}

impl fmt::Display for BillingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BillingState::Pending => "PENDING",
            BillingState::Issued => "ISSUED",
            BillingState::WaitingPayment => "WAITING_PAYMENT",
            BillingState::Paid => "PAID",
        };
        f.write_str(label)
    }
}

impl CmrPipeline {
    /// Discrete document state as the views read it off a stored record.
    pub fn state(&self) -> CmrStep {
        if self.status == PipelineStatus::Completed {
            return CmrStep::Received;
        }
        match self.current_step {
            CmrStep::SentToClient => CmrStep::SentToClient,
            CmrStep::Received => CmrStep::Received,
            _ if self.status == PipelineStatus::Pending => CmrStep::Drafting,
            CmrStep::Drafting => CmrStep::Drafting,
            CmrStep::Uploaded => CmrStep::Uploaded,
        }
    }

    /// Writes a committed state back into the record.
    pub fn settle(&mut self, step: CmrStep) {
        self.current_step = step;
        self.status = step.coarse_status();
    }
}

impl BillingPipeline {
    pub fn state(&self) -> BillingState {
        if self.status == PipelineStatus::Completed {
            return BillingState::Paid;
        }
        match self.invoice_status {
            Some(InvoiceStatus::Paid) => BillingState::Paid,
            Some(InvoiceStatus::WaitingPayment) => BillingState::WaitingPayment,
            Some(InvoiceStatus::Issued) => BillingState::Issued,
            Some(InvoiceStatus::WaitingDocs) | None => BillingState::Pending,
        }
    }

    pub fn settle(&mut self, state: BillingState) {
        self.invoice_status = state.invoice_status();
        self.status = state.coarse_status();
    }
}

/// Single click on the CMR control. `None` from the terminal state.
pub fn advance_cmr(current: CmrStep, notes: &CmrCfg) -> Option<Transition<CmrStep>> {
    let to = current.next()?;
    let entry = match to {
        CmrStep::Uploaded => StepEntry::new(
            "Uploaded",
            PipelineStatus::Warning,
            Some(notes.upload_file.clone()),
        ),
        CmrStep::SentToClient => StepEntry::new(
            "Sent by email",
            PipelineStatus::Active,
            Some(notes.notify_address.clone()),
        ),
        CmrStep::Received => StepEntry::new(
            "Confirmed",
            PipelineStatus::Completed,
            Some(notes.confirmation_note.clone()),
        ),
        // next() never yields the initial state
        CmrStep::Drafting => return None,
    };

    Some(Transition {
        from: current,
        to,
        entry,
        theme: to.theme(),
        trip_status: None,
    })
}

pub fn advance_billing(
    current: BillingState,
    action: BillingAction,
    amount: f64,
    currency: &str,
) -> BillingOutcome {
    let (to, entry) = match (current, action) {
        (BillingState::Pending, BillingAction::Trigger) => return BillingOutcome::OpenInvoiceForm,
        (BillingState::Issued, BillingAction::Trigger) => return BillingOutcome::OpenEmailForm,
        (BillingState::Pending, BillingAction::InvoiceSubmitted { invoice_id }) => (
            BillingState::Issued,
            StepEntry::new("Invoice created", PipelineStatus::Active, Some(invoice_id)),
        ),
        (BillingState::Issued, BillingAction::EmailSent { payment_term_days }) => (
            BillingState::WaitingPayment,
            StepEntry::new(
                "Sent for payment",
                PipelineStatus::Warning,
                Some(format!("Term: {payment_term_days} days")),
            ),
        ),
        (BillingState::WaitingPayment, BillingAction::Trigger) => (
            BillingState::Paid,
            StepEntry::new(
                "Paid",
                PipelineStatus::Completed,
                Some(format!("{amount:.2} {currency}")),
            ),
        ),
        _ => return BillingOutcome::Ignored,
    };

    BillingOutcome::Advanced(Transition {
        from: current,
        to,
        entry,
        theme: to.theme(),
        trip_status: (to == BillingState::Paid).then_some(TripStatus::Completed),
    })
}

/// Text tone for a history row. Only the newest row is coloured.
pub fn step_tone(status: PipelineStatus, is_last: bool) -> Theme {
    if !is_last {
        return Theme::Gray;
    }
    match status {
        PipelineStatus::Completed => Theme::Emerald,
        PipelineStatus::Warning => Theme::Amber,
        PipelineStatus::Active => Theme::Blue,
        PipelineStatus::Blocked => Theme::Red,
        PipelineStatus::Pending => Theme::Gray,
    }
}
