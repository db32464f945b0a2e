//! Session trip store: the single source of truth views read from and act on.
//!
//! Backed by a temporary sled database, so everything resets when the store
//! is dropped. Each public mutation loads the trip, applies the pure state
//! machine from [`crate::pipeline`] in memory, and writes the trip with its
//! activity and payload records in a single transaction before returning.
use super::activity::{ActivityItem, ActivityKind, ActivityStream};
use super::config::Config;
use super::email::EmailMessage;
use super::error::StoreError;
use super::invoice::InvoiceDraft;
use super::pipeline::{
    BillingAction, BillingOutcome, BillingState, PipelineKind, StepEntry, Transition,
    advance_billing, advance_cmr,
};
use super::seed;
use super::stats::{FooterStats, TripFilter, footer_stats};
use super::task::{TaskList, derive_tasks};
use super::trip::{CmrStep, PipelineStep, TimeStamp, Trip, TripStatus};
use super::utils::new_uuid_to_bech32;
use chrono::{Datelike, Utc};
use sled::Transactional;
use sled::Tree;
use sled::transaction::ConflictableTransactionError;
use tracing::{debug, info};

/// What the billing control did when clicked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BillingPrompt {
    /// Show the invoice form, then call [`TripStore::submit_invoice`].
    InvoiceForm,
    /// Show the email form, then call [`TripStore::send_invoice_email`].
    EmailForm,
    Advanced(PipelineStep),
    /// Nothing to do from the current state.
    Idle,
}

pub struct TripStore {
    db: sled::Db,
    trips: Tree,    // trip id -> trip
    order: Tree,    // insertion sequence -> trip id
    invoices: Tree, // invoice id -> payload digest
    payloads: Tree, // payload digest -> invoice draft
    outbox: Tree,   // message digest -> email
    activity: Tree, // trip id -> activity stream
    config: Config,
}

// Writes staged by one operation. `TripStore::apply` lands all of them or none.
struct Commit {
    trip_id: String,
    trip: Option<Trip>,
    activity: Vec<ActivityItem>,
    invoice: Option<(String, String, Vec<u8>)>, // invoice id, digest, draft cbor
    outbox: Option<(String, Vec<u8>)>,          // digest, email cbor
}

impl Commit {
    fn new(trip_id: &str) -> Self {
        Self {
            trip_id: trip_id.into(),
            trip: None,
            activity: vec![],
            invoice: None,
            outbox: None,
        }
    }
    fn with_trip(trip: Trip) -> Self {
        let mut commit = Self::new(&trip.id);
        commit.trip = Some(trip);
        commit
    }
}

impl TripStore {
    /// Empty store over a fresh session database.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let db = sled::Config::new().temporary(true).open()?;

        Ok(Self {
            trips: db.open_tree("trips")?,
            order: db.open_tree("order")?,
            invoices: db.open_tree("invoices")?,
            payloads: db.open_tree("payloads")?,
            outbox: db.open_tree("outbox")?,
            activity: db.open_tree("activity")?,
            db,
            config,
        })
    }

    /// Store loaded with the mock trips and activity stream.
    pub fn seeded(config: Config) -> anyhow::Result<Self> {
        let store = Self::new(config)?;
        for trip in seed::trips() {
            store.insert_trip(trip)?;
        }
        store
            .activity
            .insert(seed::STREAM_TRIP_ID.as_bytes(), minicbor::to_vec(seed::activity()?)?)?;

        Ok(store)
    }

    pub fn insert_trip(&self, trip: Trip) -> anyhow::Result<()> {
        if self.trips.contains_key(trip.id.as_bytes())? {
            return Err(StoreError::DuplicateTrip(trip.id).into());
        }
        let (revision, cbor) = trip.validate_and_finalise()?;
        let seq = self.order.len() as u64;

        (&self.trips, &self.order)
            .transaction(|(trips, order)| {
                trips.insert(trip.id.as_bytes(), cbor.as_slice())?;
                order.insert(&seq.to_be_bytes()[..], trip.id.as_bytes())?;
                Ok::<_, ConflictableTransactionError<sled::Error>>(())
            })?;
        info!(trip = %trip.id, client = %trip.client_name, %revision, "trip added");

        Ok(())
    }

    pub fn get_trip(&self, trip_id: &str) -> anyhow::Result<Trip> {
        let bytes = self
            .trips
            .get(trip_id.as_bytes())?
            .ok_or_else(|| StoreError::TripNotFound(trip_id.to_string()))?;

        Ok(minicbor::decode(&bytes)?)
    }

    /// Snapshot of every trip in insertion order.
    pub fn trips(&self) -> anyhow::Result<Vec<Trip>> {
        self.order
            .iter()
            .values()
            .map(|id| -> anyhow::Result<Trip> {
                let id = id?;
                self.get_trip(&String::from_utf8_lossy(&id))
            })
            .collect()
    }

    pub fn filtered(&self, filter: TripFilter) -> anyhow::Result<Vec<Trip>> {
        Ok(self
            .trips()?
            .into_iter()
            .filter(|trip| filter.admits(trip))
            .collect())
    }

    pub fn stats(&self, filter: TripFilter) -> anyhow::Result<FooterStats> {
        Ok(footer_stats(&self.filtered(filter)?))
    }

    /// Inbox derived from the current trips. `date` labels every item.
    pub fn tasks(&self, date: &str) -> anyhow::Result<TaskList> {
        Ok(derive_tasks(&self.trips()?, date))
    }

    /// Appends a log entry to one of the trip's pipelines.
    pub fn append_step(
        &self,
        trip_id: &str,
        kind: PipelineKind,
        entry: StepEntry,
    ) -> anyhow::Result<PipelineStep> {
        let mut trip = self.get_trip(trip_id)?;
        let step = push_entry(&mut trip, kind, entry)?;
        self.apply(Commit::with_trip(trip))?;

        Ok(step)
    }

    pub fn set_trip_status(&self, trip_id: &str, status: TripStatus) -> anyhow::Result<()> {
        let mut trip = self.get_trip(trip_id)?;
        trip.status = status;
        self.apply(Commit::with_trip(trip))?;
        info!(trip = %trip_id, %status, "trip status set");

        Ok(())
    }

    /// One click on the CMR control. `None` once the document is received.
    pub fn trigger_cmr(&self, trip_id: &str) -> anyhow::Result<Option<PipelineStep>> {
        let mut trip = self.get_trip(trip_id)?;
        let current = trip.cmr.state();

        let Some(transition) = advance_cmr(current, &self.config.cmr) else {
            debug!(trip = %trip_id, state = %current, "cmr action ignored in terminal state");
            return Ok(None);
        };

        let step = push_entry(&mut trip, PipelineKind::Cmr, transition.entry.clone())?;
        trip.cmr.settle(transition.to);
        trip.cmr.tag = cmr_tag(transition.to).map(Into::into);

        let mut commit = Commit::with_trip(trip);
        commit.activity.push(status_change(
            PipelineKind::Cmr,
            &transition.from,
            &transition.to,
            &transition.entry,
        )?);
        self.apply(commit)?;
        info!(trip = %trip_id, from = %transition.from, to = %transition.to, "cmr advanced");

        Ok(Some(step))
    }

    /// One click on the billing control.
    pub fn trigger_billing(&self, trip_id: &str) -> anyhow::Result<BillingPrompt> {
        let trip = self.get_trip(trip_id)?;
        let current = trip.billing.state();

        let outcome = advance_billing(
            current,
            BillingAction::Trigger,
            trip.billing.amount,
            &trip.billing.currency,
        );
        match outcome {
            BillingOutcome::OpenInvoiceForm => Ok(BillingPrompt::InvoiceForm),
            BillingOutcome::OpenEmailForm => Ok(BillingPrompt::EmailForm),
            BillingOutcome::Advanced(transition) => {
                let step = self.commit_billing(trip, transition, Commit::new(trip_id))?;
                Ok(BillingPrompt::Advanced(step))
            }
            BillingOutcome::Ignored => {
                debug!(trip = %trip_id, state = %current, "billing action ignored");
                Ok(BillingPrompt::Idle)
            }
        }
    }

    /// Commits the invoice form. Returns the generated invoice id, or `None`
    /// if the trip is already past invoicing.
    pub fn submit_invoice(
        &self,
        trip_id: &str,
        draft: &InvoiceDraft,
    ) -> anyhow::Result<Option<String>> {
        let mut trip = self.get_trip(trip_id)?;
        let current = trip.billing.state();
        if current != BillingState::Pending {
            debug!(trip = %trip_id, state = %current, "invoice submit ignored");
            return Ok(None);
        }
        let (digest, cbor) = draft.finalise()?;

        let invoice_id = self.next_invoice_id()?;
        let outcome = advance_billing(
            current,
            BillingAction::InvoiceSubmitted {
                invoice_id: invoice_id.clone(),
            },
            trip.billing.amount,
            &trip.billing.currency,
        );
        let BillingOutcome::Advanced(transition) = outcome else {
            return Ok(None);
        };

        trip.billing.invoice_id = Some(invoice_id.clone());
        let mut commit = Commit::new(trip_id);
        commit.invoice = Some((invoice_id.clone(), digest, cbor));
        self.commit_billing(trip, transition, commit)?;
        info!(trip = %trip_id, invoice = %invoice_id, totals = %draft.totals(), "invoice created");

        Ok(Some(invoice_id))
    }

    /// Commits the email form for an issued invoice.
    pub fn send_invoice_email(
        &self,
        trip_id: &str,
        email: &EmailMessage,
    ) -> anyhow::Result<Option<PipelineStep>> {
        let trip = self.get_trip(trip_id)?;
        let current = trip.billing.state();
        if current != BillingState::Issued {
            debug!(trip = %trip_id, state = %current, "email send ignored");
            return Ok(None);
        }

        let payment_term_days = match &trip.billing.invoice_id {
            Some(id) => self.invoice(id)?.and_then(|draft| draft.payment_term()),
            None => None,
        }
        .unwrap_or(self.config.billing.payment_term_days);

        let outcome = advance_billing(
            current,
            BillingAction::EmailSent { payment_term_days },
            trip.billing.amount,
            &trip.billing.currency,
        );
        let BillingOutcome::Advanced(transition) = outcome else {
            return Ok(None);
        };

        let mut commit = Commit::new(trip_id);
        commit.outbox = Some(email.build()?);
        commit.activity.push(
            ActivityItem::new(
                &new_uuid_to_bech32("act")?,
                ActivityKind::Email,
                TimeStamp::new(),
                &self.config.session.author,
                &email.subject,
            )
            .with_content(&email.body)
            .with_attachments(&email.attachments),
        );
        let step = self.commit_billing(trip, transition, commit)?;
        info!(trip = %trip_id, to = %email.recipient, "invoice emailed");

        Ok(Some(step))
    }

    /// Invoice payload submitted under `invoice_id`, if any.
    pub fn invoice(&self, invoice_id: &str) -> anyhow::Result<Option<InvoiceDraft>> {
        let Some(digest) = self.invoices.get(invoice_id.as_bytes())? else {
            return Ok(None);
        };
        match self.payloads.get(&digest)? {
            Some(cbor) => Ok(Some(minicbor::decode(&cbor)?)),
            None => Ok(None),
        }
    }

    pub fn outbox(&self) -> anyhow::Result<Vec<EmailMessage>> {
        self.outbox
            .iter()
            .values()
            .map(|cbor| -> anyhow::Result<EmailMessage> { Ok(minicbor::decode(&cbor?)?) })
            .collect()
    }

    pub fn activity(&self, trip_id: &str) -> anyhow::Result<ActivityStream> {
        match self.activity.get(trip_id.as_bytes())? {
            Some(cbor) => Ok(minicbor::decode(&cbor)?),
            None => Ok(ActivityStream::new()),
        }
    }

    pub fn add_activity(&self, trip_id: &str, item: ActivityItem) -> anyhow::Result<()> {
        // unknown trips have no stream
        self.get_trip(trip_id)?;

        let mut commit = Commit::new(trip_id);
        commit.activity.push(item);
        self.apply(commit)
    }

    // Pushes the step, settles the state and stages the status-change item on
    // top of whatever `commit` already carries, then applies it.
    fn commit_billing(
        &self,
        mut trip: Trip,
        transition: Transition<BillingState>,
        mut commit: Commit,
    ) -> anyhow::Result<PipelineStep> {
        let step = push_entry(&mut trip, PipelineKind::Billing, transition.entry.clone())?;
        trip.billing.settle(transition.to);
        if let Some(status) = transition.trip_status {
            trip.status = status;
        }

        let trip_id = trip.id.clone();
        commit.activity.push(status_change(
            PipelineKind::Billing,
            &transition.from,
            &transition.to,
            &transition.entry,
        )?);
        commit.trip = Some(trip);
        self.apply(commit)?;

        info!(trip = %trip_id, from = %transition.from, to = %transition.to, "billing advanced");
        if let Some(status) = transition.trip_status {
            info!(trip = %trip_id, %status, "trip status set");
        }

        Ok(step)
    }

    /// Encodes everything up front, then writes the trip, its activity stream
    /// and any invoice or outbox records in one transaction.
    fn apply(&self, commit: Commit) -> anyhow::Result<()> {
        let Commit {
            trip_id,
            trip,
            activity,
            invoice,
            outbox,
        } = commit;

        let revision = match &trip {
            Some(trip) => Some(trip.validate_and_finalise()?),
            None => None,
        };
        let stream = if activity.is_empty() {
            None
        } else {
            let mut stream = self.activity(&trip_id)?;
            for item in activity {
                stream.push(item);
            }
            Some(minicbor::to_vec(&stream)?)
        };

        (&self.trips, &self.activity, &self.invoices, &self.payloads, &self.outbox)
            .transaction(|(trips, activity, invoices, payloads, outbox_tree)| {
                if let Some((_, cbor)) = &revision {
                    trips.insert(trip_id.as_bytes(), cbor.as_slice())?;
                }
                if let Some(cbor) = &stream {
                    activity.insert(trip_id.as_bytes(), cbor.as_slice())?;
                }
                if let Some((invoice_id, digest, cbor)) = &invoice {
                    payloads.insert(digest.as_bytes(), cbor.as_slice())?;
                    invoices.insert(invoice_id.as_bytes(), digest.as_bytes())?;
                }
                if let Some((digest, cbor)) = &outbox {
                    outbox_tree.insert(digest.as_bytes(), cbor.as_slice())?;
                }
                Ok::<_, ConflictableTransactionError<sled::Error>>(())
            })?;

        if let Some((revision, _)) = revision {
            debug!(trip = %trip_id, %revision, "trip saved");
        }
        Ok(())
    }

    fn next_invoice_id(&self) -> anyhow::Result<String> {
        let seq = self.db.generate_id()?;
        Ok(format!(
            "{}-{}-{:04}",
            self.config.billing.invoice_prefix,
            Utc::now().year(),
            seq
        ))
    }
}

// Append-only: the only way history grows.
fn push_entry(trip: &mut Trip, kind: PipelineKind, entry: StepEntry) -> anyhow::Result<PipelineStep> {
    let step = PipelineStep {
        id: new_uuid_to_bech32("step")?,
        label: entry.label,
        status: entry.status,
        value: entry.value,
        date: Some(TimeStamp::new()),
    };
    match kind {
        PipelineKind::Cmr => trip.cmr.history.push(step.clone()),
        PipelineKind::Billing => trip.billing.history.push(step.clone()),
    }

    Ok(step)
}

fn status_change(
    kind: PipelineKind,
    from: &dyn std::fmt::Display,
    to: &dyn std::fmt::Display,
    entry: &StepEntry,
) -> anyhow::Result<ActivityItem> {
    let pipeline = match kind {
        PipelineKind::Cmr => "CMR",
        PipelineKind::Billing => "Billing",
    };
    Ok(ActivityItem::new(
        &new_uuid_to_bech32("act")?,
        ActivityKind::System,
        TimeStamp::new(),
        "System",
        &format!("Status change: {pipeline} {}", entry.label),
    )
    .with_content(&format!("Status changed from \"{from}\" to \"{to}\"")))
}

fn cmr_tag(step: CmrStep) -> Option<&'static str> {
    match step {
        CmrStep::Drafting => None,
        CmrStep::Uploaded => Some("UPLOADED"),
        CmrStep::SentToClient => Some("SENT BY EMAIL"),
        CmrStep::Received => Some("RECEIVED"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_trip_is_typed_error() {
        let store = TripStore::new(Config::default()).unwrap();
        let err = store.get_trip("nope").unwrap_err();

        assert_eq!(
            err.downcast_ref::<StoreError>(),
            Some(&StoreError::TripNotFound("nope".into()))
        );
    }

    #[test]
    fn duplicate_insert_is_rejected() {
        let store = TripStore::seeded(Config::default()).unwrap();
        let again = seed::trips().remove(0);

        let err = store.insert_trip(again).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StoreError>(),
            Some(StoreError::DuplicateTrip(_))
        ));
    }

    #[test]
    fn invalid_trip_is_not_stored() {
        let store = TripStore::new(Config::default()).unwrap();
        assert!(store.insert_trip(Trip::new("x", "No Route")).is_err());
        assert!(store.trips().unwrap().is_empty());
    }

    #[test]
    fn seeded_order_is_insertion_order() {
        let store = TripStore::seeded(Config::default()).unwrap();
        let ids: Vec<_> = store.trips().unwrap().into_iter().map(|t| t.id).collect();
        assert_eq!(ids, ["1", "2", "3"]);
    }

    #[test]
    fn append_step_only_grows_history() {
        let store = TripStore::seeded(Config::default()).unwrap();
        let before = store.get_trip("3").unwrap().billing.history;

        let entry = StepEntry::new("Note", crate::trip::PipelineStatus::Active, None);
        let step = store.append_step("3", PipelineKind::Billing, entry).unwrap();

        let after = store.get_trip("3").unwrap().billing.history;
        assert_eq!(after.len(), before.len() + 1);
        assert_eq!(after.last(), Some(&step));
        assert!(step.id.starts_with("step1"));
    }

    #[test]
    fn cmr_commit_logs_system_activity() {
        let store = TripStore::seeded(Config::default()).unwrap();
        let before = store.activity("3").unwrap().len();

        store.trigger_cmr("3").unwrap().unwrap();

        let stream = store.activity("3").unwrap();
        assert_eq!(stream.len(), before + 1);
        let last = stream.items().last().unwrap();
        assert_eq!(last.kind, ActivityKind::System);
        assert_eq!(last.title, "Status change: CMR Uploaded");
    }

    #[test]
    fn added_activity_lands_in_date_order() {
        let store = TripStore::seeded(Config::default()).unwrap();
        let date = TimeStamp::new_with(2024, 2, 3, 15, 0, 0).unwrap();
        let note = ActivityItem::new("late-note", ActivityKind::Note, date, "Me", "Pallets counted");

        store.add_activity("1", note).unwrap();

        let stream = store.activity("1").unwrap();
        let ids: Vec<_> = stream.items().iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, ["a6", "a5", "late-note", "a4", "a3", "a2", "a1"]);
    }

    // A trip that fails validation on write; nothing of a transition may land.
    fn store_with_broken_trip() -> TripStore {
        let store = TripStore::new(Config::default()).unwrap();
        let broken = Trip::new("bad", "No Route");
        store
            .trips
            .insert("bad".as_bytes(), minicbor::to_vec(&broken).unwrap())
            .unwrap();
        store
    }

    #[test]
    fn failed_cmr_commit_writes_nothing() {
        let store = store_with_broken_trip();

        for _ in 0..2 {
            assert!(store.trigger_cmr("bad").is_err());
        }

        let trip = store.get_trip("bad").unwrap();
        assert!(trip.cmr.history.is_empty());
        assert_eq!(trip.cmr.state(), CmrStep::Drafting);
        assert!(store.activity("bad").unwrap().is_empty());
    }

    #[test]
    fn failed_invoice_commit_writes_nothing() {
        let store = store_with_broken_trip();

        assert!(store.submit_invoice("bad", &InvoiceDraft::new()).is_err());

        let trip = store.get_trip("bad").unwrap();
        assert!(trip.billing.history.is_empty());
        assert_eq!(trip.billing.invoice_id, None);
        assert!(store.invoices.is_empty());
        assert!(store.payloads.is_empty());
        assert!(store.activity("bad").unwrap().is_empty());
    }

    #[test]
    fn paid_lands_status_and_log_together() {
        let store = TripStore::seeded(Config::default()).unwrap();
        store
            .send_invoice_email("1", &EmailMessage::new("a@b.c", "Invoice"))
            .unwrap()
            .unwrap();

        let BillingPrompt::Advanced(step) = store.trigger_billing("1").unwrap() else {
            panic!("waiting payment should advance");
        };

        let trip = store.get_trip("1").unwrap();
        assert_eq!(trip.status, TripStatus::Completed);
        assert_eq!(trip.billing.history.last(), Some(&step));
        assert_eq!(
            store.activity("1").unwrap().items().last().map(|i| i.title.as_str()),
            Some("Status change: Billing Paid")
        );
    }
}
