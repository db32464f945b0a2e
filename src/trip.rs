//! Core trip records: route, CMR pipeline, billing pipeline
use super::error::ValidationError;
use chrono::{DateTime, TimeZone, Utc};
use std::cmp::Ordering;
use std::fmt;

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum TripStatus {
    #[n(0)]
    Scheduled,
    #[n(1)]
    InTransit,
    #[n(2)]
    Completed,
}

/// Coarse lifecycle indicator shared by both pipelines and by log entries.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum PipelineStatus {
    #[n(0)]
    Pending,
    #[n(1)]
    Active,
    #[n(2)]
    Completed,
    #[n(3)]
    Blocked,
    #[n(4)]
    Warning,
}

/// Where the CMR document currently sits.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum CmrStep {
    #[n(0)]
    Drafting,
    #[n(1)]
    Uploaded,
    #[n(2)]
    SentToClient,
    #[n(3)]
    Received,
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum InvoiceStatus {
    #[n(0)]
    WaitingDocs,
    #[n(1)]
    Issued,
    #[n(2)]
    WaitingPayment,
    #[n(3)]
    Paid,
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct TimeStamp<T: TimeZone>(DateTime<T>);

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq)]
pub struct LocationDetails {
    #[n(0)]
    pub country: String,
    #[n(1)]
    pub zip: String,
    #[n(2)]
    pub city: String,
    #[n(3)]
    pub date: String, // short label, e.g. "03.02"
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq)]
pub struct TripTask {
    #[n(0)]
    pub id: String, // route reference shown on cards, e.g. "FL-789012"
    #[n(1)]
    pub pickup: LocationDetails,
    #[n(2)]
    pub delivery: LocationDetails,
    #[n(3)]
    pub distance: f64, // km
}

/// One entry of a pipeline log. Never mutated once appended.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq)]
pub struct PipelineStep {
    #[n(0)]
    pub id: String,
    #[n(1)]
    pub label: String,
    #[n(2)]
    pub status: PipelineStatus,
    #[n(3)]
    pub value: Option<String>,
    #[n(4)]
    pub date: Option<TimeStamp<Utc>>,
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq)]
pub struct CmrPipeline {
    #[n(0)]
    pub status: PipelineStatus,
    #[n(1)]
    pub current_step: CmrStep,
    #[n(2)]
    pub tag: Option<String>,
    #[n(3)]
    pub history: Vec<PipelineStep>,
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq)]
pub struct BillingPipeline {
    #[n(0)]
    pub status: PipelineStatus,
    #[n(1)]
    pub amount: f64,
    #[n(2)]
    pub currency: String,
    #[n(3)]
    pub invoice_id: Option<String>,
    #[n(4)]
    pub invoice_status: Option<InvoiceStatus>,
    #[n(5)]
    pub history: Vec<PipelineStep>,
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq)]
pub struct Trip {
    #[n(0)]
    pub id: String,
    #[n(1)]
    pub client_name: String,
    #[n(2)]
    pub status: TripStatus,
    #[n(3)]
    pub task: TripTask,
    #[n(4)]
    pub cmr: CmrPipeline,
    #[n(5)]
    pub billing: BillingPipeline,
}

impl TimeStamp<Utc> {
    pub fn new() -> Self {
        Self(Utc::now())
    }
    pub fn new_with(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> Option<Self> {
        Utc.with_ymd_and_hms(year, month, day, hour, min, sec)
            .single()
            .map(Self)
    }
    pub fn to_datetime_utc(&self) -> DateTime<Utc> {
        self.0
    }
}

// Ordered by instant. `Utc` itself has no ordering, so this cannot be derived.
impl PartialOrd for TimeStamp<Utc> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimeStamp<Utc> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl Default for TimeStamp<Utc> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: TimeZone> From<DateTime<T>> for TimeStamp<T> {
    fn from(value: DateTime<T>) -> Self {
        TimeStamp(value)
    }
}

impl<C> minicbor::Encode<C> for TimeStamp<Utc> {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        if let Some(nsec) = self.0.timestamp_nanos_opt() {
            return e.i64(nsec)?.ok();
        }

        Err(minicbor::encode::Error::message(
            "failed to encode timestamp. timestamp_nanos_opt returned None",
        ))
    }
}

impl<'b, C> minicbor::Decode<'b, C> for TimeStamp<Utc> {
    fn decode(d: &mut minicbor::Decoder<'b>, _: &mut C) -> Result<Self, minicbor::decode::Error> {
        let nsecs = d.i64()?;

        Ok(TimeStamp(DateTime::from_timestamp_nanos(nsecs)))
    }
}

impl CmrStep {
    /// Label used by the dashboard for `currentStep`.
    pub fn as_str(&self) -> &'static str {
        match self {
            CmrStep::Drafting => "Drafting",
            CmrStep::Uploaded => "Uploaded",
            CmrStep::SentToClient => "Sent_to_Client",
            CmrStep::Received => "Received",
        }
    }
}

impl fmt::Display for CmrStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::WaitingDocs => "WAITING_DOCS",
            InvoiceStatus::Issued => "ISSUED",
            InvoiceStatus::WaitingPayment => "WAITING_PAYMENT",
            InvoiceStatus::Paid => "PAID",
        }
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for PipelineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PipelineStatus::Pending => "PENDING",
            PipelineStatus::Active => "ACTIVE",
            PipelineStatus::Completed => "COMPLETED",
            PipelineStatus::Blocked => "BLOCKED",
            PipelineStatus::Warning => "WARNING",
        };
        f.write_str(label)
    }
}

impl fmt::Display for TripStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TripStatus::Scheduled => "SCHEDULED",
            TripStatus::InTransit => "IN_TRANSIT",
            TripStatus::Completed => "COMPLETED",
        };
        f.write_str(label)
    }
}

impl LocationDetails {
    pub fn new(country: &str, zip: &str, city: &str, date: &str) -> Self {
        Self {
            country: country.into(),
            zip: zip.into(),
            city: city.into(),
            date: date.into(),
        }
    }
}

impl TripTask {
    pub fn new(id: &str, pickup: LocationDetails, delivery: LocationDetails, distance: f64) -> Self {
        Self {
            id: id.into(),
            pickup,
            delivery,
            distance,
        }
    }
}

impl PipelineStep {
    pub fn new(id: &str, label: &str, status: PipelineStatus) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            status,
            value: None,
            date: None,
        }
    }
    pub fn with_value(mut self, value: &str) -> Self {
        self.value = Some(value.into());
        self
    }
}

impl Default for CmrPipeline {
    fn default() -> Self {
        Self {
            status: PipelineStatus::Pending,
            current_step: CmrStep::Drafting,
            tag: None,
            history: vec![],
        }
    }
}

impl CmrPipeline {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn set_status(mut self, status: PipelineStatus) -> Self {
        self.status = status;
        self
    }
    pub fn set_step(mut self, step: CmrStep) -> Self {
        self.current_step = step;
        self
    }
    pub fn set_tag(mut self, tag: &str) -> Self {
        self.tag = Some(tag.into());
        self
    }
    pub fn push_step(mut self, step: PipelineStep) -> Self {
        self.history.push(step);
        self
    }
}

impl BillingPipeline {
    pub fn new(amount: f64, currency: &str) -> Self {
        Self {
            status: PipelineStatus::Pending,
            amount,
            currency: currency.into(),
            invoice_id: None,
            invoice_status: None,
            history: vec![],
        }
    }
    pub fn set_status(mut self, status: PipelineStatus) -> Self {
        self.status = status;
        self
    }
    pub fn set_invoice(mut self, invoice_id: &str) -> Self {
        self.invoice_id = Some(invoice_id.into());
        self
    }
    pub fn set_invoice_status(mut self, status: InvoiceStatus) -> Self {
        self.invoice_status = Some(status);
        self
    }
}

impl Trip {
    /// Starts a trip with an empty route and fresh pipelines. Fill in the
    /// rest with the setters.
    pub fn new(id: &str, client_name: &str) -> Self {
        Self {
            id: id.into(),
            client_name: client_name.into(),
            status: TripStatus::Scheduled,
            task: TripTask::new(
                "",
                LocationDetails::new("", "", "", ""),
                LocationDetails::new("", "", "", ""),
                0.0,
            ),
            cmr: CmrPipeline::default(),
            billing: BillingPipeline::new(0.0, "EUR"),
        }
    }
    pub fn set_status(mut self, status: TripStatus) -> Self {
        self.status = status;
        self
    }
    pub fn set_route(mut self, task: TripTask) -> Self {
        self.task = task;
        self
    }
    pub fn set_cmr(mut self, cmr: CmrPipeline) -> Self {
        self.cmr = cmr;
        self
    }
    pub fn set_billing(mut self, billing: BillingPipeline) -> Self {
        self.billing = billing;
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.trim().is_empty() {
            return Err(ValidationError::MissingId);
        }
        if self.client_name.trim().is_empty() {
            return Err(ValidationError::MissingClient);
        }
        let distance = self.task.distance;
        if !distance.is_finite() || distance <= 0.0 {
            return Err(ValidationError::InvalidDistance(distance));
        }
        if !self.billing.amount.is_finite() {
            return Err(ValidationError::InvalidAmount(self.billing.amount));
        }
        Ok(())
    }

    // Validates, then returns the record encoded into cbor along with its digest
    pub fn validate_and_finalise(&self) -> anyhow::Result<(String, Vec<u8>)> {
        self.validate()?;

        let contents = minicbor::to_vec(self)?;
        let hash = sha256::digest(&contents);

        Ok((hash, contents))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route() -> TripTask {
        TripTask::new(
            "FL-000001",
            LocationDetails::new("PL", "05-500", "PIASECZNO", "22.05"),
            LocationDetails::new("IT", "80100", "NAPOLI", "24.05"),
            1800.0,
        )
    }

    #[test]
    fn timestamp_encoding() {
        let original = TimeStamp::new();

        let encoding = minicbor::to_vec(original.clone()).unwrap();
        let decode: TimeStamp<Utc> = minicbor::decode(&encoding).unwrap();

        assert_eq!(original, decode);
    }

    #[test]
    fn timestamps_order_by_instant() {
        let morning = TimeStamp::new_with(2024, 2, 4, 8, 0, 0).unwrap();
        let noon = TimeStamp::new_with(2024, 2, 4, 12, 0, 0).unwrap();

        assert!(morning < noon);
        assert!(noon <= noon.clone());
        assert_eq!(morning.clone().max(noon.clone()), noon);
    }

    #[test]
    fn trip_survives_cbor() {
        let trip = Trip::new("9", "Acme")
            .set_route(route())
            .set_cmr(
                CmrPipeline::new()
                    .set_step(CmrStep::Uploaded)
                    .push_step(PipelineStep::new("c1", "Uploaded", PipelineStatus::Warning).with_value("scan.pdf")),
            )
            .set_billing(BillingPipeline::new(1800.0, "EUR").set_invoice_status(InvoiceStatus::WaitingDocs));

        let (hash, cbor) = trip.validate_and_finalise().unwrap();
        let decoded: Trip = minicbor::decode(&cbor).unwrap();

        assert_eq!(trip, decoded);
        assert_eq!(hash, sha256::digest(&cbor));
    }

    #[test]
    fn rejects_zero_distance() {
        let trip = Trip::new("1", "Acme");
        assert_eq!(trip.validate(), Err(ValidationError::InvalidDistance(0.0)));
    }

    #[test]
    fn rejects_blank_client() {
        let trip = Trip::new("1", "  ").set_route(route());
        assert_eq!(trip.validate(), Err(ValidationError::MissingClient));
    }

    #[test]
    fn step_labels_match_dashboard() {
        assert_eq!(CmrStep::SentToClient.to_string(), "Sent_to_Client");
        assert_eq!(InvoiceStatus::WaitingDocs.to_string(), "WAITING_DOCS");
        assert_eq!(TripStatus::InTransit.to_string(), "IN_TRANSIT");
    }
}
