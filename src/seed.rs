//! Mock trips and activity the dashboard boots with.
use super::activity::{ActivityItem, ActivityKind, ActivityStream};
use super::trip::{
    BillingPipeline, CmrPipeline, CmrStep, InvoiceStatus, LocationDetails, PipelineStatus,
    PipelineStep, TimeStamp, Trip, TripStatus, TripTask,
};
use anyhow::anyhow;
use chrono::Utc;

/// Trip whose activity stream is pre-populated.
pub const STREAM_TRIP_ID: &str = "1";

pub fn trips() -> Vec<Trip> {
    vec![
        Trip::new("1", "Rossi Transporti SpA")
            .set_status(TripStatus::InTransit)
            .set_route(TripTask::new(
                "FL-789012",
                LocationDetails::new("FR", "67720", "HOERDT", "03.02"),
                LocationDetails::new("DE", "54424", "THALFANG", "04.02"),
                1250.0,
            ))
            .set_cmr(
                CmrPipeline::new()
                    .set_status(PipelineStatus::Warning)
                    .set_step(CmrStep::SentToClient)
                    .set_tag("SENT BY EMAIL")
                    .push_step(PipelineStep::new("c1", "Created", PipelineStatus::Completed))
                    .push_step(
                        PipelineStep::new("c2", "Uploaded", PipelineStatus::Completed)
                            .with_value("cmr_scan.pdf"),
                    )
                    .push_step(
                        PipelineStep::new("c3", "Sent by email", PipelineStatus::Warning)
                            .with_value("logistics@rossi.it"),
                    ),
            )
            .set_billing(
                BillingPipeline::new(2450.0, "EUR")
                    .set_invoice("INV-789012")
                    .set_invoice_status(InvoiceStatus::Issued),
            ),
        Trip::new("2", "PolLogistics SA")
            .set_status(TripStatus::Completed)
            .set_route(TripTask::new(
                "FL-123456",
                LocationDetails::new("PL", "05-500", "PIASECZNO", "22.05"),
                LocationDetails::new("IT", "80100", "NAPOLI", "24.05"),
                1800.0,
            ))
            .set_cmr(
                CmrPipeline::new()
                    .set_status(PipelineStatus::Completed)
                    .set_step(CmrStep::Received)
                    .set_tag("RECEIVED")
                    .push_step(PipelineStep::new("c1", "Created", PipelineStatus::Completed))
                    .push_step(PipelineStep::new("c2", "Uploaded", PipelineStatus::Completed))
                    .push_step(
                        PipelineStep::new("c3", "Confirmed", PipelineStatus::Completed)
                            .with_value("Signed by client"),
                    ),
            )
            .set_billing(
                BillingPipeline::new(1800.0, "EUR")
                    .set_status(PipelineStatus::Completed)
                    .set_invoice("INV-123456")
                    .set_invoice_status(InvoiceStatus::Paid),
            ),
        Trip::new("3", "Nordic Freight GmbH")
            .set_status(TripStatus::Scheduled)
            .set_route(TripTask::new(
                "FL-998877",
                LocationDetails::new("DE", "20095", "HAMBURG", "01.06"),
                LocationDetails::new("UA", "79000", "LVIV", "03.06"),
                1400.0,
            ))
            .set_cmr(CmrPipeline::new())
            .set_billing(
                BillingPipeline::new(3200.0, "EUR")
                    .set_status(PipelineStatus::Blocked)
                    .set_invoice_status(InvoiceStatus::WaitingDocs),
            ),
    ]
}

fn at(day: u32, hour: u32, min: u32) -> anyhow::Result<TimeStamp<Utc>> {
    TimeStamp::new_with(2024, 2, day, hour, min, 0)
        .ok_or_else(|| anyhow!("invalid seed date 2024-02-{day:02} {hour:02}:{min:02}"))
}

pub fn activity() -> anyhow::Result<ActivityStream> {
    let mut stream = ActivityStream::new();
    let items = [
        ActivityItem::new("a6", ActivityKind::System, at(3, 8, 0)?, "System", "Trip started")
            .with_content("Trip status changed to IN_TRANSIT"),
        ActivityItem::new("a5", ActivityKind::Document, at(3, 14, 20)?, "Driver App", "CMR uploaded")
            .with_attachments(&["scan_from_driver_app.jpg".to_string()]),
        ActivityItem::new("a4", ActivityKind::Note, at(3, 16, 0)?, "Me", "Dispatcher note")
            .with_content(
                "Client asked for documents at accounting@rossi.it, the record still has the old address. Sent to both.",
            ),
        ActivityItem::new("a3", ActivityKind::Task, at(4, 9, 15)?, "Me", "Check originals")
            .with_content("Driver hands over the original documents at the office tomorrow."),
        ActivityItem::new("a2", ActivityKind::System, at(4, 10, 29)?, "System", "Status change: CMR sent")
            .with_content("Status changed from \"Uploaded\" to \"Sent to client\""),
        ActivityItem::new("a1", ActivityKind::Email, at(4, 10, 30)?, "Me", "Documents sent (CMR, invoice)")
            .with_content("Hello. Attached are the invoice and CMR for the completed order. Please confirm receipt.")
            .with_attachments(&["cmr_scan.pdf".to_string(), "invoice_789012.pdf".to_string()]),
    ];
    for item in items {
        stream.push(item);
    }
    Ok(stream)
}
