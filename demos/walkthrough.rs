//! Walks the Nordic Freight trip from a missing CMR to a paid invoice and
//! prints the inbox before and after.
//!
//! cargo run --example walkthrough [-- path/to/nexmile.toml]

use chrono::Utc;
use nexmile::{
    BillingPrompt, Config, TripStore,
    email::EmailMessage,
    invoice::{Contractor, InvoiceDraft},
    logging,
    stats::TripFilter,
    task::{TaskList, date_label},
};
use std::path::PathBuf;

const TRIP: &str = "3";

fn print_inbox(tasks: &TaskList) {
    if tasks.is_all_clear() {
        println!("  all systems operational, no pending tasks");
        return;
    }
    let s = tasks.summary();
    println!("  crit {} / warn {} / info {}", s.critical, s.warning, s.info);
    for item in tasks.items() {
        println!(
            "  [{:?}] {} {}: {} ({})",
            item.severity, item.trip_id, item.client_name, item.title, item.action_label
        );
    }
}

fn main() -> anyhow::Result<()> {
    logging::init("nexmile=info")?;

    let config = match std::env::args().nth(1) {
        Some(path) => Config::load_or_default(&PathBuf::from(path))?,
        None => Config::default(),
    };
    let store = TripStore::seeded(config)?;
    let today = date_label(Utc::now().date_naive());

    println!("inbox at start:");
    print_inbox(&store.tasks(&today)?);

    while let Some(step) = store.trigger_cmr(TRIP)? {
        println!("cmr: {} {:?}", step.label, step.value);
    }

    let draft = InvoiceDraft::new()
        .set_contractor(Contractor {
            company_name: "Nordic Freight GmbH".into(),
            tax_id: "DE811907980".into(),
            country: "Germany".into(),
            street: "Speicherstadt 1".into(),
            city: "Hamburg".into(),
            zip: "20095".into(),
        })
        .set_order_ref("FL-998877")
        .set_description("Transport Services")
        .set_quantity("1")
        .set_unit("srv")
        .set_net_price("3200.00")
        .set_currency("EUR")
        .set_vat_rate("23")
        .set_discount("0.00")
        .set_payment_term_days("60");

    loop {
        match store.trigger_billing(TRIP)? {
            BillingPrompt::InvoiceForm => {
                println!("invoice totals: {}", draft.totals());
                let id = store.submit_invoice(TRIP, &draft)?;
                println!("billing: invoice {id:?} created");
            }
            BillingPrompt::EmailForm => {
                let email = EmailMessage::new("accounting@nordic-freight.de", "Invoice & CMR")
                    .set_body("Please find attached the invoice and CMR documentation.")
                    .attach("invoice.pdf")
                    .attach("cmr_scan.pdf");
                store.send_invoice_email(TRIP, &email)?;
                println!("billing: sent for payment");
            }
            BillingPrompt::Advanced(step) => println!("billing: {} {:?}", step.label, step.value),
            BillingPrompt::Idle => break,
        }
    }

    println!("inbox at end:");
    print_inbox(&store.tasks(&today)?);

    let stats = store.stats(TripFilter::All)?;
    println!(
        "revenue {:.2} EUR, {:.0} km, {:.2} EUR/km",
        stats.revenue, stats.distance, stats.rate
    );

    Ok(())
}
