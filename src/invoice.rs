//! Invoice payload collected by the invoice form, and its totals.
use super::utils::parse_lenient;
use std::fmt;

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Default, PartialEq, Eq)]
pub struct Contractor {
    #[n(0)]
    pub company_name: String,
    #[n(1)]
    pub tax_id: String, // NIP / VAT number, not checked
    #[n(2)]
    pub country: String,
    #[n(3)]
    pub street: String,
    #[n(4)]
    pub city: String,
    #[n(5)]
    pub zip: String,
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Default, PartialEq, Eq)]
pub struct InvoiceItem {
    #[n(0)]
    pub order_ref: String,
    #[n(1)]
    pub description: String,
    #[n(2)]
    pub quantity: String,
    #[n(3)]
    pub unit: String,
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Default, PartialEq, Eq)]
pub struct Finance {
    #[n(0)]
    pub net_price: String,
    #[n(1)]
    pub currency: String,
    #[n(2)]
    pub vat_rate: String, // percent
    #[n(3)]
    pub discount: String, // flat amount
    #[n(4)]
    pub document_type: String,
    #[n(5)]
    pub price_type: String,
    #[n(6)]
    pub payment_method: String,
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Default, PartialEq, Eq)]
pub struct InvoiceDates {
    #[n(0)]
    pub sale_date: String,
    #[n(1)]
    pub payment_term_days: String,
    #[n(2)]
    pub place_of_issue: String,
}

// Every field is kept as typed into the form
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Default, PartialEq, Eq)]
pub struct InvoiceDraft {
    #[n(0)]
    pub contractor: Contractor,
    #[n(1)]
    pub item: InvoiceItem,
    #[n(2)]
    pub finance: Finance,
    #[n(3)]
    pub dates: InvoiceDates,
}

/// Full-precision amounts. Round only when displaying.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Totals {
    pub subtotal: f64,
    pub vat_amount: f64,
    pub total_gross: f64,
}

pub fn compute_totals(quantity: &str, net_price: &str, vat_rate: &str, discount: &str) -> Totals {
    let qty = parse_lenient(quantity);
    let net = parse_lenient(net_price);
    let vat = parse_lenient(vat_rate);
    let discount = parse_lenient(discount);

    let subtotal = (net * qty) - discount;
    let vat_amount = subtotal * (vat / 100.0);

    Totals {
        subtotal,
        vat_amount,
        total_gross: subtotal + vat_amount,
    }
}

impl Totals {
    /// Two-decimal strings for subtotal, VAT and gross.
    pub fn display(&self) -> (String, String, String) {
        (
            format!("{:.2}", self.subtotal),
            format!("{:.2}", self.vat_amount),
            format!("{:.2}", self.total_gross),
        )
    }
}

impl fmt::Display for Totals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (subtotal, vat, gross) = self.display();
        write!(f, "net {subtotal} + vat {vat} = {gross}")
    }
}

impl InvoiceDraft {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn set_contractor(mut self, contractor: Contractor) -> Self {
        self.contractor = contractor;
        self
    }
    pub fn set_order_ref(mut self, order_ref: &str) -> Self {
        self.item.order_ref = order_ref.into();
        self
    }
    pub fn set_description(mut self, description: &str) -> Self {
        self.item.description = description.into();
        self
    }
    pub fn set_quantity(mut self, quantity: &str) -> Self {
        self.item.quantity = quantity.into();
        self
    }
    pub fn set_unit(mut self, unit: &str) -> Self {
        self.item.unit = unit.into();
        self
    }
    pub fn set_net_price(mut self, net_price: &str) -> Self {
        self.finance.net_price = net_price.into();
        self
    }
    pub fn set_currency(mut self, currency: &str) -> Self {
        self.finance.currency = currency.into();
        self
    }
    pub fn set_vat_rate(mut self, vat_rate: &str) -> Self {
        self.finance.vat_rate = vat_rate.into();
        self
    }
    pub fn set_discount(mut self, discount: &str) -> Self {
        self.finance.discount = discount.into();
        self
    }
    pub fn set_document_type(mut self, document_type: &str) -> Self {
        self.finance.document_type = document_type.into();
        self
    }
    pub fn set_price_type(mut self, price_type: &str) -> Self {
        self.finance.price_type = price_type.into();
        self
    }
    pub fn set_payment_method(mut self, payment_method: &str) -> Self {
        self.finance.payment_method = payment_method.into();
        self
    }
    pub fn set_sale_date(mut self, sale_date: &str) -> Self {
        self.dates.sale_date = sale_date.into();
        self
    }
    pub fn set_payment_term_days(mut self, days: &str) -> Self {
        self.dates.payment_term_days = days.into();
        self
    }
    pub fn set_place_of_issue(mut self, place: &str) -> Self {
        self.dates.place_of_issue = place.into();
        self
    }

    pub fn totals(&self) -> Totals {
        compute_totals(
            &self.item.quantity,
            &self.finance.net_price,
            &self.finance.vat_rate,
            &self.finance.discount,
        )
    }

    /// Payment term as a day count, if the form holds a whole number.
    pub fn payment_term(&self) -> Option<u32> {
        self.dates.payment_term_days.trim().parse().ok()
    }

    // Returns the payload encoded into cbor along with its digest
    pub fn finalise(&self) -> anyhow::Result<(String, Vec<u8>)> {
        let contents = minicbor::to_vec(self)?;
        let hash = sha256::digest(&contents);

        Ok((hash, contents))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn vat_on_single_service() {
        let totals = compute_totals("1", "270.00", "23", "0");

        assert!(close(totals.subtotal, 270.0));
        assert!(close(totals.vat_amount, 62.1));
        assert!(close(totals.total_gross, 332.1));
        assert_eq!(
            totals.display(),
            ("270.00".into(), "62.10".into(), "332.10".into())
        );
    }

    #[test]
    fn garbage_reads_as_zero() {
        let totals = compute_totals("1", "abc", "23", "0");
        assert_eq!(totals, Totals::default());
    }

    #[test]
    fn discount_can_push_subtotal_negative() {
        let totals = compute_totals("1", "100", "10", "150");

        assert!(close(totals.subtotal, -50.0));
        assert!(close(totals.vat_amount, -5.0));
        assert!(close(totals.total_gross, -55.0));
    }

    #[test]
    fn draft_totals_use_form_fields() {
        let draft = InvoiceDraft::new()
            .set_quantity("2")
            .set_net_price("100")
            .set_vat_rate("")
            .set_discount("10");

        let totals = draft.totals();
        assert!(close(totals.total_gross, 190.0));
        assert_eq!(totals.to_string(), "net 190.00 + vat 0.00 = 190.00");
    }

    #[test]
    fn payment_term_parses_whole_days() {
        assert_eq!(InvoiceDraft::new().set_payment_term_days("60").payment_term(), Some(60));
        assert_eq!(InvoiceDraft::new().set_payment_term_days("sixty").payment_term(), None);
    }
}
