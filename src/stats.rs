//! List filtering and footer figures.
use super::trip::{Trip, TripStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TripFilter {
    #[default]
    All,
    Active,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FooterStats {
    pub revenue: f64,
    pub distance: f64,
    pub rate: f64, // revenue per km, 0 without distance
}

impl TripFilter {
    pub fn admits(self, trip: &Trip) -> bool {
        match self {
            TripFilter::All => true,
            TripFilter::Active => trip.status == TripStatus::InTransit,
            TripFilter::Completed => trip.status == TripStatus::Completed,
        }
    }
}

pub fn rate_per_km(trip: &Trip) -> f64 {
    if trip.task.distance > 0.0 {
        trip.billing.amount / trip.task.distance
    } else {
        0.0
    }
}

pub fn footer_stats<'a>(trips: impl IntoIterator<Item = &'a Trip>) -> FooterStats {
    let (revenue, distance) = trips
        .into_iter()
        .fold((0.0, 0.0), |(revenue, distance), trip| {
            (revenue + trip.billing.amount, distance + trip.task.distance)
        });

    FooterStats {
        revenue,
        distance,
        rate: if distance > 0.0 { revenue / distance } else { 0.0 },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trip::{BillingPipeline, LocationDetails, TripTask};

    fn trip(status: TripStatus, amount: f64, distance: f64) -> Trip {
        Trip::new("1", "Client")
            .set_status(status)
            .set_route(TripTask::new(
                "FL-1",
                LocationDetails::new("DE", "1", "A", "01.01"),
                LocationDetails::new("FR", "2", "B", "02.01"),
                distance,
            ))
            .set_billing(BillingPipeline::new(amount, "EUR"))
    }

    #[test]
    fn footer_sums_and_averages() {
        let trips = [
            trip(TripStatus::InTransit, 2450.0, 1250.0),
            trip(TripStatus::Completed, 1800.0, 1800.0),
        ];
        let stats = footer_stats(&trips);

        assert_eq!(stats.revenue, 4250.0);
        assert_eq!(stats.distance, 3050.0);
        assert!((stats.rate - 4250.0 / 3050.0).abs() < 1e-12);
    }

    #[test]
    fn empty_footer_has_zero_rate() {
        assert_eq!(footer_stats(&Vec::<Trip>::new()), FooterStats::default());
    }

    #[test]
    fn filters_by_trip_status() {
        let moving = trip(TripStatus::InTransit, 1.0, 1.0);
        let planned = trip(TripStatus::Scheduled, 1.0, 1.0);

        assert!(TripFilter::Active.admits(&moving));
        assert!(!TripFilter::Active.admits(&planned));
        assert!(!TripFilter::Completed.admits(&moving));
        assert!(TripFilter::All.admits(&planned));
    }

    #[test]
    fn rate_per_km_of_single_trip() {
        assert!((rate_per_km(&trip(TripStatus::InTransit, 2450.0, 1250.0)) - 1.96).abs() < 1e-12);
    }
}
