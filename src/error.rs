#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Trip id is empty")]
    MissingId,
    #[error("Client name is empty")]
    MissingClient,
    #[error("Route distance must be a positive number of kilometres, got {0}")]
    InvalidDistance(f64),
    #[error("Billing amount must be a finite number, got {0}")]
    InvalidAmount(f64),
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum StoreError {
    #[error("No trip with id {0} in the store")]
    TripNotFound(String),
    #[error("Trip {0} is already in the store")]
    DuplicateTrip(String),
}
