pub mod activity;
pub mod config;
pub mod email;
pub mod error;
pub mod invoice;
pub mod logging;
pub mod pipeline;
pub mod seed;
pub mod stats;
pub mod store;
pub mod task;
pub mod trip;
pub mod utils;

pub use config::Config;
pub use error::{StoreError, ValidationError};
pub use pipeline::{BillingState, PipelineKind, Theme, Transition};
pub use store::{BillingPrompt, TripStore};
pub use task::{Severity, TaskItem, TaskList};
pub use trip::{
    BillingPipeline, CmrPipeline, CmrStep, InvoiceStatus, PipelineStatus, PipelineStep, Trip,
    TripStatus,
};
