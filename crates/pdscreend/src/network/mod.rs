//! HTTP plumbing shared by the daemon's routes

pub mod metrics;
pub mod middleware;

pub use metrics::PredictionMetrics;
pub use middleware::{body_size_limit, BodyLimit, MAX_BODY_SIZE};
