pub mod activity_logger;
pub mod clock;
pub mod hike;
pub mod reconciliation;
pub mod scheduler;

pub use clock::{Clock, FixedClock, SystemClock};
pub use hike::HikeService;
pub use reconciliation::{ReconciliationOutcome, ReconciliationService};
