pub mod activity;
pub mod compensation;
pub mod reconciliation;
pub mod shared;
