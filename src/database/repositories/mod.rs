pub mod activity;
pub mod compensation;

pub use compensation::CompensationRepository;
