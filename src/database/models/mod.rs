pub mod activity;
pub mod compensation;
pub mod macros;

pub use activity::*;
pub use compensation::*;
