pub mod error;
pub mod scheduling;

pub use error::SchedulingError;
pub use scheduling::*;
