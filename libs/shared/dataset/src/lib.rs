pub mod fixture;
pub mod loader;
pub mod summary;

pub use fixture::demo_roster;
pub use loader::{load_dataset, parse_dataset, DatasetError, DEFAULT_MAX_DISTANCE_KM};
pub use summary::DatasetSummary;
