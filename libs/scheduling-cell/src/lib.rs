pub mod models;
pub mod services;

// Re-export the engine surface for the CLI and tests
pub use models::*;
pub use services::*;
