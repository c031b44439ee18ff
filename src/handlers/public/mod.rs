// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Service banner and health check.
pub mod status;

pub use status::{health, root};
