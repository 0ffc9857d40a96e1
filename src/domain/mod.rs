//! Domain layer: appointments, validation and the store contract.

pub mod models;
pub mod services;
pub mod errors;
pub mod store;

pub use models::*;
pub use services::*;
pub use errors::*;
pub use store::*;
