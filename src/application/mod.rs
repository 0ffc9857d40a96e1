//! Application layer managing state and booking workflows.
//!
//! This module coordinates between the domain layer and presentation layer,
//! managing the booking form, the displayed agenda and user interactions.

pub mod state;

pub use state::*;
