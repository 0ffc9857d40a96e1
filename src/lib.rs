//! agenda - Terminal Appointment Book Library
//!
//! Books appointments into hourly slots, keeps them in a JSON file or a
//! remote spreadsheet, and lists them in date order.

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use domain::*;
pub use application::*;
