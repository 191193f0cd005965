//! Field cleaners for street names, phone numbers and postal codes.
//!
//! Each cleaner is a pure, total function. Street normalisation is driven by
//! [`CleaningRules`], which callers load once and hand to the shaper.

mod phone;
mod postcode;
mod rules;
mod street;

pub use phone::{is_conforming_phone, normalise_phone};
pub use postcode::is_conforming_postcode;
pub use rules::{CleaningRules, CleaningRulesError};
pub use street::{normalise_street, street_type};
