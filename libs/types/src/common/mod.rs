//! Common types shared by every engine crate

pub mod errors;
pub mod fixed_point;
pub mod identifiers;
