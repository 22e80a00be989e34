//! Diagnostics output

pub mod json;

pub use json::write_json;
