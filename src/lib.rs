//! spacefetch core library
//!
//! A thin client for public space-agency data APIs. Each endpoint validates
//! caller input, issues one request (or a bounded run of page requests for
//! dataset search), and normalizes the JSON payload into a tabular
//! [`RecordSet`].
//!
//! # Architecture
//!
//! - [`fetch`] - HTTP client, query parameters, and error types
//! - [`record`] - `Scalar` / `Record` / `RecordSet` result model
//! - [`endpoint`] - APOD, Mars rover photos, EPIC, NEO feed, dataset search
//! - [`persist`] - Streaming image saves for image endpoints
//! - [`output`] - Table, JSON, and CSV rendering

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod endpoint;
pub mod fetch;
pub mod output;
pub mod persist;
pub mod record;
#[cfg(test)]
pub mod test_support;
pub(crate) mod user_agent;

// Re-export commonly used types
pub use endpoint::ImageSource;
pub use fetch::{ApiClient, FetchError, QueryParameters};
pub use output::{OutputFormat, render};
pub use persist::{ImageStore, PersistError};
pub use record::{Record, RecordError, RecordSet, Scalar};
