//! Single-attempt HTTP retrieval of JSON payloads.
//!
//! # Example
//!
//! ```no_run
//! use spacefetch_core::fetch::{ApiClient, QueryParameters};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ApiClient::new()?;
//! let params = QueryParameters::builder("DEMO_KEY")
//!     .text("date", "2024-04-01")
//!     .build();
//! let payload = client
//!     .get_json("https://api.nasa.gov/planetary/apod", &params)
//!     .await?;
//! println!("{payload}");
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod query;

pub use client::{ApiClient, CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS, configure_http_timeouts};
pub use error::FetchError;
pub use query::{API_KEY_PARAM, QueryBuilder, QueryParameters};
