//! Helpers for a Route 53 style DNS-hosting API.
//!
//! The core is [`paginate`]: it drives a paginated endpoint to completion and
//! folds every page into one [`Response`]. [`Client`] wraps it with per-call
//! transport scopes, and the zone, record and change workflows are built on
//! top of that.

pub mod changes;
pub mod client;
pub mod combine;
pub mod model;
pub mod paginate;
pub mod records;
pub mod response;
pub mod settings;
pub mod transport;
pub mod zones;

pub use client::{Client, Error};
pub use combine::Combine;
pub use paginate::{paginate, run_all, Paginated};
pub use records::RecordFilter;
pub use response::{ApiError, Metadata, Response};
