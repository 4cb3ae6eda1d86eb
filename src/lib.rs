//! Opinion search: full-text search over user feedback.
//!
//! Filter sets go through the [`search::QueryClient`] to a Tantivy catalog,
//! hits are hydrated from an [`state::OpinionStore`], and the [`api`] module
//! serves the results as an HTML page, an Atom feed or JSON.

pub mod api;
pub mod config;
pub mod error;
pub mod metrics;
pub mod models;
pub mod search;
pub mod state;

pub use error::{AppError, Result};
