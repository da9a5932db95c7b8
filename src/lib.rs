//! A small blocking Rust client for the Argilla feedback dataset API (`/api/v1`).
//!
//! Each endpoint is a plain function over a shared [`Client`] that performs one
//! HTTP request and returns a uniform [`Response`] envelope. HTTP errors are
//! data, not `Err`: a status other than the endpoint's success code yields
//! [`Parsed::Error`] with a normalized [`ErrorPayload`].
//!
//! ## Quick start
//! - Configure the server via environment variables (`ARGILLA_API_URL`,
//!   `ARGILLA_API_KEY`, optionally `ARGILLA_WORKSPACE`) or a `.argillarc` file
//!   (supported in the current directory and in your home directory).
//! - Call the functions in [`datasets`].
//!
//! ```no_run
//! use anyhow::{Result, anyhow};
//! use argilla_client::{Client, datasets};
//! use serde_json::json;
//!
//! fn main() -> Result<()> {
//!     let client = Client::from_env()?;
//!     let created = datasets::create_dataset(&client, "reviews", "<workspace-id>", None)?
//!         .into_result()?
//!         .ok_or_else(|| anyhow!("create_dataset returned no dataset"))?;
//!
//!     datasets::add_field(&client, &created.id, &json!({
//!         "name": "text",
//!         "title": "Text",
//!         "required": true,
//!         "settings": {"type": "text"}
//!     }))?
//!     .into_result()?;
//!     datasets::publish_dataset(&client, &created.id)?.into_result()?;
//!     Ok(())
//! }
//! ```
//!
//! `get_dataset` can read through an explicit [`DatasetCache`]; see
//! [`Client::with_dataset_cache`].

#![forbid(unsafe_code)]

mod cache;
mod client;
mod config;
pub mod datasets;
mod error;
mod models;
mod response;
mod util;

pub use cache::{DEFAULT_CAPACITY, DatasetCache};
pub use client::{API_KEY_HEADER, Client, ClientConfig, ClientId, WORKSPACE_HEADER};
pub use error::{
    ErrorMessage, ErrorPayload, HttpValidationError, ValidationErrorItem, handle_response_error,
};
pub use models::{Dataset, DatasetStatus, Field, Question, Record, RecordsPage};
pub use response::{Parsed, Response};
