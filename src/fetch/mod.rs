//! Fetch module: single-URL retrieval and batch fan-out
//!
//! The [`FetchClient`] retrieves one URL with bypass strategies applied;
//! [`batch_fetch`] runs many such retrievals under a concurrency bound.
//! Both signal failure through [`FetchResult`] rather than errors.

mod batch;
mod client;

pub use batch::{batch_fetch, DEFAULT_MAX_CONCURRENT};
pub use client::{FetchClient, FetchRequest, FetchResult};
