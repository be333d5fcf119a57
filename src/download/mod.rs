//! Avatar fetching and persistence
//!
//! This module provides the per-server fan-out, the single-avatar worker, and
//! the naming rules that decide where each file lands.

mod batch;
pub mod naming;
mod worker;

pub use batch::{dispatch, eligible_items, BatchReport, DownloadItem};
pub use naming::sanitize;
pub use worker::{fetch_and_save, ByteStream, DownloadOutcome, Fetch, HttpFetcher};
