//! melt-fetch — one-shot model fetching via the registry's download tool.
//!
//! Pipeline:
//! 1. Locate `huggingface-cli` (or `$MELT_HF_CLI` override)
//! 2. For each model identifier, invoke `download <repo> --local-dir <dest>`
//!    with `HF_HOME` pointed at the models volume root
//! 3. Record a per-model outcome in a [`FetchReport`], fail-soft
//!
//! Each model is independent: a failure is logged and recorded, later models
//! are still attempted, and partial destinations are left in place for the
//! downloader to resume on the next run. This crate never deletes anything.

pub mod fetcher;
pub mod report;

pub use fetcher::{DOWNLOADER_ENV, Fetcher, find_downloader, sanitize_repo_id};
pub use report::{FetchOutcome, FetchReport, ModelFetch, dir_summary, format_report};
