//! # Wordnames
//!
//! Generates human-memorable names for provisional accounts, such as
//! `AppleBananaCherry42`, by sampling words from a configurable word list.
//!
//! The word list is either configured inline or read from a page, which may
//! live on this deployment or on a central one. Page-sourced lists are shared
//! through a time-bounded cache and memoized per process. Whenever the list
//! cannot be obtained or does not fit the configured name length, a built-in
//! fallback list is used, so generating a name never fails.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use wordnames::cache::InMemorySharedCache;
//! use wordnames::config::WordNamesSettings;
//! use wordnames::content::FilePageFetcher;
//! use wordnames::mapping::{SerialMapping, WordNamesSerialMapping};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     wordnames::logging::setup_tracing();
//!
//!     let mapping = WordNamesSerialMapping::new(
//!         WordNamesSettings::from_env()?,
//!         Arc::new(FilePageFetcher::new("pages")),
//!         Arc::new(InMemorySharedCache::new()),
//!     )?;
//!
//!     println!("{}", mapping.serial_id_for_index(42).await);
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`config`] - Word list settings loaded from the environment or JSON
//! - [`content`] - Page content collaborators (static, file system, HTTP)
//! - [`cache`] - Shared time-bounded cache with single-flight recomputation
//! - [`wordlist`] - Word list resolution and the fallback list
//! - [`sampler`] - Turns a word list into a name
//! - [`mapping`] - Index to name mapping combining all of the above
//! - [`logging`] - Tracing setup
//!
//! ## Feature Flags
//!
//! - `http_fetcher` - Fetch word list pages via HTTP
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `APP_NAME` | Application identifier | `WORDNAMES` |
//! | `DEPLOYMENT_ID` | Identity of this deployment | `local` |
//! | `WORDNAMES_WORDS` | Comma separated inline word list | (none) |
//! | `WORDNAMES_PAGE` | Name of the page holding the word list | (none) |
//! | `WORDNAMES_CENTRAL_DEPLOYMENT` | Deployment hosting the page | `DEPLOYMENT_ID` |
//! | `WORDNAMES_LENGTH` | Number of words per name | `3` |
//! | `WORDNAMES_USE_INDEX` | Append the index to each name | `true` |
//! | `WORDNAMES_OFFSET` | Added to the index before appending | `0` |
//! | `RUST_LOG` | Console log filter | `info` |
//!
//! Exactly one of `WORDNAMES_WORDS` and `WORDNAMES_PAGE` must be set.

use std::env;
use std::sync::LazyLock;

/// Logging and tracing infrastructure.
pub mod logging;

/// Word list settings.
pub mod config;

/// Collaborators which provide the raw text of word list pages.
pub mod content;

/// Shared, time-bounded caching of resolved word lists.
pub mod cache;

/// Word list resolution.
pub mod wordlist;

/// Name generation from a resolved word list.
pub mod sampler;

/// Maps account indices to generated names.
pub mod mapping;

/// Application name from `APP_NAME` environment variable.
///
/// Defaults to `"WORDNAMES"` if not set.
pub static APP_NAME: LazyLock<String> =
    LazyLock::new(|| env::var("APP_NAME").unwrap_or("WORDNAMES".to_string()));

/// Identity of this deployment from the `DEPLOYMENT_ID` environment variable.
///
/// A configured central deployment equal to this value is treated as local.
/// Defaults to `"local"`.
pub static DEPLOYMENT_ID: LazyLock<String> =
    LazyLock::new(|| env::var("DEPLOYMENT_ID").unwrap_or("local".to_string()));
