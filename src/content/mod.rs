//! Access to the raw text of word list pages.
//!
//! Pages are addressed by a [`DeploymentTarget`] and a page name. The
//! [`PageContentFetcher`] trait hides how the text is obtained, so that the
//! resolver can be driven by static content in tests, by files on disk, or
//! via HTTP (`http_fetcher` feature).

use anyhow::{Context, bail};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

#[cfg(feature = "http_fetcher")]
mod http;

#[cfg(feature = "http_fetcher")]
pub use http::HttpPageFetcher;

/// The deployment a page is read from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DeploymentTarget {
    /// The deployment this process belongs to.
    Local,

    /// Another deployment, identified by its name.
    Named(String),
}

impl DeploymentTarget {
    /// Determines the target for `configured`, as seen from `local_identity`.
    ///
    /// No configured deployment, or one equal to `local_identity`, yields
    /// [`DeploymentTarget::Local`].
    pub fn resolve(configured: Option<&str>, local_identity: &str) -> Self {
        match configured {
            Some(identity) if identity != local_identity => Self::Named(identity.to_string()),
            _ => Self::Local,
        }
    }
}

impl Display for DeploymentTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            DeploymentTarget::Local => write!(f, "local"),
            DeploymentTarget::Named(identity) => write!(f, "{}", identity),
        }
    }
}

/// Provides the main content of pages.
#[async_trait]
pub trait PageContentFetcher: Send + Sync {
    /// Fetches the text of `page_name` on `target`.
    ///
    /// Returns `Ok(None)` if the page does not exist or has no text content.
    async fn fetch_main_content(
        &self,
        target: &DeploymentTarget,
        page_name: &str,
    ) -> anyhow::Result<Option<String>>;
}

/// Serves pages from memory.
#[derive(Debug, Default)]
pub struct StaticPageFetcher {
    pages: HashMap<(DeploymentTarget, String), String>,
}

impl StaticPageFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a page.
    pub fn with_page(
        mut self,
        target: DeploymentTarget,
        page_name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        self.pages.insert((target, page_name.into()), content.into());
        self
    }
}

#[async_trait]
impl PageContentFetcher for StaticPageFetcher {
    async fn fetch_main_content(
        &self,
        target: &DeploymentTarget,
        page_name: &str,
    ) -> anyhow::Result<Option<String>> {
        Ok(self
            .pages
            .get(&(target.clone(), page_name.to_string()))
            .cloned())
    }
}

/// Directory of [`FilePageFetcher`] holding the pages of the local deployment.
pub const LOCAL_PAGES_DIRECTORY: &str = "local";

/// Serves pages from a directory tree.
///
/// A page is stored as `<root>/<deployment>/<page>.txt`, where local pages
/// live in `<root>/local`. Spaces in page names are stored as underscores.
/// Deployment and page names must be single path components, and no other
/// deployment may be called `local`.
#[derive(Debug, Clone)]
pub struct FilePageFetcher {
    root: PathBuf,
}

impl FilePageFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Computes the file which holds the given page.
    pub fn page_path(&self, target: &DeploymentTarget, page_name: &str) -> anyhow::Result<PathBuf> {
        let directory = match target {
            DeploymentTarget::Local => LOCAL_PAGES_DIRECTORY,
            DeploymentTarget::Named(identity) if identity == LOCAL_PAGES_DIRECTORY => {
                bail!("Deployment '{}' collides with the local pages directory", identity)
            }
            DeploymentTarget::Named(identity) => {
                path_component(identity).context("Invalid deployment name")?
            }
        };
        let page = path_component(page_name.trim()).context("Invalid page name")?;

        Ok(self
            .root
            .join(directory)
            .join(format!("{}.txt", page.replace(' ', "_"))))
    }
}

fn path_component(name: &str) -> anyhow::Result<&str> {
    if name.is_empty() || name.contains("..") || name.contains(['/', '\\', '\0']) {
        bail!("'{}' is not a single path component", name);
    }

    Ok(name)
}

#[async_trait]
impl PageContentFetcher for FilePageFetcher {
    #[tracing::instrument(level = "debug", skip(self), err(Display))]
    async fn fetch_main_content(
        &self,
        target: &DeploymentTarget,
        page_name: &str,
    ) -> anyhow::Result<Option<String>> {
        let path = self.page_path(target, page_name)?;

        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => {
                Err(anyhow::Error::new(err).context(format!("Cannot read page file {:?}", path)))
            }
        }
    }
}
