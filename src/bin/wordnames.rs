//! Prints generated names for a range of indices.
//!
//! ```text
//! WORDNAMES_PAGE="Temp user words" wordnames --pages ./pages --start 40 --count 3
//! ```

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use wordnames::cache::InMemorySharedCache;
use wordnames::config::WordNamesSettings;
use wordnames::content::{FilePageFetcher, PageContentFetcher};
use wordnames::mapping::{SerialMapping, WordNamesSerialMapping};

#[derive(Parser, Debug)]
#[command(name = "wordnames")]
#[command(about = "Generate names for provisional accounts", long_about = None)]
struct Args {
    /// JSON settings file; WORDNAMES_* variables are used if omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding word list pages as <deployment>/<page>.txt
    #[arg(short, long, env = "WORDNAMES_PAGES_DIR", default_value = "pages")]
    pages: PathBuf,

    /// Script endpoint of this deployment, pages are then fetched via HTTP
    #[cfg(feature = "http_fetcher")]
    #[arg(long, env = "WORDNAMES_ENDPOINT")]
    endpoint: Option<String>,

    /// Script endpoint of the central deployment hosting the word list page
    #[cfg(feature = "http_fetcher")]
    #[arg(long, env = "WORDNAMES_CENTRAL_ENDPOINT", requires = "endpoint")]
    central_endpoint: Option<String>,

    /// First index to generate a name for
    #[arg(short, long, default_value_t = 0)]
    start: i64,

    /// Number of names to generate
    #[arg(short = 'n', long, default_value_t = 1)]
    count: i64,
}

impl Args {
    fn settings(&self) -> anyhow::Result<WordNamesSettings> {
        match &self.config {
            Some(path) => {
                let json = std::fs::read_to_string(path)
                    .with_context(|| format!("Cannot read settings from {:?}", path))?;
                WordNamesSettings::from_json(&json)
            }
            None => WordNamesSettings::from_env(),
        }
    }

    #[cfg(feature = "http_fetcher")]
    fn fetcher(&self, settings: &WordNamesSettings) -> anyhow::Result<Arc<dyn PageContentFetcher>> {
        match &self.endpoint {
            Some(endpoint) => Ok(Arc::new(
                wordnames::content::HttpPageFetcher::new(endpoint).with_central_endpoint(
                    settings,
                    wordnames::DEPLOYMENT_ID.as_str(),
                    self.central_endpoint.as_deref(),
                )?,
            )),
            None => Ok(Arc::new(FilePageFetcher::new(&self.pages))),
        }
    }

    #[cfg(not(feature = "http_fetcher"))]
    fn fetcher(&self, _settings: &WordNamesSettings) -> anyhow::Result<Arc<dyn PageContentFetcher>> {
        Ok(Arc::new(FilePageFetcher::new(&self.pages)))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    wordnames::logging::setup_tracing();

    let args = Args::parse();
    let settings = args.settings()?;
    let fetcher = args.fetcher(&settings)?;
    let mapping =
        WordNamesSerialMapping::new(settings, fetcher, Arc::new(InMemorySharedCache::new()))?;

    for index in args.start..args.start.saturating_add(args.count.max(0)) {
        println!("{}", mapping.serial_id_for_index(index).await);
    }

    Ok(())
}
