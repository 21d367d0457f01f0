//! Maps account indices to generated names.

use crate::cache::SharedCache;
use crate::config::WordNamesSettings;
use crate::content::PageContentFetcher;
use crate::sampler::{GenerationRequest, IdentifierSampler};
use crate::wordlist::{ResolvedWordList, WordListResolver};
use async_trait::async_trait;
use std::sync::Arc;

/// Turns a sequential index into the name of a provisional account.
#[async_trait]
pub trait SerialMapping: Send + Sync {
    async fn serial_id_for_index(&self, index: i64) -> String;
}

/// A [`SerialMapping`] which names accounts with randomly chosen words.
pub struct WordNamesSerialMapping {
    resolver: WordListResolver,
    sampler: IdentifierSampler,
    use_index: bool,
}

impl WordNamesSerialMapping {
    /// Creates the mapping for this deployment.
    ///
    /// Fails with a [`crate::config::ConfigurationError`] if no word list is configured.
    pub fn new(
        settings: WordNamesSettings,
        fetcher: Arc<dyn PageContentFetcher>,
        cache: Arc<dyn SharedCache>,
    ) -> anyhow::Result<Self> {
        let resolver = WordListResolver::new(&settings, fetcher, cache)?;
        Ok(Self::with_resolver(resolver, &settings))
    }

    /// Creates the mapping around an existing resolver.
    pub fn with_resolver(resolver: WordListResolver, settings: &WordNamesSettings) -> Self {
        Self {
            resolver,
            sampler: IdentifierSampler::new(
                usize::try_from(settings.num_words).unwrap_or_default(),
                settings.offset,
            ),
            use_index: settings.use_index,
        }
    }

    /// Returns the word list names are currently sampled from.
    pub async fn word_list(&self) -> ResolvedWordList {
        self.resolver.resolve().await
    }
}

#[async_trait]
impl SerialMapping for WordNamesSerialMapping {
    #[tracing::instrument(level = "debug", skip(self), ret)]
    async fn serial_id_for_index(&self, index: i64) -> String {
        let words = self.resolver.resolve().await;
        self.sampler
            .sample(&words, GenerationRequest::new(index, self.use_index))
    }
}
