//! Builds names like `CherryLuckyTofu42` from a word list.
//!
//! Words are drawn without replacement, capitalized, put into a fresh random
//! order and concatenated. Optionally the index (plus an offset) is appended.
//! Names are not guaranteed to be unique.

use rand::Rng;
use rand::seq::SliceRandom;
use rand::seq::index;

/// Asks for the name belonging to an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationRequest {
    pub index: i64,
    /// Appends `index + offset` to the name if set.
    pub use_index: bool,
}

impl GenerationRequest {
    pub fn new(index: i64, use_index: bool) -> Self {
        Self { index, use_index }
    }
}

/// Samples names with a fixed number of words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentifierSampler {
    num_words: usize,
    offset: i64,
}

impl IdentifierSampler {
    pub fn new(num_words: usize, offset: i64) -> Self {
        Self { num_words, offset }
    }

    /// Generates a name using the thread local random generator.
    pub fn sample(&self, words: &[String], request: GenerationRequest) -> String {
        self.sample_with_rng(words, request, &mut rand::rng())
    }

    /// Generates a name using the given random generator.
    ///
    /// Uses at least one word and never more words than `words` contains.
    pub fn sample_with_rng<R: Rng + ?Sized>(
        &self,
        words: &[String],
        request: GenerationRequest,
        rng: &mut R,
    ) -> String {
        let amount = self.num_words.max(1).min(words.len());

        let mut selected: Vec<String> = index::sample(rng, words.len(), amount)
            .into_iter()
            .map(|position| capitalize_first(&words[position]))
            .collect();
        selected.shuffle(rng);

        let mut name = selected.concat();
        if request.use_index {
            name.push_str(&request.index.saturating_add(self.offset).to_string());
        }

        name
    }
}

/// Upper-cases the first character of `word`, leaving the rest untouched.
pub fn capitalize_first(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
