//! Translation fan-out with caching
//!
//! One source utterance becomes a `TranslationSet` covering every
//! language the session's audience currently needs:
//! - `Translator` - single text, single language pair (mockable)
//! - `TranslationCache` - bounded (source language, exact text) cache
//!   with incremental merge
//! - `TranslationPipeline` - concurrent per-language fan-out with
//!   fallback to the source text on individual failures

mod cache;
mod fanout;
pub mod languages;
mod nats;

pub use cache::TranslationCache;
pub use fanout::TranslationPipeline;
pub use nats::NatsTranslator;

use crate::error::RelayResult;
use std::collections::HashMap;

/// Translation capability for one language pair
#[async_trait::async_trait]
pub trait Translator: Send + Sync {
    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> RelayResult<String>;
}

/// Mapping from target language to translated text for one utterance
///
/// The source language always maps to the original text. Languages whose
/// translation failed carry the original text instead and are listed in
/// `degraded`, so partial failure stays observable without being raised.
#[derive(Debug, Clone, Default)]
pub struct TranslationSet {
    pub translations: HashMap<String, String>,
    pub degraded: Vec<String>,
}

impl TranslationSet {
    pub fn get(&self, language: &str) -> Option<&str> {
        self.translations.get(language).map(String::as_str)
    }

    /// Text for the language, or the given fallback when absent
    pub fn text_for<'a>(&'a self, language: &str, fallback: &'a str) -> &'a str {
        self.get(language).unwrap_or(fallback)
    }
}
