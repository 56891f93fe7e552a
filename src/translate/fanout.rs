use super::{TranslationCache, TranslationSet, Translator};
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::warn;

/// Concurrent multi-language translation for one utterance
///
/// The cache is consulted first: a full hit issues no calls, a partial
/// hit requests only the missing languages. Calls run concurrently,
/// bounded by the shared semaphore so a wide session cannot overwhelm
/// the translation collaborator. A failure on one language never fails
/// the others; the failing language falls back to the source text and is
/// recorded on the returned set.
pub struct TranslationPipeline {
    translator: Arc<dyn Translator>,
    cache: TranslationCache,
    limiter: Arc<Semaphore>,
}

impl TranslationPipeline {
    pub fn new(
        translator: Arc<dyn Translator>,
        cache_capacity: usize,
        max_concurrent: usize,
    ) -> Self {
        Self {
            translator,
            cache: TranslationCache::new(cache_capacity),
            limiter: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    pub fn cache(&self) -> &TranslationCache {
        &self.cache
    }

    /// Translate `text` into every requested language
    ///
    /// The source language entry is always the original text and costs
    /// no call.
    pub async fn translate_all(
        &self,
        text: &str,
        source_language: &str,
        target_languages: &[String],
    ) -> TranslationSet {
        let mut set = TranslationSet::default();
        set.translations
            .insert(source_language.to_string(), text.to_string());

        // Nothing to translate; mirror the text into every slot
        if text.trim().is_empty() {
            for language in target_languages {
                set.translations
                    .entry(language.clone())
                    .or_insert_with(|| text.to_string());
            }
            return set;
        }

        let wanted: Vec<String> = target_languages
            .iter()
            .filter(|l| l.as_str() != source_language)
            .cloned()
            .collect();
        if wanted.is_empty() {
            return set;
        }

        let (known, missing) = self.cache.lookup(source_language, text, &wanted);
        set.translations.extend(known);
        if missing.is_empty() {
            return set;
        }

        self.cache.begin_merge(source_language, text);

        let calls = missing.into_iter().map(|language| {
            let translator = Arc::clone(&self.translator);
            let limiter = Arc::clone(&self.limiter);
            let text = text.to_string();
            let source = source_language.to_string();
            async move {
                let _permit = limiter.acquire_owned().await.ok();
                let outcome = translator.translate(&text, &source, &language).await;
                (language, outcome)
            }
        });

        let mut merged: HashMap<String, String> = HashMap::new();
        for (language, outcome) in join_all(calls).await {
            match outcome {
                Ok(translated) => {
                    set.translations.insert(language.clone(), translated.clone());
                    merged.insert(language, translated);
                }
                Err(e) => {
                    warn!("Translation to {} failed, using source text: {}", language, e);
                    set.translations
                        .insert(language.clone(), text.to_string());
                    set.degraded.push(language);
                }
            }
        }

        // Only successes are cached; a transient failure must not pin
        // the source text as that language's translation
        self.cache.complete_merge(source_language, text, &merged);

        set
    }
}
