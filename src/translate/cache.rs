use dashmap::DashMap;
use std::collections::HashMap;
use tracing::debug;

type CacheKey = (String, String);

struct CacheEntry {
    translations: HashMap<String, String>,
    /// Number of fan-outs currently merging into this entry
    in_flight: usize,
}

/// Bounded cache of translations keyed by (source language, exact text)
///
/// Entries are built incrementally: a fan-out marks the key in flight,
/// runs only the missing languages, and merges the successes back in.
/// When the cache is full an arbitrary batch of entries is evicted,
/// skipping any entry with an in-flight merge so the merge is never
/// lost. Synchronization is internal to the map and independent of any
/// session lock.
pub struct TranslationCache {
    entries: DashMap<CacheKey, CacheEntry>,
    capacity: usize,
}

impl TranslationCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: DashMap::new(),
            capacity: capacity.max(1),
        }
    }

    /// Split the requested languages into (already cached, still missing)
    pub fn lookup(
        &self,
        source_language: &str,
        text: &str,
        target_languages: &[String],
    ) -> (HashMap<String, String>, Vec<String>) {
        let key = (source_language.to_string(), text.to_string());
        let mut known = HashMap::new();
        let mut missing = Vec::new();

        match self.entries.get(&key) {
            Some(entry) => {
                for language in target_languages {
                    match entry.translations.get(language) {
                        Some(translated) => {
                            known.insert(language.clone(), translated.clone());
                        }
                        None => missing.push(language.clone()),
                    }
                }
            }
            None => missing.extend(target_languages.iter().cloned()),
        }

        (known, missing)
    }

    /// Mark the key in flight before issuing translation calls; creates
    /// the entry so eviction cannot race the pending merge
    pub fn begin_merge(&self, source_language: &str, text: &str) {
        self.evict_if_full();

        let key = (source_language.to_string(), text.to_string());
        self.entries
            .entry(key)
            .or_insert_with(|| CacheEntry {
                translations: HashMap::new(),
                in_flight: 0,
            })
            .in_flight += 1;
    }

    /// Merge successful translations and release the in-flight mark
    pub fn complete_merge(
        &self,
        source_language: &str,
        text: &str,
        translations: &HashMap<String, String>,
    ) {
        let key = (source_language.to_string(), text.to_string());
        if let Some(mut entry) = self.entries.get_mut(&key) {
            entry
                .translations
                .extend(translations.iter().map(|(k, v)| (k.clone(), v.clone())));
            entry.in_flight = entry.in_flight.saturating_sub(1);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn evict_if_full(&self) {
        if self.entries.len() < self.capacity {
            return;
        }

        let batch = (self.capacity / 10).max(1);
        let victims: Vec<CacheKey> = self
            .entries
            .iter()
            .filter(|entry| entry.value().in_flight == 0)
            .take(batch)
            .map(|entry| entry.key().clone())
            .collect();

        for key in &victims {
            // Re-check under the shard lock; a merge may have started
            self.entries.remove_if(key, |_, entry| entry.in_flight == 0);
        }

        debug!("Translation cache evicted {} entries", victims.len());
    }
}
