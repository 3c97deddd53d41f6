use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures::stream::{self, StreamExt};
use log::{debug, info, warn};

use crate::providers::{FillerSuggester, Translator};
use crate::timeline::{TimedEntry, TimedSequence};

// @module: Text services over timed sequences (translation, filler words, narration)

// @struct: Counters for one translation pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationSummary {
    // @field: Entries translated by the service
    pub translated: usize,

    // @field: Entries kept in the source language after a failure
    pub fallbacks: usize,
}

// @struct: Counters for one filler pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FillerSummary {
    // @field: Single-word entries seen
    pub single_word_entries: usize,

    // @field: Entries that received a filler word
    pub fillers_added: usize,
}

// @struct: Translation and enrichment of timed sequences
pub struct TranslationService {
    translator: Arc<dyn Translator>,
    filler: Option<Arc<dyn FillerSuggester>>,
    source_language: String,
    target_language: String,
    concurrent_requests: usize,
}

impl TranslationService {
    // @creates: Service without filler support
    // @params: Languages as they should appear in prompts (e.g. "English")
    pub fn new(
        translator: Arc<dyn Translator>,
        source_language: impl Into<String>,
        target_language: impl Into<String>,
        concurrent_requests: usize,
    ) -> Self {
        Self {
            translator,
            filler: None,
            source_language: source_language.into(),
            target_language: target_language.into(),
            concurrent_requests: concurrent_requests.max(1),
        }
    }

    // @configures: Filler suggester used by add_filler_words
    pub fn with_filler(mut self, filler: Arc<dyn FillerSuggester>) -> Self {
        self.filler = Some(filler);
        self
    }

    pub fn target_language(&self) -> &str {
        &self.target_language
    }

    /// Translate every entry's text, keeping timing untouched.
    ///
    /// Requests run with bounded concurrency; output order matches input
    /// order. A failed or empty translation keeps the original text.
    pub async fn translate_sequence<F>(&self, sequence: &TimedSequence, progress: F) -> (TimedSequence, TranslationSummary)
    where
        F: Fn(usize, usize) + Send + Sync,
    {
        let total = sequence.len();
        let done = AtomicUsize::new(0);
        let progress = &progress;
        let done = &done;

        info!(
            "Translating {} entries from {} to {}",
            total, self.source_language, self.target_language
        );

        let results: Vec<(TimedEntry, bool)> = stream::iter(sequence.iter())
            .map(|entry| async move {
                let result = self
                    .translator
                    .translate(&entry.text, &self.source_language, &self.target_language)
                    .await;

                let translated = match result {
                    Ok(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
                    Ok(_) => {
                        warn!("Empty translation for entry {}, keeping original text", entry.index);
                        None
                    }
                    Err(e) => {
                        warn!("Translation failed for entry {}: {}. Keeping original text", entry.index, e);
                        None
                    }
                };

                progress(done.fetch_add(1, Ordering::SeqCst) + 1, total);

                match translated {
                    Some(text) => (TimedEntry::new(entry.index, entry.start, entry.end, text), true),
                    None => (entry.clone(), false),
                }
            })
            .buffered(self.concurrent_requests)
            .collect()
            .await;

        let mut summary = TranslationSummary::default();
        let entries = results
            .into_iter()
            .map(|(entry, ok)| {
                if ok {
                    summary.translated += 1;
                } else {
                    summary.fallbacks += 1;
                }
                entry
            })
            .collect();

        if summary.fallbacks > 0 {
            warn!("{} of {} entries kept their original text", summary.fallbacks, total);
        }

        (TimedSequence::from_entries(entries), summary)
    }

    /// Prefix single-word entries with a natural filler word.
    ///
    /// Entries with more than one word are left alone, as are entries whose
    /// suggestion fails or comes back empty.
    pub async fn add_filler_words(&self, sequence: &TimedSequence) -> (TimedSequence, FillerSummary) {
        let mut summary = FillerSummary::default();

        let Some(filler) = &self.filler else {
            debug!("No filler suggester configured, skipping filler words");
            return (sequence.clone(), summary);
        };

        let mut entries = Vec::with_capacity(sequence.len());
        for entry in sequence.iter() {
            let mut entry = entry.clone();

            if entry.word_count() == 1 {
                summary.single_word_entries += 1;
                let word = entry.text.trim().to_string();

                match filler.suggest_filler(&word, &self.target_language).await {
                    Ok(suggestion) if !suggestion.trim().is_empty() => {
                        entry.text = format!("{} {}", suggestion.trim(), word);
                        summary.fillers_added += 1;
                    }
                    Ok(_) => debug!("Empty filler suggestion for '{}'", word),
                    Err(e) => warn!("Filler word error for '{}': {}", word, e),
                }
            }

            entries.push(entry);
        }

        info!(
            "Added {} filler words to {} single-word entries",
            summary.fillers_added, summary.single_word_entries
        );

        (TimedSequence::from_entries(entries), summary)
    }
}

/// Text handed to speech synthesis: every entry's text joined with single spaces
pub fn narration_text(sequence: &TimedSequence) -> String {
    sequence.joined_text()
}
