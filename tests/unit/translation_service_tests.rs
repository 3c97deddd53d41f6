/*!
 * Tests for the translation and filler services
 */

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use smartdub::providers::mock::MockProvider;
use smartdub::timeline;
use smartdub::translation_service::{narration_text, TranslationService};
use crate::common;

#[tokio::test]
async fn test_translateSequence_withIntermittentProvider_shouldFallBackPerEntry() {
    common::init_logging();
    let sequence = timeline::parse(common::FINE_GRAINED_TIMELINE);
    let provider = Arc::new(MockProvider::intermittent(2));
    let service = TranslationService::new(provider.clone(), "English", "French", 1);

    let (translated, summary) = service.translate_sequence(&sequence, |_, _| {}).await;

    assert_eq!(summary.translated, 3);
    assert_eq!(summary.fallbacks, 3);
    assert_eq!(provider.request_count(), 6);
    // Sequential requests: every second one fails
    assert_eq!(translated.entries[0].text, "[French] Hello");
    assert_eq!(translated.entries[1].text, "and welcome to");
    assert_eq!(translated.len(), sequence.len());
}

#[tokio::test]
async fn test_translateSequence_withEmptyResponses_shouldKeepOriginalText() {
    let sequence = timeline::parse(common::FINE_GRAINED_TIMELINE);
    let service = TranslationService::new(Arc::new(MockProvider::empty()), "English", "German", 3);

    let (translated, summary) = service.translate_sequence(&sequence, |_, _| {}).await;

    assert_eq!(summary.fallbacks, sequence.len());
    assert_eq!(translated, sequence);
}

#[tokio::test]
async fn test_translateSequence_withSlowProvider_shouldPreserveOrderAndTiming() {
    let sequence = timeline::parse(common::FINE_GRAINED_TIMELINE);
    let provider = MockProvider::slow(20).with_custom_response(|text| text.to_uppercase());
    let service = TranslationService::new(Arc::new(provider), "English", "Shouting", 4);
    let calls = AtomicUsize::new(0);

    let (translated, _) = service
        .translate_sequence(&sequence, |done, total| {
            assert!(done <= total);
            calls.fetch_add(1, Ordering::SeqCst);
        })
        .await;

    assert_eq!(calls.load(Ordering::SeqCst), sequence.len());
    for (original, output) in sequence.iter().zip(translated.iter()) {
        assert_eq!(output.text, original.text.to_uppercase());
        assert_eq!(output.start, original.start);
        assert_eq!(output.end, original.end);
    }
}

#[tokio::test]
async fn test_addFillerWords_withoutSuggester_shouldReturnInput() {
    let sequence = timeline::parse(common::FINE_GRAINED_TIMELINE);
    let service = TranslationService::new(Arc::new(MockProvider::working()), "English", "Spanish", 1);

    let (filled, summary) = service.add_filler_words(&sequence).await;

    assert_eq!(filled, sequence);
    assert_eq!(summary.fillers_added, 0);
}

#[tokio::test]
async fn test_addFillerWords_withFailingSuggester_shouldLeaveWordAlone() {
    let sequence = timeline::parse(common::FINE_GRAINED_TIMELINE);
    let service = TranslationService::new(Arc::new(MockProvider::working()), "English", "Spanish", 1)
        .with_filler(Arc::new(MockProvider::failing()));

    let (filled, summary) = service.add_filler_words(&sequence).await;

    assert_eq!(summary.single_word_entries, 1);
    assert_eq!(summary.fillers_added, 0);
    assert_eq!(filled.entries[0].text, "Hello");
}

#[tokio::test]
async fn test_addFillerWords_shouldUseTargetLanguageSuggestion() {
    let sequence = timeline::parse(common::FINE_GRAINED_TIMELINE);
    let filler = Arc::new(MockProvider::working().with_filler("  Pues "));
    let service = TranslationService::new(Arc::new(MockProvider::working()), "English", "Spanish", 1)
        .with_filler(filler.clone());

    let (filled, summary) = service.add_filler_words(&sequence).await;

    assert_eq!(service.target_language(), "Spanish");
    assert_eq!(summary.fillers_added, 1);
    assert_eq!(filler.request_count(), 1);
    assert_eq!(filled.entries[0].text, "Pues Hello");
    assert_eq!(narration_text(&filled).split_whitespace().count(), sequence.total_words() + 1);
}
