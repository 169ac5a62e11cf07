//! Incremental verse loading scenarios

mod common;

use common::FakeSource;
use quranapi::{ContentCache, Error, LoadOutcome, LoaderState, VerseLoader};
use quranstore::MemoryStore;
use std::sync::Arc;
use std::time::Duration;

fn loader_for(source: Arc<FakeSource>, chapter: u32) -> VerseLoader {
    let cache = ContentCache::new(Arc::new(MemoryStore::new()), source);
    VerseLoader::new(cache, chapter)
}

#[tokio::test]
async fn test_loads_chapter_in_three_batches() {
    let source = Arc::new(FakeSource::new(2, 23));
    let loader = loader_for(source.clone(), 2);

    let mut progress = Vec::new();
    let mut batches = 0;

    assert_eq!(loader.start().await.unwrap(), LoadOutcome::Loaded(1..=10));
    batches += 1;
    progress.push(loader.loaded_up_to());

    while loader.state() == LoaderState::Idle {
        let outcome = loader.load_next_batch().await.unwrap();
        assert!(matches!(outcome, LoadOutcome::Loaded(_)));
        batches += 1;
        progress.push(loader.loaded_up_to());
    }

    assert_eq!(progress, vec![10, 20, 23]);
    assert_eq!(batches, 3);
    assert_eq!(loader.state(), LoaderState::Complete);
    assert_eq!(loader.progress(), 1.0);

    let numbers: Vec<u32> = loader.verses().iter().map(|v| v.verse_number).collect();
    assert_eq!(numbers, (1..=23).collect::<Vec<_>>());
    assert_eq!(
        loader.verse(15).unwrap().arabic_text,
        "verse 2:15".to_string()
    );

    // Complete is terminal
    assert_eq!(
        loader.load_next_batch().await.unwrap(),
        LoadOutcome::Skipped(LoaderState::Complete)
    );
    assert_eq!(source.verse_requests().len(), 23);
}

#[tokio::test]
async fn test_failed_batch_pauses_until_retry() {
    let source = Arc::new(FakeSource::new(2, 23));
    let loader = loader_for(source.clone(), 2);

    loader.start().await.unwrap();
    source.fail_verse(15);
    source.clear_requests();

    let err = loader.load_next_batch().await.unwrap_err();
    assert!(err.is_batch_load());
    assert!(matches!(err, Error::BatchLoad { first: 11, last: 20, .. }));

    // Partial results are discarded
    assert_eq!(loader.loaded_up_to(), 10);
    assert_eq!(loader.verses().len(), 10);
    assert_eq!(loader.state(), LoaderState::ErrorPaused);
    assert!(loader.last_batch_failed());
    assert!(!loader.is_in_flight());

    // Scrolling does nothing while paused
    assert_eq!(
        loader.load_next_batch().await.unwrap(),
        LoadOutcome::Skipped(LoaderState::ErrorPaused)
    );

    // Still failing: same range, still paused. Verses of the range that
    // did arrive were cached, so only the failing one goes back out.
    source.clear_requests();
    let err = loader.retry().await.unwrap_err();
    assert!(matches!(err, Error::BatchLoad { first: 11, last: 20, .. }));
    assert_eq!(source.verse_requests(), vec![15]);
    assert_eq!(loader.state(), LoaderState::ErrorPaused);

    // Healed: the retry goes through
    source.heal_verse(15);
    assert_eq!(loader.retry().await.unwrap(), LoadOutcome::Loaded(11..=20));
    assert_eq!(loader.loaded_up_to(), 20);
    assert_eq!(loader.state(), LoaderState::Idle);
    assert!(!loader.last_batch_failed());
}

#[tokio::test]
async fn test_overlapping_triggers_issue_one_batch() {
    let source = Arc::new(FakeSource::new(3, 40).with_delay(Duration::from_millis(20)));
    let loader = loader_for(source.clone(), 3);

    loader.start().await.unwrap();
    source.clear_requests();

    let (first, second) = tokio::join!(loader.load_next_batch(), loader.load_next_batch());

    assert_eq!(first.unwrap(), LoadOutcome::Loaded(11..=20));
    assert_eq!(
        second.unwrap(),
        LoadOutcome::Skipped(LoaderState::LoadingBatch)
    );
    assert_eq!(source.verse_requests().len(), 10);
    assert_eq!(loader.loaded_up_to(), 20);
}

#[tokio::test]
async fn test_short_chapter_completes_in_one_batch() {
    let source = Arc::new(FakeSource::new(1, 7));
    let loader = loader_for(source.clone(), 1);

    assert_eq!(loader.start().await.unwrap(), LoadOutcome::Loaded(1..=7));
    assert_eq!(loader.state(), LoaderState::Complete);
    assert_eq!(loader.total_verse_count(), Some(7));
    assert_eq!(source.requests().len(), 8);
}

#[tokio::test]
async fn test_empty_chapter_completes_immediately() {
    let source = Arc::new(FakeSource::new(1, 0));
    let loader = loader_for(source.clone(), 1);

    assert_eq!(
        loader.start().await.unwrap(),
        LoadOutcome::Skipped(LoaderState::Complete)
    );
    assert_eq!(loader.state(), LoaderState::Complete);
    assert!(source.verse_requests().is_empty());
}

#[tokio::test]
async fn test_metadata_failure_aborts() {
    let source = Arc::new(FakeSource::new(1, 7).with_failing_metadata());
    let loader = loader_for(source.clone(), 1);

    let err = loader.start().await.unwrap_err();
    assert!(err.is_network());
    assert_eq!(loader.state(), LoaderState::Aborted);

    // Every later trigger is a no-op
    assert_eq!(
        loader.start().await.unwrap(),
        LoadOutcome::Skipped(LoaderState::Aborted)
    );
    assert_eq!(
        loader.load_next_batch().await.unwrap(),
        LoadOutcome::Skipped(LoaderState::Aborted)
    );
    assert_eq!(
        loader.retry().await.unwrap(),
        LoadOutcome::Skipped(LoaderState::Aborted)
    );
    assert!(source.verse_requests().is_empty());
}

#[tokio::test]
async fn test_chapter_zero_is_rejected() {
    let source = Arc::new(FakeSource::new(1, 7));
    let loader = loader_for(source.clone(), 0);

    assert!(matches!(
        loader.start().await,
        Err(Error::InvalidChapter(0))
    ));
    assert_eq!(loader.state(), LoaderState::Aborted);
    assert!(source.requests().is_empty());
}

#[tokio::test]
async fn test_abandoned_metadata_load_resets() {
    let source = Arc::new(FakeSource::new(4, 30).with_delay(Duration::from_secs(5)));
    let loader = loader_for(source, 4);

    let result = tokio::time::timeout(Duration::from_millis(50), loader.start()).await;
    assert!(result.is_err());

    assert_eq!(loader.state(), LoaderState::Uninitialized);
    assert!(!loader.is_in_flight());
    assert_eq!(loader.total_verse_count(), None);
}

#[tokio::test]
async fn test_batch_future_dropped_mid_flight() {
    let source = Arc::new(FakeSource::new(5, 30).with_delay(Duration::from_millis(10)));
    let loader = loader_for(source.clone(), 5);
    loader.start().await.unwrap();
    assert_eq!(loader.loaded_up_to(), 10);

    {
        let pending = loader.load_next_batch();
        let result = tokio::time::timeout(Duration::from_millis(1), pending).await;
        assert!(result.is_err());
    }

    assert!(!loader.is_in_flight());
    assert_eq!(loader.state(), LoaderState::Idle);
    assert_eq!(loader.loaded_up_to(), 10);

    assert_eq!(
        loader.load_next_batch().await.unwrap(),
        LoadOutcome::Loaded(11..=20)
    );
}

#[tokio::test]
async fn test_visible_item_triggers_prefetch() {
    let source = Arc::new(FakeSource::new(6, 30));
    let cache = ContentCache::new(Arc::new(MemoryStore::new()), source.clone());
    let loader = VerseLoader::new(cache, 6)
        .with_batch_size(10)
        .with_prefetch_distance(3);
    loader.start().await.unwrap();

    // Index 5 of 10 loaded: 4 items left, too far from the end
    assert_eq!(
        loader.on_visible_item(5).await.unwrap(),
        LoadOutcome::Skipped(LoaderState::Idle)
    );
    assert_eq!(loader.loaded_up_to(), 10);

    // Index 6: 3 items left
    assert_eq!(
        loader.on_visible_item(6).await.unwrap(),
        LoadOutcome::Loaded(11..=20)
    );
}

#[tokio::test]
async fn test_visible_item_at_max_index() {
    let source = Arc::new(FakeSource::new(6, 30));
    let loader = loader_for(source, 6);
    loader.start().await.unwrap();

    // Past the end counts as at the end
    assert_eq!(
        loader.on_visible_item(usize::MAX).await.unwrap(),
        LoadOutcome::Loaded(11..=20)
    );
}

#[tokio::test]
async fn test_verses_stay_ordered_when_answers_arrive_reversed() {
    let source = Arc::new(FakeSource::new(8, 10).with_reverse_delay(Duration::from_millis(5)));
    let loader = loader_for(source.clone(), 8);

    assert_eq!(loader.start().await.unwrap(), LoadOutcome::Loaded(1..=10));

    let completed = source.completed_verses();
    assert_eq!(completed, (1..=10).rev().collect::<Vec<_>>());

    let numbers: Vec<u32> = loader.verses().iter().map(|v| v.verse_number).collect();
    assert_eq!(numbers, (1..=10).collect::<Vec<_>>());
    for verse in loader.verses() {
        assert_eq!(verse.arabic_text, format!("verse 8:{}", verse.verse_number));
    }
}

#[tokio::test]
async fn test_batch_size_is_configurable() {
    let source = Arc::new(FakeSource::new(7, 9));
    let cache = ContentCache::new(Arc::new(MemoryStore::new()), source.clone());
    let loader = VerseLoader::new(cache, 7).with_batch_size(4);

    assert_eq!(loader.start().await.unwrap(), LoadOutcome::Loaded(1..=4));
    assert_eq!(
        loader.load_next_batch().await.unwrap(),
        LoadOutcome::Loaded(5..=8)
    );
    assert_eq!(
        loader.load_next_batch().await.unwrap(),
        LoadOutcome::Loaded(9..=9)
    );
    assert_eq!(loader.state(), LoaderState::Complete);
}
