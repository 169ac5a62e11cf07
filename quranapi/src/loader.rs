//! Incremental verse loader
//!
//! A chapter is read in batches: the loader fetches its metadata to learn the
//! verse count, then fetches verses `batch_size` at a time as the reader
//! scrolls. Each batch issues one concurrent fetch per verse and only
//! appends once every fetch has settled, so `verses` is always the
//! contiguous prefix `1..=loaded_up_to`.
//!
//! ```text
//! Uninitialized ─► LoadingMetadata ─► LoadingBatch ⇄ Idle ─► Complete
//!                        │                 │
//!                        ▼                 ▼
//!                     Aborted          ErrorPaused ─(retry)─► LoadingBatch
//! ```
//!
//! At most one batch is in flight per loader. The claim is taken under a
//! lock before any request goes out and released by a drop guard, so a
//! batch future dropped mid-flight leaves the loader ready for the next
//! trigger.

use crate::cache::ContentCache;
use crate::error::{Error, Result};
use crate::models::{ChapterMetadata, Verse};
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use std::ops::RangeInclusive;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, error, info, warn};

/// Verses fetched per batch
pub const DEFAULT_BATCH_SIZE: u32 = 10;

/// How close to the end of the loaded verses a visible item must be to
/// trigger the next batch
pub const DEFAULT_PREFETCH_DISTANCE: usize = 3;

/// Lifecycle of a reading session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoaderState {
    #[default]
    Uninitialized,
    LoadingMetadata,
    LoadingBatch,
    Idle,
    /// The last batch failed; waiting for [`VerseLoader::retry`]
    ErrorPaused,
    /// Every verse is loaded
    Complete,
    /// Metadata could not be loaded; the session is over
    Aborted,
}

/// What a trigger did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A batch covering these verse numbers was appended
    Loaded(RangeInclusive<u32>),
    /// Nothing was requested; the loader was in this state
    Skipped(LoaderState),
}

#[derive(Debug, Default)]
struct Session {
    state: LoaderState,
    metadata: Option<ChapterMetadata>,
    total_verse_count: Option<u32>,
    loaded_up_to: u32,
    verses: Vec<Verse>,
    in_flight: bool,
    last_batch_failed: bool,
}

/// Restores `fallback` if the state is still `expected` when dropped
///
/// Covers futures dropped while awaiting the network. Completed operations
/// disarm the guard before writing their own final state.
struct StateGuard<'a> {
    session: &'a Mutex<Session>,
    expected: LoaderState,
    fallback: LoaderState,
    armed: bool,
}

impl<'a> StateGuard<'a> {
    fn new(session: &'a Mutex<Session>, expected: LoaderState, fallback: LoaderState) -> Self {
        Self {
            session,
            expected,
            fallback,
            armed: true,
        }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for StateGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut session = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        if session.state == self.expected {
            debug!(
                "Abandoned {:?}, falling back to {:?}",
                self.expected, self.fallback
            );
            session.state = self.fallback;
            session.in_flight = false;
        }
    }
}

/// Loads the verses of one chapter in batches
pub struct VerseLoader {
    cache: ContentCache,
    chapter_number: u32,
    batch_size: u32,
    prefetch_distance: usize,
    session: Mutex<Session>,
}

impl VerseLoader {
    pub fn new(cache: ContentCache, chapter_number: u32) -> Self {
        Self {
            cache,
            chapter_number,
            batch_size: DEFAULT_BATCH_SIZE,
            prefetch_distance: DEFAULT_PREFETCH_DISTANCE,
            session: Mutex::new(Session::default()),
        }
    }

    /// Sets the number of verses per batch (at least 1)
    pub fn with_batch_size(mut self, batch_size: u32) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_prefetch_distance(mut self, distance: usize) -> Self {
        self.prefetch_distance = distance;
        self
    }

    fn lock(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ========================================================================
    // Triggers
    // ========================================================================

    /// Loads the chapter metadata, then the first batch
    ///
    /// Only acts from `Uninitialized`. A metadata failure aborts the session
    /// and is returned; a failure of the first batch pauses it like any
    /// other batch.
    pub async fn start(&self) -> Result<LoadOutcome> {
        {
            let mut session = self.lock();
            if session.state != LoaderState::Uninitialized {
                return Ok(LoadOutcome::Skipped(session.state));
            }
            if self.chapter_number == 0 {
                session.state = LoaderState::Aborted;
                return Err(Error::InvalidChapter(0));
            }
            session.state = LoaderState::LoadingMetadata;
        }

        info!("Opening chapter {}", self.chapter_number);

        let mut guard = StateGuard::new(
            &self.session,
            LoaderState::LoadingMetadata,
            LoaderState::Uninitialized,
        );
        let result = self.cache.chapter_metadata(self.chapter_number).await;
        guard.disarm();

        let range = {
            let mut session = self.lock();

            let metadata = match result {
                Ok(metadata) => metadata,
                Err(e) => {
                    error!(
                        "Failed to load metadata of chapter {}: {}",
                        self.chapter_number, e
                    );
                    session.state = LoaderState::Aborted;
                    return Err(e);
                }
            };

            let total = metadata.total_verse_count;
            session.total_verse_count = Some(total);
            session.metadata = Some(metadata);

            if total == 0 {
                info!("Chapter {} has no verses", self.chapter_number);
                session.state = LoaderState::Complete;
                return Ok(LoadOutcome::Skipped(LoaderState::Complete));
            }

            match self.claim_batch(&mut session, LoaderState::LoadingMetadata) {
                Ok(range) => range,
                Err(state) => return Ok(LoadOutcome::Skipped(state)),
            }
        };

        self.fetch_batch(range, LoaderState::Idle).await
    }

    /// Loads the next batch
    ///
    /// No-op outside `Idle`, in particular while a batch is in flight.
    pub async fn load_next_batch(&self) -> Result<LoadOutcome> {
        let range = {
            let mut session = self.lock();
            match self.claim_batch(&mut session, LoaderState::Idle) {
                Ok(range) => range,
                Err(state) => {
                    debug!("Next batch skipped in state {:?}", state);
                    return Ok(LoadOutcome::Skipped(state));
                }
            }
        };

        self.fetch_batch(range, LoaderState::Idle).await
    }

    /// Re-issues the batch that failed
    ///
    /// No-op outside `ErrorPaused`.
    pub async fn retry(&self) -> Result<LoadOutcome> {
        let range = {
            let mut session = self.lock();
            match self.claim_batch(&mut session, LoaderState::ErrorPaused) {
                Ok(range) => range,
                Err(state) => return Ok(LoadOutcome::Skipped(state)),
            }
        };

        info!(
            "Retrying verses {}-{} of chapter {}",
            range.start(),
            range.end(),
            self.chapter_number
        );
        self.fetch_batch(range, LoaderState::ErrorPaused).await
    }

    /// Scroll signal: `index` is the last visible verse position (0-based)
    ///
    /// Loads the next batch once it is within the prefetch distance of the
    /// end of the loaded verses.
    pub async fn on_visible_item(&self, index: usize) -> Result<LoadOutcome> {
        let (near_end, state) = {
            let session = self.lock();
            let remaining = session.verses.len().saturating_sub(index.saturating_add(1));
            (remaining <= self.prefetch_distance, session.state)
        };

        if !near_end {
            return Ok(LoadOutcome::Skipped(state));
        }
        self.load_next_batch().await
    }

    // ========================================================================
    // Batches
    // ========================================================================

    /// Claims the next range if the session is in `from` with nothing in
    /// flight, and marks it `LoadingBatch`
    fn claim_batch(
        &self,
        session: &mut Session,
        from: LoaderState,
    ) -> std::result::Result<RangeInclusive<u32>, LoaderState> {
        if session.state != from || session.in_flight {
            return Err(session.state);
        }
        let Some(total) = session.total_verse_count else {
            return Err(session.state);
        };
        if session.loaded_up_to >= total {
            session.state = LoaderState::Complete;
            return Err(LoaderState::Complete);
        }

        let first = session.loaded_up_to + 1;
        let last = session
            .loaded_up_to
            .saturating_add(self.batch_size)
            .min(total);

        session.state = LoaderState::LoadingBatch;
        session.in_flight = true;
        Ok(first..=last)
    }

    async fn fetch_batch(
        &self,
        range: RangeInclusive<u32>,
        fallback: LoaderState,
    ) -> Result<LoadOutcome> {
        let mut guard = StateGuard::new(&self.session, LoaderState::LoadingBatch, fallback);
        let (first, last) = (*range.start(), *range.end());

        debug!(
            "Fetching verses {}-{} of chapter {}",
            first, last, self.chapter_number
        );

        let mut buffer: Vec<Option<Verse>> = vec![None; (last - first + 1) as usize];
        let mut pending: FuturesUnordered<_> = range
            .clone()
            .map(|number| async move {
                let result = self.cache.verse(self.chapter_number, number).await;
                (number, result)
            })
            .collect();

        let mut failure = None;
        while let Some((number, result)) = pending.next().await {
            match result {
                Ok(verse) => buffer[(number - first) as usize] = Some(verse),
                Err(e) => {
                    warn!(
                        "Failed to load verse {}:{}: {}",
                        self.chapter_number, number, e
                    );
                    if failure.is_none() {
                        failure = Some(e);
                    }
                }
            }
        }

        guard.disarm();
        let mut session = self.lock();
        session.in_flight = false;

        if let Some(source) = failure {
            session.state = LoaderState::ErrorPaused;
            session.last_batch_failed = true;
            return Err(Error::BatchLoad {
                chapter: self.chapter_number,
                first,
                last,
                source: Box::new(source),
            });
        }

        session.verses.extend(buffer.into_iter().flatten());
        session.loaded_up_to = last;
        session.last_batch_failed = false;
        session.state = if session.total_verse_count.is_some_and(|total| last >= total) {
            info!("Chapter {} fully loaded", self.chapter_number);
            LoaderState::Complete
        } else {
            LoaderState::Idle
        };

        Ok(LoadOutcome::Loaded(range))
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn chapter_number(&self) -> u32 {
        self.chapter_number
    }

    pub fn batch_size(&self) -> u32 {
        self.batch_size
    }

    pub fn state(&self) -> LoaderState {
        self.lock().state
    }

    pub fn loaded_up_to(&self) -> u32 {
        self.lock().loaded_up_to
    }

    /// `None` until the metadata is loaded
    pub fn total_verse_count(&self) -> Option<u32> {
        self.lock().total_verse_count
    }

    pub fn metadata(&self) -> Option<ChapterMetadata> {
        self.lock().metadata.clone()
    }

    /// Loaded verses, in verse order
    pub fn verses(&self) -> Vec<Verse> {
        self.lock().verses.clone()
    }

    /// A loaded verse by its 1-based number
    pub fn verse(&self, number: u32) -> Option<Verse> {
        let index = number.checked_sub(1)? as usize;
        self.lock().verses.get(index).cloned()
    }

    pub fn is_in_flight(&self) -> bool {
        self.lock().in_flight
    }

    pub fn last_batch_failed(&self) -> bool {
        self.lock().last_batch_failed
    }

    /// Fraction of the chapter loaded, in `[0, 1]`
    pub fn progress(&self) -> f32 {
        let session = self.lock();
        match session.total_verse_count {
            Some(0) => 1.0,
            Some(total) => session.loaded_up_to as f32 / total as f32,
            None => 0.0,
        }
    }
}

impl std::fmt::Debug for VerseLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerseLoader")
            .field("chapter_number", &self.chapter_number)
            .field("batch_size", &self.batch_size)
            .field("session", &*self.lock())
            .finish()
    }
}
