//! Scripted content source for loader and cache tests

#![allow(dead_code)]

use async_trait::async_trait;
use quranapi::{ContentSource, Error, Resource, Result};
use serde_json::{Value, json};
use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;

/// Serves one chapter of `total` verses and records every request
pub struct FakeSource {
    pub chapter: u32,
    pub total: u32,
    failing: Mutex<HashSet<u32>>,
    metadata_fails: bool,
    delay: Option<Duration>,
    reverse_step: Option<Duration>,
    requests: Mutex<Vec<Resource>>,
    completed: Mutex<Vec<u32>>,
}

impl FakeSource {
    pub fn new(chapter: u32, total: u32) -> Self {
        Self {
            chapter,
            total,
            failing: Mutex::new(HashSet::new()),
            metadata_fails: false,
            delay: None,
            reverse_step: None,
            requests: Mutex::new(Vec::new()),
            completed: Mutex::new(Vec::new()),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Verse `n` answers after `step * (total + 1 - n)`: later verses first
    pub fn with_reverse_delay(mut self, step: Duration) -> Self {
        self.reverse_step = Some(step);
        self
    }

    pub fn with_failing_metadata(mut self) -> Self {
        self.metadata_fails = true;
        self
    }

    pub fn fail_verse(&self, verse: u32) {
        self.failing.lock().unwrap().insert(verse);
    }

    pub fn heal_verse(&self, verse: u32) {
        self.failing.lock().unwrap().remove(&verse);
    }

    pub fn requests(&self) -> Vec<Resource> {
        self.requests.lock().unwrap().clone()
    }

    /// Verse numbers requested so far, in request order
    pub fn verse_requests(&self) -> Vec<u32> {
        self.requests()
            .into_iter()
            .filter_map(|r| match r {
                Resource::Verse { verse, .. } => Some(verse),
                _ => None,
            })
            .collect()
    }

    /// Verse numbers in the order their responses were produced
    pub fn completed_verses(&self) -> Vec<u32> {
        self.completed.lock().unwrap().clone()
    }

    pub fn clear_requests(&self) {
        self.requests.lock().unwrap().clear();
        self.completed.lock().unwrap().clear();
    }
}

#[async_trait]
impl ContentSource for FakeSource {
    async fn fetch(&self, resource: &Resource) -> Result<Value> {
        self.requests.lock().unwrap().push(*resource);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let (Some(step), Resource::Verse { verse, .. }) = (self.reverse_step, resource) {
            tokio::time::sleep(step * (self.total + 1).saturating_sub(*verse)).await;
        }

        match *resource {
            Resource::ChapterList => Ok(json!([
                {"surahName": "Al-Faatiha", "revelationPlace": "Mecca", "totalAyah": 7}
            ])),
            Resource::ChapterMetadata { chapter } => {
                if self.metadata_fails || chapter != self.chapter {
                    return Err(Error::status(format!("{}.json", chapter), 404));
                }
                Ok(json!({"surahName": "Test", "totalAyah": self.total}))
            }
            Resource::Verse { chapter, verse } => {
                if self.failing.lock().unwrap().contains(&verse) {
                    return Err(Error::status(format!("{}/{}.json", chapter, verse), 500));
                }
                self.completed.lock().unwrap().push(verse);
                Ok(json!({
                    "surahNo": chapter,
                    "ayahNo": verse,
                    "arabic1": format!("verse {}:{}", chapter, verse)
                }))
            }
        }
    }
}
