//! Quran content settings on top of quranconfig
//!
//! This module provides the `QuranConfigExt` trait, which adds the content
//! API, loader, store and audio settings to `quranconfig::Config`.
//!
//! # Example
//!
//! ```no_run
//! use quranconfig::get_config;
//! use quranapi::QuranConfigExt;
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let config = get_config();
//!
//! let client = config.quran_client_builder()?.build().await?;
//! println!("Using {}", client.base_url());
//! println!("Batches of {}", config.get_loader_batch_size()?);
//! # Ok(())
//! # }
//! ```

use crate::audio::{DEFAULT_AUDIO_CDN, DEFAULT_RECITER};
use crate::client::{ClientBuilder, DEFAULT_BASE_URL, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_USER_AGENT};
use crate::loader::{DEFAULT_BATCH_SIZE, DEFAULT_PREFETCH_DISTANCE};
use anyhow::Result;
use quranconfig::Config;
use serde_yaml::Value;
use std::time::Duration;

const API_PATH: [&str; 2] = ["sources", "quranapi"];
const LOADER_PATH: [&str; 2] = ["sources", "loader"];
const AUDIO_PATH: [&str; 2] = ["sources", "audio"];

/// Default store directory, relative to the config directory
pub const DEFAULT_STORE_DIR: &str = "store";

/// Extension trait for Quran content settings
///
/// # Auto-persist of defaults
///
/// Getters write the default value back into the configuration when the
/// setting is missing.
pub trait QuranConfigExt {
    // ========================================================================
    // Content API
    // ========================================================================

    fn get_quranapi_base_url(&self) -> Result<String>;
    fn set_quranapi_base_url(&self, url: String) -> Result<()>;

    /// HTTP request timeout (default 30 s)
    fn get_quranapi_timeout(&self) -> Result<Duration>;
    fn set_quranapi_timeout(&self, timeout: Duration) -> Result<()>;

    fn get_quranapi_user_agent(&self) -> Result<String>;

    /// A client builder carrying the configured URL, timeout and user agent
    fn quran_client_builder(&self) -> Result<ClientBuilder>;

    // ========================================================================
    // Loader
    // ========================================================================

    /// Verses per batch (default 10, never 0)
    fn get_loader_batch_size(&self) -> Result<u32>;
    fn set_loader_batch_size(&self, batch_size: u32) -> Result<()>;

    /// Prefetch distance in verses (default 3)
    fn get_loader_prefetch_distance(&self) -> Result<usize>;

    // ========================================================================
    // Store
    // ========================================================================

    /// Absolute directory of the persistent store
    ///
    /// Relative paths are resolved against the config directory, which is
    /// where the directory is created if needed.
    fn get_store_dir(&self) -> Result<String>;
    fn set_store_dir(&self, directory: String) -> Result<()>;

    // ========================================================================
    // Audio
    // ========================================================================

    fn get_audio_cdn_base_url(&self) -> Result<String>;

    /// Reciter id looked up in the verses' audio variants
    fn get_audio_reciter(&self) -> Result<String>;
    fn set_audio_reciter(&self, reciter: String) -> Result<()>;
}

fn key<'a>(section: &[&'a str; 2], name: &'a str) -> [&'a str; 3] {
    [section[0], section[1], name]
}

impl QuranConfigExt for Config {
    fn get_quranapi_base_url(&self) -> Result<String> {
        self.get_string_or(&key(&API_PATH, "base_url"), DEFAULT_BASE_URL)
    }

    fn set_quranapi_base_url(&self, url: String) -> Result<()> {
        self.set_value(&key(&API_PATH, "base_url"), Value::String(url))
    }

    fn get_quranapi_timeout(&self) -> Result<Duration> {
        let secs = self.get_u64_or(&key(&API_PATH, "timeout_secs"), DEFAULT_REQUEST_TIMEOUT_SECS)?;
        Ok(Duration::from_secs(secs))
    }

    fn set_quranapi_timeout(&self, timeout: Duration) -> Result<()> {
        self.set_value(
            &key(&API_PATH, "timeout_secs"),
            Value::Number(timeout.as_secs().into()),
        )
    }

    fn get_quranapi_user_agent(&self) -> Result<String> {
        self.get_string_or(&key(&API_PATH, "user_agent"), DEFAULT_USER_AGENT)
    }

    fn quran_client_builder(&self) -> Result<ClientBuilder> {
        Ok(ClientBuilder::new()
            .base_url(self.get_quranapi_base_url()?)
            .timeout(self.get_quranapi_timeout()?)
            .user_agent(self.get_quranapi_user_agent()?))
    }

    fn get_loader_batch_size(&self) -> Result<u32> {
        let size = self.get_u64_or(&key(&LOADER_PATH, "batch_size"), DEFAULT_BATCH_SIZE as u64)?;
        Ok(u32::try_from(size).unwrap_or(u32::MAX).max(1))
    }

    fn set_loader_batch_size(&self, batch_size: u32) -> Result<()> {
        self.set_value(
            &key(&LOADER_PATH, "batch_size"),
            Value::Number(batch_size.into()),
        )
    }

    fn get_loader_prefetch_distance(&self) -> Result<usize> {
        let distance = self.get_u64_or(
            &key(&LOADER_PATH, "prefetch_distance"),
            DEFAULT_PREFETCH_DISTANCE as u64,
        )?;
        Ok(usize::try_from(distance).unwrap_or(usize::MAX))
    }

    fn get_store_dir(&self) -> Result<String> {
        self.get_managed_dir(&["host", "store", "directory"], DEFAULT_STORE_DIR)
    }

    fn set_store_dir(&self, directory: String) -> Result<()> {
        self.set_managed_dir(&["host", "store", "directory"], directory)
    }

    fn get_audio_cdn_base_url(&self) -> Result<String> {
        self.get_string_or(&key(&AUDIO_PATH, "cdn_base_url"), DEFAULT_AUDIO_CDN)
    }

    fn get_audio_reciter(&self) -> Result<String> {
        match self.get_value(&key(&AUDIO_PATH, "reciter")) {
            Ok(Value::String(s)) if !s.is_empty() => Ok(s),
            // YAML reads an unquoted `reciter: 1` as a number
            Ok(Value::Number(n)) => Ok(n.to_string()),
            _ => {
                self.set_audio_reciter(DEFAULT_RECITER.to_string())?;
                Ok(DEFAULT_RECITER.to_string())
            }
        }
    }

    fn set_audio_reciter(&self, reciter: String) -> Result<()> {
        self.set_value(&key(&AUDIO_PATH, "reciter"), Value::String(reciter))
    }
}
