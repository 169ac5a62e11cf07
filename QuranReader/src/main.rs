mod logs;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use quranapi::{
    ContentCache, LastRead, Library, LoaderState, QuranConfigExt, VerseLoader, search_chapters,
    verse_audio_url,
};
use quranconfig::{Config, get_config};
use quranstore::FileStore;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "quran-reader", version, about = "Read the Quran from the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List chapters
    Chapters {
        /// Only chapters whose name, Arabic name or number matches
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Read a chapter, batch by batch
    Read {
        chapter: u32,
        /// Number of batches to load
        #[arg(short, long, default_value_t = 1)]
        batches: u32,
        /// Print the recitation URL of each verse
        #[arg(long)]
        audio: bool,
        /// Retry a failed batch this many times before giving up
        #[arg(long, default_value_t = 0)]
        retry: u32,
    },
    /// Add or remove a verse bookmark
    Bookmark { chapter: u32, verse: u32 },
    /// List bookmarks
    Bookmarks,
    /// Add or remove a favorite chapter
    Favorite { chapter: u32 },
    /// List favorite chapters
    Favorites,
    /// Show where reading stopped
    LastRead,
    /// Remove every cached payload, keeping bookmarks and favorites
    ClearCache,
}

struct Reader {
    config: Arc<Config>,
    cache: ContentCache,
    library: Library,
}

impl Reader {
    async fn open(config: Arc<Config>) -> Result<Self> {
        let store_dir = config.get_store_dir()?;
        let store = Arc::new(
            FileStore::new(&store_dir)
                .with_context(|| format!("Cannot open store in {}", store_dir))?,
        );
        let client = Arc::new(config.quran_client_builder()?.build().await?);
        info!("Store: {}, API: {}", store_dir, client.base_url());

        Ok(Self {
            cache: ContentCache::new(store.clone(), client),
            library: Library::new(store),
            config,
        })
    }

    async fn chapters(&self, search: Option<String>) -> Result<()> {
        let chapters = self.cache.chapter_list().await?;
        let shown: Vec<_> = match search.as_deref() {
            Some(query) => search_chapters(&chapters, query),
            None => chapters.iter().collect(),
        };

        for chapter in shown {
            println!(
                "{:>3}. {} ({}) - {} verses, {}",
                chapter.chapter_number,
                chapter.name,
                chapter.name_arabic,
                chapter.verse_count,
                chapter.revelation_place
            );
        }
        Ok(())
    }

    async fn read(&self, chapter: u32, batches: u32, audio: bool, retries: u32) -> Result<()> {
        let loader = VerseLoader::new(self.cache.clone(), chapter)
            .with_batch_size(self.config.get_loader_batch_size()?)
            .with_prefetch_distance(self.config.get_loader_prefetch_distance()?);

        let mut result = loader
            .start()
            .await
            .with_context(|| format!("Cannot open chapter {}", chapter))
            .map(|_| ());

        for _ in 1..batches {
            if result.is_err() || loader.state() != LoaderState::Idle {
                break;
            }
            result = loader.load_next_batch().await.map(|_| ()).map_err(Into::into);
        }

        for attempt in 1..=retries {
            if loader.state() != LoaderState::ErrorPaused {
                break;
            }
            warn!("Batch failed, retry {}/{}", attempt, retries);
            result = loader.retry().await.map(|_| ()).map_err(Into::into);
        }

        if loader.state() == LoaderState::ErrorPaused {
            eprintln!(
                "Verses {}-{} failed to load, run again or pass --retry",
                loader.loaded_up_to() + 1,
                loader
                    .loaded_up_to()
                    .saturating_add(loader.batch_size())
                    .min(loader.total_verse_count().unwrap_or_default())
            );
        }

        let Some(metadata) = loader.metadata() else {
            return result;
        };
        let name = metadata.display_name();
        let total = loader.total_verse_count().unwrap_or_default();
        let verses = loader.verses();

        println!("{} ({} verses)\n", name, total);

        let (reciter, cdn) = if audio {
            (
                self.config.get_audio_reciter()?,
                self.config.get_audio_cdn_base_url()?,
            )
        } else {
            Default::default()
        };

        for verse in &verses {
            println!("[{}] {}", verse.reference(), verse.arabic_text);
            if let Some(translation) = &verse.translation_text {
                println!("      {}", translation);
            }
            if audio {
                println!("      {}", verse_audio_url(verse, &reciter, &cdn));
            }
        }

        if let Some(last) = verses.last() {
            self.library
                .save_last_read(&LastRead {
                    chapter_number: chapter,
                    chapter_name: name,
                    verse_number: last.verse_number,
                    total_verses: total,
                })
                .await?;
        }

        if loader.state() != LoaderState::Complete && result.is_ok() {
            println!(
                "\n{}/{} verses loaded, use --batches to read further",
                loader.loaded_up_to(),
                total
            );
        }
        result
    }

    async fn bookmark(&self, chapter: u32, verse: u32) -> Result<()> {
        let metadata = self.cache.chapter_metadata(chapter).await?;
        if verse == 0 || verse > metadata.total_verse_count {
            bail!(
                "Chapter {} has verses 1 to {}",
                chapter,
                metadata.total_verse_count
            );
        }

        let verse = self.cache.verse(chapter, verse).await?;
        if self
            .library
            .toggle_bookmark(&verse, &metadata.display_name())
            .await?
        {
            println!("Bookmarked {}", verse.reference());
        } else {
            println!("Removed bookmark {}", verse.reference());
        }
        Ok(())
    }

    async fn bookmarks(&self) -> Result<()> {
        let bookmarks = self.library.bookmarks().await?;
        if bookmarks.is_empty() {
            println!("No bookmarks");
        }
        for bookmark in bookmarks {
            println!(
                "{} {} {}: {}",
                bookmark.key, bookmark.chapter_name, bookmark.verse_number, bookmark.text
            );
        }
        Ok(())
    }

    async fn favorite(&self, chapter: u32) -> Result<()> {
        let Some(summary) = self
            .cache
            .chapter_list()
            .await?
            .into_iter()
            .find(|c| c.chapter_number == chapter)
        else {
            bail!("No chapter {}", chapter);
        };

        let name = summary.name.clone();
        let favorites = self.library.favorites().await?;
        if favorites.toggle(summary).await {
            println!("Added {} to favorites", name);
        } else {
            println!("Removed {} from favorites", name);
        }
        Ok(())
    }

    async fn favorites(&self) -> Result<()> {
        let favorites = self.library.favorites().await?.list().await;
        if favorites.is_empty() {
            println!("No favorites");
        }
        for chapter in favorites {
            println!("{:>3}. {}", chapter.chapter_number, chapter.name);
        }
        Ok(())
    }

    async fn last_read(&self) -> Result<()> {
        match self.library.last_read().await? {
            Some(last) => println!(
                "{} {}:{} ({:.0}% of the chapter)",
                last.chapter_name,
                last.chapter_number,
                last.verse_number,
                last.progress() * 100.0
            ),
            None => println!("Nothing read yet"),
        }
        Ok(())
    }

    async fn clear_cache(&self) -> Result<()> {
        let removed = self.cache.clear().await;
        println!("Removed {} cached entries", removed);
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = get_config();
    logs::init_logging(&config);

    let reader = Reader::open(config).await?;

    match cli.command {
        Commands::Chapters { search } => reader.chapters(search).await,
        Commands::Read {
            chapter,
            batches,
            audio,
            retry,
        } => reader.read(chapter, batches, audio, retry).await,
        Commands::Bookmark { chapter, verse } => reader.bookmark(chapter, verse).await,
        Commands::Bookmarks => reader.bookmarks().await,
        Commands::Favorite { chapter } => reader.favorite(chapter).await,
        Commands::Favorites => reader.favorites().await,
        Commands::LastRead => reader.last_read().await,
        Commands::ClearCache => reader.clear_cache().await,
    }
}
