use crate::catalog::Catalog;
use crate::markdown::{self, MarkdownRenderer};
use crate::source::FetchError;
use crate::store::{KeyValueStore, keys};
use crate::transform::{self, SpeakerTable};
use log::{debug, info, warn};
use thiserror::Error;

pub const DEFAULT_CACHE_VERSION: &str = "v1";

/// Issued for every load that needs the network. Only the ticket carrying
/// the latest sequence number may render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    pub seq: u64,
    pub chapter: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchCompletion {
    pub ticket: LoadTicket,
    pub result: Result<String, FetchError>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedChapter {
    pub number: u32,
    pub title: String,
    pub html: String,
    pub from_cache: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Cached(RenderedChapter),
    Fetch(LoadTicket),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("chapter {0} is not in the catalog")]
    NotFound(u32),
    #[error("could not load chapter {chapter}: {source}")]
    Fetch { chapter: u32, source: FetchError },
    #[error("load #{seq} of chapter {chapter} was superseded")]
    Stale { chapter: u32, seq: u64 },
}

pub struct ChapterLoader {
    catalog: Catalog,
    speakers: SpeakerTable,
    renderer: Box<dyn MarkdownRenderer>,
    cache_version: String,
    seq: u64,
}

impl ChapterLoader {
    pub fn new(
        catalog: Catalog,
        speakers: SpeakerTable,
        renderer: Box<dyn MarkdownRenderer>,
        cache_version: impl Into<String>,
    ) -> Self {
        Self {
            catalog,
            speakers,
            renderer,
            cache_version: cache_version.into(),
            seq: 0,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn cache_version(&self) -> &str {
        &self.cache_version
    }

    /// Sequence number of the most recently started load.
    pub fn current_seq(&self) -> u64 {
        self.seq
    }

    pub fn is_current(&self, ticket: &LoadTicket) -> bool {
        ticket.seq == self.seq
    }

    /// Starts a load. Every call supersedes whatever load was in flight, even
    /// when it resolves immediately from the catalog check or the cache.
    pub fn begin(
        &mut self,
        chapter: u32,
        store: &dyn KeyValueStore,
    ) -> Result<Resolution, LoadError> {
        self.seq += 1;

        if !self.catalog.contains(chapter) {
            info!(
                "Chapter {chapter} outside catalog 1..={}",
                self.catalog.last()
            );
            return Err(LoadError::NotFound(chapter));
        }

        let key = keys::chapter_cache(&self.cache_version, chapter);
        if let Some(raw) = store.get(&key) {
            debug!("Cache hit for chapter {chapter} ({key})");
            return Ok(Resolution::Cached(self.render_text(chapter, &raw, true)));
        }

        Ok(Resolution::Fetch(LoadTicket {
            seq: self.seq,
            chapter,
        }))
    }

    /// Resolves a fetch. Stale completions are rejected before anything is
    /// written, so they never reach the cache or the page.
    pub fn complete(
        &mut self,
        completion: FetchCompletion,
        store: &mut dyn KeyValueStore,
    ) -> Result<RenderedChapter, LoadError> {
        let FetchCompletion { ticket, result } = completion;
        if !self.is_current(&ticket) {
            debug!(
                "Discarding load #{} of chapter {} (current #{})",
                ticket.seq, ticket.chapter, self.seq
            );
            return Err(LoadError::Stale {
                chapter: ticket.chapter,
                seq: ticket.seq,
            });
        }

        let text = result.map_err(|source| {
            warn!("Fetch of chapter {} failed: {}", ticket.chapter, source);
            LoadError::Fetch {
                chapter: ticket.chapter,
                source,
            }
        })?;

        let raw = text.trim();
        store.set(
            &keys::chapter_cache(&self.cache_version, ticket.chapter),
            raw,
        );
        Ok(self.render_text(ticket.chapter, raw, false))
    }

    pub fn invalidate(&self, chapter: u32, store: &mut dyn KeyValueStore) {
        store.remove(&keys::chapter_cache(&self.cache_version, chapter));
    }

    fn render_text(&self, chapter: u32, raw: &str, from_cache: bool) -> RenderedChapter {
        let transformed = transform::transform(raw.trim(), &self.speakers);
        let html = self.renderer.render(&transformed);
        let title = markdown::extract_title(&html);
        RenderedChapter {
            number: chapter,
            title,
            html,
            from_cache,
        }
    }
}
