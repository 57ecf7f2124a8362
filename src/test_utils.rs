use crate::loader::{FetchCompletion, LoadTicket};
use crate::source::{ChapterSource, FetchError};
use std::collections::HashMap;
use std::sync::Mutex;

/// In-memory chapter source. Missing chapters answer with HTTP 404 and
/// every fetch is counted.
#[derive(Default)]
pub struct MapSource {
    chapters: HashMap<u32, String>,
    fetches: Mutex<Vec<u32>>,
}

impl MapSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_chapter(mut self, chapter: u32, text: impl Into<String>) -> Self {
        self.chapters.insert(chapter, text.into());
        self
    }

    /// Chapters 1..=count titled "Chapter N" with a short body.
    pub fn numbered(count: u32) -> Self {
        (1..=count).fold(Self::new(), |source, n| {
            source.with_chapter(n, format!("# Chapter {n}\n\nText of chapter {n}."))
        })
    }

    pub fn fetched(&self) -> Vec<u32> {
        self.fetches.lock().map(|f| f.clone()).unwrap_or_default()
    }
}

impl ChapterSource for MapSource {
    fn fetch(&self, chapter: u32) -> Result<String, FetchError> {
        if let Ok(mut fetches) = self.fetches.lock() {
            fetches.push(chapter);
        }
        self.chapters
            .get(&chapter)
            .cloned()
            .ok_or_else(|| FetchError::Status {
                status: 404,
                url: self.locate(chapter),
            })
    }

    fn locate(&self, chapter: u32) -> String {
        format!("memory://chapter{chapter}.txt")
    }
}

pub mod manual_fetcher {
    use super::*;
    use crate::fetcher::FetchDispatcher;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Queue {
        pending: Vec<LoadTicket>,
        ready: Vec<FetchCompletion>,
    }

    /// Dispatcher whose fetches finish only when the test says so, in
    /// whatever order it chooses.
    pub struct ManualFetcher {
        queue: Rc<RefCell<Queue>>,
    }

    #[derive(Clone)]
    pub struct ManualFetcherHandle {
        queue: Rc<RefCell<Queue>>,
    }

    pub fn manual_fetcher() -> (ManualFetcher, ManualFetcherHandle) {
        let queue = Rc::new(RefCell::new(Queue::default()));
        (
            ManualFetcher {
                queue: Rc::clone(&queue),
            },
            ManualFetcherHandle { queue },
        )
    }

    impl FetchDispatcher for ManualFetcher {
        fn dispatch(&mut self, ticket: LoadTicket) {
            self.queue.borrow_mut().pending.push(ticket);
        }

        fn drain(&mut self) -> Vec<FetchCompletion> {
            std::mem::take(&mut self.queue.borrow_mut().ready)
        }
    }

    impl ManualFetcherHandle {
        pub fn pending(&self) -> Vec<LoadTicket> {
            self.queue.borrow().pending.clone()
        }

        /// Finishes the oldest pending fetch of `chapter`.
        pub fn finish(&self, chapter: u32, result: Result<String, FetchError>) -> LoadTicket {
            let mut queue = self.queue.borrow_mut();
            let index = queue
                .pending
                .iter()
                .position(|t| t.chapter == chapter)
                .unwrap_or_else(|| panic!("no pending fetch for chapter {chapter}"));
            let ticket = queue.pending.remove(index);
            queue.ready.push(FetchCompletion { ticket, result });
            ticket
        }
    }
}

pub mod test_helpers {
    use super::MapSource;
    use crate::catalog::Catalog;
    use crate::fetcher::{FetchDispatcher, InlineFetcher};
    use crate::loader::{ChapterLoader, DEFAULT_CACHE_VERSION};
    use crate::main_app::App;
    use crate::markdown::CommonMarkRenderer;
    use crate::reader::ReaderState;
    use crate::store::{KeyValueStore, MemoryStore};
    use crate::transform::SpeakerTable;
    use ratatui::{Terminal, backend::TestBackend};

    pub fn create_test_terminal(width: u16, height: u16) -> Terminal<TestBackend> {
        let backend = TestBackend::new(width, height);
        Terminal::new(backend).expect("Failed to create test terminal")
    }

    pub fn create_test_loader(last_chapter: u32) -> ChapterLoader {
        ChapterLoader::new(
            Catalog::new(last_chapter),
            SpeakerTable::default(),
            Box::new(CommonMarkRenderer),
            DEFAULT_CACHE_VERSION,
        )
    }

    pub fn create_test_reader(last_chapter: u32, store: Box<dyn KeyValueStore>) -> ReaderState {
        ReaderState::new(create_test_loader(last_chapter), store)
    }

    /// App over `source` with synchronous fetches and an empty memory store.
    pub fn create_test_app(last_chapter: u32, source: MapSource) -> App {
        create_test_app_with(
            last_chapter,
            Box::new(MemoryStore::new()),
            Box::new(InlineFetcher::new(Box::new(source))),
        )
    }

    pub fn create_test_app_with(
        last_chapter: u32,
        store: Box<dyn KeyValueStore>,
        fetcher: Box<dyn FetchDispatcher>,
    ) -> App {
        App::with_reader(create_test_reader(last_chapter, store), fetcher)
    }

    pub fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let mut out = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                out.push_str(buffer[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }
}
