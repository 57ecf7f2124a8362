use crate::loader::{FetchCompletion, LoadTicket};
use crate::source::ChapterSource;
use log::{debug, error};
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::thread;

/// Runs fetch tickets and hands back their completions. The UI loop calls
/// `drain` once per tick; completions may arrive in any order.
pub trait FetchDispatcher {
    fn dispatch(&mut self, ticket: LoadTicket);
    fn drain(&mut self) -> Vec<FetchCompletion>;
}

/// One short-lived thread per fetch, results over a channel. Nothing is
/// cancelled; superseded results are dropped by the loader on arrival.
pub struct ThreadedFetcher {
    source: Arc<dyn ChapterSource>,
    tx: Sender<FetchCompletion>,
    rx: Receiver<FetchCompletion>,
}

impl ThreadedFetcher {
    pub fn new(source: Arc<dyn ChapterSource>) -> Self {
        let (tx, rx) = channel();
        Self { source, tx, rx }
    }
}

impl FetchDispatcher for ThreadedFetcher {
    fn dispatch(&mut self, ticket: LoadTicket) {
        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();
        debug!(
            "Fetching chapter {} (load #{}) from {}",
            ticket.chapter,
            ticket.seq,
            source.locate(ticket.chapter)
        );
        let spawned = thread::Builder::new()
            .name(format!("fetch-chapter-{}", ticket.chapter))
            .spawn(move || {
                let result = source.fetch(ticket.chapter);
                // The receiver only goes away when the app is shutting down.
                let _ = tx.send(FetchCompletion { ticket, result });
            });
        if let Err(e) = spawned {
            error!("Failed to spawn fetch thread: {e}");
        }
    }

    fn drain(&mut self) -> Vec<FetchCompletion> {
        self.rx.try_iter().collect()
    }
}

/// Fetches synchronously inside `dispatch`; completions surface on the next
/// `drain` in dispatch order.
pub struct InlineFetcher {
    source: Box<dyn ChapterSource>,
    ready: VecDeque<FetchCompletion>,
}

impl InlineFetcher {
    pub fn new(source: Box<dyn ChapterSource>) -> Self {
        Self {
            source,
            ready: VecDeque::new(),
        }
    }
}

impl FetchDispatcher for InlineFetcher {
    fn dispatch(&mut self, ticket: LoadTicket) {
        let result = self.source.fetch(ticket.chapter);
        self.ready.push_back(FetchCompletion { ticket, result });
    }

    fn drain(&mut self) -> Vec<FetchCompletion> {
        self.ready.drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::FetchError;
    use std::time::{Duration, Instant};

    struct EchoSource;

    impl ChapterSource for EchoSource {
        fn fetch(&self, chapter: u32) -> Result<String, FetchError> {
            if chapter == 13 {
                Err(FetchError::Status {
                    status: 500,
                    url: self.locate(chapter),
                })
            } else {
                Ok(format!("# Chapter {chapter}"))
            }
        }

        fn locate(&self, chapter: u32) -> String {
            format!("echo://{chapter}")
        }
    }

    #[test]
    fn threaded_fetcher_delivers_every_ticket() {
        let mut fetcher = ThreadedFetcher::new(Arc::new(EchoSource));
        fetcher.dispatch(LoadTicket { seq: 1, chapter: 4 });
        fetcher.dispatch(LoadTicket { seq: 2, chapter: 13 });

        let mut done = Vec::new();
        let deadline = Instant::now() + Duration::from_secs(5);
        while done.len() < 2 && Instant::now() < deadline {
            done.extend(fetcher.drain());
            thread::sleep(Duration::from_millis(5));
        }
        done.sort_by_key(|c| c.ticket.seq);

        assert_eq!(done.len(), 2);
        assert_eq!(done[0].result, Ok("# Chapter 4".to_string()));
        assert!(done[1].result.is_err());
    }

    #[test]
    fn inline_fetcher_preserves_dispatch_order() {
        let mut fetcher = InlineFetcher::new(Box::new(EchoSource));
        fetcher.dispatch(LoadTicket { seq: 1, chapter: 1 });
        fetcher.dispatch(LoadTicket { seq: 2, chapter: 2 });
        let seqs: Vec<u64> = fetcher.drain().iter().map(|c| c.ticket.seq).collect();
        assert_eq!(seqs, vec![1, 2]);
        assert!(fetcher.drain().is_empty());
    }
}
