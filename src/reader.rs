//! The page controller. `ReaderState` owns every piece of navigational and
//! presentation state; front ends feed it `ReaderEvent`s, perform the
//! returned `Effect`s and draw its `PageView`.

use crate::catalog::Catalog;
use crate::loader::{
    ChapterLoader, FetchCompletion, LoadError, LoadTicket, RenderedChapter, Resolution,
};
use crate::preferences::{Preferences, Theme};
use crate::router::{self, Fragment, NavControls};
use crate::store::{self, KeyValueStore, keys};
use log::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReaderEvent {
    /// First event of a session, with the initial fragment (may be empty).
    Startup { fragment: String },
    FragmentChanged(String),
    /// Slider, chapter list or any other "go to N" control.
    Navigate(u32),
    Next,
    Previous,
    FetchCompleted(FetchCompletion),
    SetTheme { dark: bool },
    ToggleTheme,
    ChangeFontSize(i32),
    /// Drop the cached copy of the current chapter and load it again.
    Reload,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Fetch(LoadTicket),
    ResetScroll,
    /// Recompute the scroll progress on the next frame.
    ScheduleProgress,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageContent {
    Empty,
    Loading { chapter: u32 },
    Chapter(RenderedChapter),
    NotFound { chapter: u32 },
    LoadFailed { chapter: u32, reason: String },
}

impl PageContent {
    pub fn placeholder_text(&self) -> Option<String> {
        match self {
            PageContent::Empty => Some("No chapter selected.".to_string()),
            PageContent::Loading { chapter } => Some(format!("Loading chapter {chapter}...")),
            PageContent::Chapter(_) => None,
            PageContent::NotFound { chapter } => Some(format!("Chapter {chapter} does not exist.")),
            PageContent::LoadFailed { .. } => Some("Could not load chapter.".to_string()),
        }
    }
}

/// Everything a front end needs to draw the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageView {
    pub content: PageContent,
    pub title: String,
    pub controls: NavControls,
    pub theme: Theme,
    pub font_size_px: u16,
}

pub struct ReaderState {
    loader: ChapterLoader,
    store: Box<dyn KeyValueStore>,
    preferences: Preferences,
    fragment: String,
    current: Option<u32>,
    view: PageView,
}

impl ReaderState {
    /// Reads preferences from the store once; nothing loads until `Startup`.
    pub fn new(loader: ChapterLoader, store: Box<dyn KeyValueStore>) -> Self {
        let preferences = Preferences::load(store.as_ref());
        let controls = NavControls::for_chapter(loader.catalog().first(), loader.catalog());
        Self {
            loader,
            store,
            preferences,
            fragment: String::new(),
            current: None,
            view: PageView {
                content: PageContent::Empty,
                title: String::new(),
                controls,
                theme: preferences.theme,
                font_size_px: preferences.font_size_px,
            },
        }
    }

    pub fn view(&self) -> &PageView {
        &self.view
    }

    pub fn catalog(&self) -> &Catalog {
        self.loader.catalog()
    }

    pub fn preferences(&self) -> Preferences {
        self.preferences
    }

    pub fn current_chapter(&self) -> Option<u32> {
        self.current
    }

    pub fn fragment(&self) -> &str {
        &self.fragment
    }

    pub fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    pub fn last_chapter_persisted(&self) -> Option<u32> {
        store::get_json(self.store.as_ref(), keys::LAST_CHAPTER)
    }

    pub fn handle(&mut self, event: ReaderEvent) -> Vec<Effect> {
        match event {
            ReaderEvent::Startup { fragment } => self.on_startup(&fragment),
            ReaderEvent::FragmentChanged(fragment) => self.on_fragment_changed(fragment),
            ReaderEvent::Navigate(chapter) => self.navigate(chapter),
            ReaderEvent::Next => match router::next_chapter(self.current, self.loader.catalog()) {
                Some(chapter) => self.navigate(chapter),
                None => Vec::new(),
            },
            ReaderEvent::Previous => {
                match router::previous_chapter(self.current, self.loader.catalog()) {
                    Some(chapter) => self.navigate(chapter),
                    None => Vec::new(),
                }
            }
            ReaderEvent::FetchCompleted(completion) => self.on_fetch_completed(completion),
            ReaderEvent::SetTheme { dark } => {
                self.preferences.set_theme(dark, self.store.as_mut());
                self.sync_preferences()
            }
            ReaderEvent::ToggleTheme => {
                self.preferences.toggle_theme(self.store.as_mut());
                self.sync_preferences()
            }
            ReaderEvent::ChangeFontSize(delta) => {
                self.preferences.change_font_size(delta, self.store.as_mut());
                self.sync_preferences()
            }
            ReaderEvent::Reload => self.reload(),
        }
    }

    fn on_startup(&mut self, fragment: &str) -> Vec<Effect> {
        let stored = self.store.get(keys::LAST_CHAPTER);
        let mut effects = vec![Effect::ScheduleProgress];
        match router::resolve_startup(fragment, stored.as_deref()) {
            Some(chapter) if router::parse_fragment(fragment) == Fragment::Absent => {
                info!("No fragment at startup, resuming at chapter {chapter}");
                effects.extend(self.navigate(chapter));
            }
            Some(_) => effects.extend(self.on_fragment_changed(fragment.to_string())),
            None => {
                debug!("Ignoring malformed startup fragment '{fragment}'");
                self.fragment = fragment.to_string();
            }
        }
        effects
    }

    fn navigate(&mut self, chapter: u32) -> Vec<Effect> {
        self.on_fragment_changed(router::fragment_for(chapter))
    }

    fn on_fragment_changed(&mut self, fragment: String) -> Vec<Effect> {
        let parsed = router::parse_fragment(&fragment);
        self.fragment = fragment;
        match parsed {
            Fragment::Chapter(chapter) => self.load(chapter),
            Fragment::Absent | Fragment::Malformed => {
                debug!("Fragment '{}' does not name a chapter", self.fragment);
                Vec::new()
            }
        }
    }

    fn load(&mut self, chapter: u32) -> Vec<Effect> {
        self.current = Some(chapter);
        self.view.controls = NavControls::for_chapter(chapter, self.loader.catalog());

        match self.loader.begin(chapter, self.store.as_ref()) {
            Ok(Resolution::Cached(rendered)) => self.show_chapter(rendered),
            Ok(Resolution::Fetch(ticket)) => {
                self.view.content = PageContent::Loading { chapter };
                self.view.title.clear();
                vec![Effect::Fetch(ticket), Effect::ResetScroll, Effect::ScheduleProgress]
            }
            Err(err) => self.show_failure(chapter, err),
        }
    }

    fn on_fetch_completed(&mut self, completion: FetchCompletion) -> Vec<Effect> {
        let chapter = completion.ticket.chapter;
        match self.loader.complete(completion, self.store.as_mut()) {
            Ok(rendered) => self.show_chapter(rendered),
            Err(LoadError::Stale { .. }) => Vec::new(),
            Err(err) => self.show_failure(chapter, err),
        }
    }

    /// Writes the chapter into the page and only then records it as the
    /// resume point.
    fn show_chapter(&mut self, rendered: RenderedChapter) -> Vec<Effect> {
        info!(
            "Rendered chapter {} ({}{})",
            rendered.number,
            if rendered.title.is_empty() { "untitled" } else { rendered.title.as_str() },
            if rendered.from_cache { ", cached" } else { "" }
        );
        store::set_json(self.store.as_mut(), keys::LAST_CHAPTER, &rendered.number);
        self.view.title = rendered.title.clone();
        self.view.content = PageContent::Chapter(rendered);
        vec![Effect::ResetScroll, Effect::ScheduleProgress]
    }

    fn show_failure(&mut self, chapter: u32, err: LoadError) -> Vec<Effect> {
        self.view.title.clear();
        self.view.content = match err {
            LoadError::NotFound(_) => PageContent::NotFound { chapter },
            other => {
                warn!("{other}");
                PageContent::LoadFailed {
                    chapter,
                    reason: other.to_string(),
                }
            }
        };
        vec![Effect::ResetScroll, Effect::ScheduleProgress]
    }

    fn reload(&mut self) -> Vec<Effect> {
        match self.current {
            Some(chapter) => {
                self.loader.invalidate(chapter, self.store.as_mut());
                self.navigate(chapter)
            }
            None => Vec::new(),
        }
    }

    fn sync_preferences(&mut self) -> Vec<Effect> {
        self.view.theme = self.preferences.theme;
        self.view.font_size_px = self.preferences.font_size_px;
        vec![Effect::ScheduleProgress]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::CommonMarkRenderer;
    use crate::source::FetchError;
    use crate::store::MemoryStore;
    use crate::transform::SpeakerTable;

    fn reader_with(store: MemoryStore, last: u32) -> ReaderState {
        let loader = ChapterLoader::new(
            Catalog::new(last),
            SpeakerTable::default(),
            Box::new(CommonMarkRenderer),
            "v1",
        );
        ReaderState::new(loader, Box::new(store))
    }

    fn fetch_ticket(effects: &[Effect]) -> LoadTicket {
        effects
            .iter()
            .find_map(|e| match e {
                Effect::Fetch(ticket) => Some(*ticket),
                _ => None,
            })
            .expect("expected a fetch effect")
    }

    fn respond(reader: &mut ReaderState, ticket: LoadTicket, text: &str) -> Vec<Effect> {
        reader.handle(ReaderEvent::FetchCompleted(FetchCompletion {
            ticket,
            result: Ok(text.to_string()),
        }))
    }

    #[test]
    fn startup_without_fragment_resumes_stored_chapter() {
        let mut store = MemoryStore::new();
        store.set(keys::LAST_CHAPTER, "3");
        let mut reader = reader_with(store, 5);

        let effects = reader.handle(ReaderEvent::Startup {
            fragment: String::new(),
        });
        assert_eq!(reader.fragment(), "#3");
        assert_eq!(fetch_ticket(&effects).chapter, 3);
        assert_eq!(reader.view().content, PageContent::Loading { chapter: 3 });
    }

    #[test]
    fn startup_defaults_to_first_chapter() {
        let mut reader = reader_with(MemoryStore::new(), 5);
        let effects = reader.handle(ReaderEvent::Startup {
            fragment: String::new(),
        });
        assert_eq!(fetch_ticket(&effects).chapter, 1);
    }

    #[test]
    fn persists_last_chapter_only_after_render() {
        let mut reader = reader_with(MemoryStore::new(), 5);
        let effects = reader.handle(ReaderEvent::FragmentChanged("#2".into()));
        assert_eq!(reader.last_chapter_persisted(), None);

        respond(&mut reader, fetch_ticket(&effects), "# Two");
        assert_eq!(reader.last_chapter_persisted(), Some(2));
        assert_eq!(reader.view().title, "Two");
    }

    #[test]
    fn failed_fetch_shows_placeholder_and_keeps_resume_point() {
        let mut store = MemoryStore::new();
        store.set(keys::LAST_CHAPTER, "1");
        let mut reader = reader_with(store, 5);
        let effects = reader.handle(ReaderEvent::Navigate(4));

        reader.handle(ReaderEvent::FetchCompleted(FetchCompletion {
            ticket: fetch_ticket(&effects),
            result: Err(FetchError::Status {
                status: 503,
                url: "u".into(),
            }),
        }));
        assert!(matches!(
            reader.view().content,
            PageContent::LoadFailed { chapter: 4, .. }
        ));
        assert_eq!(reader.last_chapter_persisted(), Some(1));
        assert_eq!(
            reader.view().content.placeholder_text().as_deref(),
            Some("Could not load chapter.")
        );
    }

    #[test]
    fn malformed_fragment_changes_nothing() {
        let mut reader = reader_with(MemoryStore::new(), 5);
        let effects = reader.handle(ReaderEvent::Navigate(2));
        respond(&mut reader, fetch_ticket(&effects), "# Two");
        let before = reader.view().clone();

        assert!(reader.handle(ReaderEvent::FragmentChanged("#sidebar".into())).is_empty());
        assert_eq!(reader.view(), &before);
        assert_eq!(reader.current_chapter(), Some(2));
    }

    #[test]
    fn next_and_previous_respect_bounds() {
        let mut reader = reader_with(MemoryStore::new(), 2);
        reader.handle(ReaderEvent::Navigate(2));
        assert!(reader.handle(ReaderEvent::Next).is_empty());
        assert_eq!(reader.fragment(), "#2");

        reader.handle(ReaderEvent::Previous);
        assert_eq!(reader.fragment(), "#1");
        assert!(reader.handle(ReaderEvent::Previous).is_empty());
    }

    #[test]
    fn preference_changes_schedule_progress() {
        let mut reader = reader_with(MemoryStore::new(), 2);
        assert_eq!(
            reader.handle(ReaderEvent::ChangeFontSize(2)),
            vec![Effect::ScheduleProgress]
        );
        assert_eq!(reader.view().font_size_px, 20);
        assert_eq!(
            reader.handle(ReaderEvent::SetTheme { dark: true }),
            vec![Effect::ScheduleProgress]
        );
        assert_eq!(reader.view().theme, Theme::Dark);
        assert_eq!(reader.store().get(keys::THEME).as_deref(), Some("dark"));
    }

    #[test]
    fn reload_refetches_current_chapter() {
        let mut reader = reader_with(MemoryStore::new(), 3);
        let effects = reader.handle(ReaderEvent::Navigate(1));
        respond(&mut reader, fetch_ticket(&effects), "# One");

        let cached = reader.handle(ReaderEvent::Navigate(1));
        assert!(cached.iter().all(|e| !matches!(e, Effect::Fetch(_))));

        let reloaded = reader.handle(ReaderEvent::Reload);
        assert_eq!(fetch_ticket(&reloaded).chapter, 1);
    }
}
