use crate::event_source::EventSource;
use crate::fetcher::FetchDispatcher;
use crate::gesture::{self, Swipe};
use crate::loader::ChapterLoader;
use crate::markdown::CommonMarkRenderer;
use crate::preferences::FONT_SIZE_STEP;
use crate::progress::ProgressIndicator;
use crate::reader::{Effect, PageContent, ReaderEvent, ReaderState};
use crate::router;
use crate::scrollbar::{self, Scrollbar, Step};
use crate::settings::Settings;
use crate::store::KeyValueStore;
use crate::theme::palette_for;
use crate::widget::chapter_list::{ChapterList, ChapterListAction};
use crate::widget::chapter_view::{ChapterView, Overlay};
use crate::widget::fragment_prompt::{FragmentPrompt, FragmentPromptAction};

use anyhow::Result;
use crossterm::event::{Event, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use log::{debug, info};
use ratatui::{
    Terminal,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Paragraph},
};
use std::time::{Duration, Instant};

const WHEEL_LINES: isize = 3;
const SLIDER_WIDTH: u16 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppAction {
    Quit,
}

/// Vertical vim motions shared by the page and the chapter list.
pub trait VimNavMotions {
    fn handle_j(&mut self);
    fn handle_k(&mut self);
    fn handle_ctrl_d(&mut self);
    fn handle_ctrl_u(&mut self);
    fn handle_gg(&mut self);
    fn handle_upper_g(&mut self);
}

#[derive(PartialEq, Debug, Clone, Copy)]
pub enum FocusedPanel {
    Content,
    Popup(PopupWindow),
}

#[derive(PartialEq, Debug, Clone, Copy)]
pub enum PopupWindow {
    ChapterList,
    FragmentPrompt,
}

/// Pointer press that may turn into a swipe.
#[derive(Debug, Clone, Copy)]
struct PointerDown {
    column: u16,
    row: u16,
    at: Instant,
}

pub struct App {
    reader: ReaderState,
    fetcher: Box<dyn FetchDispatcher>,
    chapter_view: ChapterView,
    progress: ProgressIndicator,
    scrollbar: Scrollbar,
    // eased scroll position while the scrollbar animates
    scroll_ratio: f64,
    scrollbar_shown: bool,
    pub focused_panel: FocusedPanel,
    chapter_list: Option<ChapterList>,
    fragment_prompt: Option<FragmentPrompt>,
    pointer_down: Option<PointerDown>,
    // timestamp of the input being handled, used for scrollbar auto-hide
    input_at: Instant,
    help_bar_area: Rect,
    prev_button: Rect,
    next_button: Rect,
    slider_track: Rect,
}

impl VimNavMotions for App {
    fn handle_j(&mut self) {
        self.scroll_lines(1);
    }

    fn handle_k(&mut self) {
        self.scroll_lines(-1);
    }

    fn handle_ctrl_d(&mut self) {
        self.chapter_view.scroll_half_screen(true);
        self.after_manual_scroll(self.input_at);
    }

    fn handle_ctrl_u(&mut self) {
        self.chapter_view.scroll_half_screen(false);
        self.after_manual_scroll(self.input_at);
    }

    fn handle_gg(&mut self) {
        self.chapter_view.scroll_to_top();
        self.after_manual_scroll(self.input_at);
    }

    fn handle_upper_g(&mut self) {
        self.chapter_view.scroll_to_bottom();
        self.after_manual_scroll(self.input_at);
    }
}

impl App {
    pub fn new(
        settings: &Settings,
        store: Box<dyn KeyValueStore>,
        fetcher: Box<dyn FetchDispatcher>,
    ) -> Self {
        let loader = ChapterLoader::new(
            settings.catalog(),
            settings.speaker_table(),
            Box::new(CommonMarkRenderer),
            settings.cache_version.clone(),
        );
        let mut app = Self::with_reader(ReaderState::new(loader, store), fetcher);
        app.chapter_view.set_margin(settings.margin);
        app
    }

    pub fn with_reader(reader: ReaderState, fetcher: Box<dyn FetchDispatcher>) -> Self {
        Self {
            reader,
            fetcher,
            chapter_view: ChapterView::new(),
            progress: ProgressIndicator::new(),
            scrollbar: Scrollbar::new(),
            scroll_ratio: 0.0,
            scrollbar_shown: false,
            focused_panel: FocusedPanel::Content,
            chapter_list: None,
            fragment_prompt: None,
            pointer_down: None,
            input_at: Instant::now(),
            help_bar_area: Rect::default(),
            prev_button: Rect::default(),
            next_button: Rect::default(),
            slider_track: Rect::default(),
        }
    }

    pub fn reader(&self) -> &ReaderState {
        &self.reader
    }

    pub fn chapter_view(&self) -> &ChapterView {
        &self.chapter_view
    }

    pub fn progress(&self) -> &ProgressIndicator {
        &self.progress
    }

    pub fn scrollbar(&self) -> &Scrollbar {
        &self.scrollbar
    }

    pub fn start(&mut self, fragment: &str) {
        info!("Starting reader with fragment '{fragment}'");
        self.dispatch(ReaderEvent::Startup {
            fragment: fragment.to_string(),
        });
    }

    pub fn dispatch(&mut self, event: ReaderEvent) {
        let effects = self.reader.handle(event);
        for effect in effects {
            match effect {
                Effect::Fetch(ticket) => self.fetcher.dispatch(ticket),
                Effect::ResetScroll => {
                    self.chapter_view.reset_scroll();
                    self.scrollbar.stop();
                    self.scroll_ratio = 0.0;
                }
                Effect::ScheduleProgress => self.progress.request(),
            }
        }
        self.chapter_view.set_content(&self.reader.view().content);
    }

    /// Feeds finished fetches back into the reader. Returns true when any
    /// arrived.
    pub fn poll_fetches(&mut self) -> bool {
        let completions = self.fetcher.drain();
        let any = !completions.is_empty();
        for completion in completions {
            self.dispatch(ReaderEvent::FetchCompleted(completion));
        }
        any
    }

    /// Per-tick housekeeping. Returns true when a redraw is needed.
    pub fn tick(&mut self, now: Instant) -> bool {
        let mut changed = self.poll_fetches();

        if self.scrollbar.is_animating() {
            if self.chapter_view.metrics().max_offset() == 0 {
                self.scrollbar.stop();
            } else {
                let step = self.scrollbar.step(self.scroll_ratio);
                self.scroll_ratio = step.ratio();
                self.chapter_view.scroll_to_ratio(self.scroll_ratio);
                self.progress.request();
                if let Step::Settled(_) = step {
                    debug!("Scrollbar animation settled at {:.3}", self.scroll_ratio);
                }
                changed = true;
            }
        }

        let visible = self.scrollbar.is_visible(now);
        if visible != self.scrollbar_shown {
            self.scrollbar_shown = visible;
            changed = true;
        }
        changed
    }

    fn current_ratio(&self) -> f64 {
        let metrics = self.chapter_view.metrics();
        match metrics.max_offset() {
            0 => 0.0,
            max => metrics.offset as f64 / max as f64,
        }
    }

    fn scroll_lines(&mut self, delta: isize) {
        self.chapter_view.scroll_by(delta);
        self.after_manual_scroll(self.input_at);
    }

    fn after_manual_scroll(&mut self, now: Instant) {
        self.scrollbar.stop();
        self.scroll_ratio = self.current_ratio();
        self.scrollbar.touch(now);
        self.progress.request();
    }

    fn open_chapter_list(&mut self) {
        self.chapter_list = Some(ChapterList::new(
            self.reader.catalog(),
            self.reader.current_chapter(),
        ));
        self.focused_panel = FocusedPanel::Popup(PopupWindow::ChapterList);
    }

    fn close_popup(&mut self) {
        self.chapter_list = None;
        self.fragment_prompt = None;
        self.focused_panel = FocusedPanel::Content;
    }

    pub fn handle_resize(&mut self) {
        self.progress.request();
    }

    pub fn handle_key_event(&mut self, key: KeyEvent) -> Option<AppAction> {
        self.handle_key_event_at(key, Instant::now())
    }

    pub fn handle_key_event_at(&mut self, key: KeyEvent, now: Instant) -> Option<AppAction> {
        use crossterm::event::{KeyCode, KeyModifiers};

        self.input_at = now;
        if self.focused_panel == FocusedPanel::Popup(PopupWindow::FragmentPrompt) {
            let action = match self.fragment_prompt {
                Some(ref mut prompt) => prompt.handle_key(key),
                None => Some(FragmentPromptAction::Cancel),
            };
            match action {
                Some(FragmentPromptAction::Submit(fragment)) => {
                    self.close_popup();
                    self.dispatch(ReaderEvent::FragmentChanged(fragment));
                }
                Some(FragmentPromptAction::Cancel) => self.close_popup(),
                None => {}
            }
            return None;
        }

        if self.focused_panel == FocusedPanel::Popup(PopupWindow::ChapterList) {
            let action = match self.chapter_list {
                Some(ref mut list) => list.handle_key(key),
                None => Some(ChapterListAction::Close),
            };
            match action {
                Some(ChapterListAction::Open(chapter)) => {
                    self.close_popup();
                    self.dispatch(ReaderEvent::Navigate(chapter));
                }
                Some(ChapterListAction::Close) => self.close_popup(),
                None => {}
            }
            return None;
        }

        match key.code {
            KeyCode::Char('q') => return Some(AppAction::Quit),
            KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.handle_ctrl_d()
            }
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.handle_ctrl_u()
            }
            KeyCode::Char('l') | KeyCode::Right => self.dispatch(ReaderEvent::Next),
            KeyCode::Char('h') | KeyCode::Left => self.dispatch(ReaderEvent::Previous),
            KeyCode::Char('j') | KeyCode::Down => self.handle_j(),
            KeyCode::Char('k') | KeyCode::Up => self.handle_k(),
            KeyCode::Char(' ') | KeyCode::PageDown => self.handle_ctrl_d(),
            KeyCode::PageUp => self.handle_ctrl_u(),
            KeyCode::Char('g') | KeyCode::Home => self.handle_gg(),
            KeyCode::Char('G') | KeyCode::End => self.handle_upper_g(),
            KeyCode::Char('c') => self.open_chapter_list(),
            KeyCode::Char(':') => {
                self.fragment_prompt = Some(FragmentPrompt::new(self.reader.fragment()));
                self.focused_panel = FocusedPanel::Popup(PopupWindow::FragmentPrompt);
            }
            KeyCode::Char('+') | KeyCode::Char('=') => {
                self.dispatch(ReaderEvent::ChangeFontSize(FONT_SIZE_STEP))
            }
            KeyCode::Char('-') => self.dispatch(ReaderEvent::ChangeFontSize(-FONT_SIZE_STEP)),
            KeyCode::Char('t') => self.dispatch(ReaderEvent::ToggleTheme),
            KeyCode::Char('r') => self.dispatch(ReaderEvent::Reload),
            _ => {}
        }
        None
    }

    pub fn handle_mouse_event(&mut self, mouse_event: MouseEvent) {
        self.handle_mouse_event_at(mouse_event, Instant::now());
    }

    pub fn handle_mouse_event_at(&mut self, mouse_event: MouseEvent, now: Instant) {
        self.input_at = now;
        let (column, row) = (mouse_event.column, mouse_event.row);

        if self.focused_panel == FocusedPanel::Popup(PopupWindow::ChapterList) {
            match mouse_event.kind {
                MouseEventKind::Down(MouseButton::Left) => {
                    let Some(ref mut list) = self.chapter_list else {
                        return;
                    };
                    if list.is_outside_popup_area(column, row) {
                        self.close_popup();
                    } else if list.handle_mouse_click(column, row) {
                        if let Some(chapter) = list.selected_chapter() {
                            self.close_popup();
                            self.dispatch(ReaderEvent::Navigate(chapter));
                        }
                    }
                }
                MouseEventKind::ScrollDown => {
                    if let Some(ref mut list) = self.chapter_list {
                        list.handle_j();
                    }
                }
                MouseEventKind::ScrollUp => {
                    if let Some(ref mut list) = self.chapter_list {
                        list.handle_k();
                    }
                }
                _ => {}
            }
            return;
        }

        match mouse_event.kind {
            MouseEventKind::ScrollDown => {
                self.chapter_view.scroll_by(WHEEL_LINES);
                self.after_manual_scroll(now);
            }
            MouseEventKind::ScrollUp => {
                self.chapter_view.scroll_by(-WHEEL_LINES);
                self.after_manual_scroll(now);
            }
            MouseEventKind::Down(MouseButton::Left) => {
                if self.handle_help_bar_click(column, row) {
                    return;
                }
                if self.chapter_view.is_in_scrollbar(column, row) {
                    self.scrollbar.begin_drag();
                    self.scrollbar.touch(now);
                    self.scroll_ratio = self.current_ratio();
                    self.scrollbar.set_target(self.track_ratio(row));
                    return;
                }
                self.pointer_down = Some(PointerDown { column, row, at: now });
            }
            MouseEventKind::Drag(MouseButton::Left) if self.scrollbar.is_dragging() => {
                let ratio = self.track_ratio(row);
                self.scrollbar.set_target(ratio);
                self.scrollbar.stop();
                self.scroll_ratio = ratio;
                self.chapter_view.scroll_to_ratio(ratio);
                self.scrollbar.touch(now);
                self.progress.request();
            }
            MouseEventKind::Up(MouseButton::Left) => {
                if self.scrollbar.is_dragging() {
                    self.scrollbar.end_drag();
                    self.scrollbar.touch(now);
                    return;
                }
                if let Some(down) = self.pointer_down.take() {
                    let start = gesture::cell_to_units(down.column, down.row);
                    let end = gesture::cell_to_units(column, row);
                    match gesture::classify(start, end, now.saturating_duration_since(down.at)) {
                        Some(Swipe::Right) => {
                            debug!("Right swipe, opening chapter list");
                            self.open_chapter_list();
                        }
                        Some(Swipe::Left) => debug!("Left swipe ignored"),
                        None => {}
                    }
                }
            }
            _ => {}
        }
    }

    fn track_ratio(&self, row: u16) -> f64 {
        let track = self.chapter_view.scrollbar_area();
        scrollbar::pointer_to_ratio(row, track.y, track.height)
    }

    fn handle_help_bar_click(&mut self, column: u16, row: u16) -> bool {
        let hit = |area: Rect| {
            area.width > 0
                && column >= area.x
                && column < area.x + area.width
                && row >= area.y
                && row < area.y + area.height
        };
        if hit(self.prev_button) {
            self.dispatch(ReaderEvent::Previous);
            true
        } else if hit(self.next_button) {
            self.dispatch(ReaderEvent::Next);
            true
        } else if hit(self.slider_track) {
            let track = self.slider_track;
            let chapter =
                router::chapter_at_slider(column - track.x, track.width, self.reader.catalog());
            debug!("Slider picked chapter {chapter}");
            self.dispatch(ReaderEvent::Navigate(chapter));
            true
        } else {
            false
        }
    }

    pub fn draw(&mut self, f: &mut ratatui::Frame) {
        let view = self.reader.view().clone();
        let palette = palette_for(view.theme);

        let background_block = Block::default().style(Style::default().bg(palette.base_00));
        f.render_widget(background_block, f.area());

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(f.area());

        self.chapter_view.prepare(chunks[0], &view);
        self.progress.on_frame(self.chapter_view.metrics());

        let now = Instant::now();
        self.scrollbar_shown = self.scrollbar.is_visible(now);
        self.chapter_view.render(
            f,
            &view,
            Overlay {
                progress_ratio: self.progress.ratio(),
                scrollbar_visible: self.scrollbar_shown,
            },
        );

        self.help_bar_area = chunks[1];
        if self.focused_panel == FocusedPanel::Popup(PopupWindow::FragmentPrompt) {
            if let Some(ref prompt) = self.fragment_prompt {
                prompt.render(f, chunks[1], palette);
            }
        } else {
            self.render_help_bar(f, chunks[1]);
        }

        if self.focused_panel == FocusedPanel::Popup(PopupWindow::ChapterList) {
            let dim_block = Block::default().style(
                Style::default()
                    .bg(Color::Rgb(10, 10, 10))
                    .add_modifier(Modifier::DIM),
            );
            f.render_widget(dim_block, chunks[0]);

            if let Some(ref mut list) = self.chapter_list {
                list.render(f, f.area(), palette);
            }
        }
    }

    fn render_help_bar(&mut self, f: &mut ratatui::Frame, area: Rect) {
        let view = self.reader.view();
        let palette = palette_for(view.theme);
        let (text_color, hint_color, disabled_color) = palette.get_interface_colors();
        let controls = view.controls;

        let prev_style = if controls.prev_enabled {
            Style::default().fg(palette.base_0d).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(disabled_color)
        };
        let next_style = if controls.next_enabled {
            Style::default().fg(palette.base_0d).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(disabled_color)
        };

        let position = format!(" Chapter {}/{} ", controls.slider_value, controls.slider_max);
        let status = match &view.content {
            PageContent::Loading { .. } => " loading…",
            PageContent::Chapter(chapter) if chapter.from_cache => " cached",
            _ => "",
        };
        let hints = format!(
            " | c: Chapters | :: Go to | +/-: Font {}px | t: Theme | r: Reload | q: Quit",
            view.font_size_px
        );

        let prev = " ◀ ";
        let next = " ▶ ";
        let next_x = area.x + (prev.chars().count() + position.chars().count()) as u16;
        self.prev_button = Rect::new(area.x, area.y, prev.chars().count() as u16, 1);
        self.next_button = Rect::new(next_x, area.y, next.chars().count() as u16, 1);

        let slider_x = next_x + next.chars().count() as u16;
        let slider_width = SLIDER_WIDTH.min(area.right().saturating_sub(slider_x));
        self.slider_track = Rect::new(slider_x, area.y, slider_width, 1);
        let knob = router::slider_knob(controls.slider_value, slider_width, self.reader.catalog());

        let mut spans = vec![
            Span::styled(prev, prev_style),
            Span::styled(position, Style::default().fg(text_color)),
            Span::styled(next, next_style),
        ];
        if slider_width > 0 {
            spans.push(Span::styled(
                "─".repeat(knob as usize),
                Style::default().fg(palette.base_0d),
            ));
            spans.push(Span::styled("●", Style::default().fg(palette.base_0d)));
            spans.push(Span::styled(
                "─".repeat((slider_width - knob - 1) as usize),
                Style::default().fg(disabled_color),
            ));
        }
        spans.push(Span::styled(status, Style::default().fg(hint_color)));
        spans.push(Span::styled(hints, Style::default().fg(hint_color)));
        let line = Line::from(spans);
        f.render_widget(
            Paragraph::new(line).style(Style::default().bg(palette.base_01)),
            area,
        );
    }
}

pub fn run_app_with_event_source<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    event_source: &mut dyn EventSource,
) -> Result<()> {
    let tick_rate = Duration::from_millis(16);
    let mut last_tick = Instant::now();
    let mut first_render = true;
    loop {
        let mut events_processed = 0;
        let mut should_quit = false;
        while event_source.poll(Duration::from_millis(0))? && events_processed < 50 {
            let event = event_source.read()?;
            events_processed += 1;

            match event {
                Event::Mouse(mouse_event) => match mouse_event.kind {
                    MouseEventKind::ScrollLeft | MouseEventKind::ScrollRight => {}
                    _ => app.handle_mouse_event(mouse_event),
                },
                Event::Key(key) => {
                    if app.handle_key_event(key) == Some(AppAction::Quit) {
                        should_quit = true;
                    }
                }
                Event::Resize(_cols, _rows) => app.handle_resize(),
                _ => {}
            }

            if should_quit {
                break;
            }
        }

        let mut needs_redraw = events_processed > 0 || first_render;
        first_render = false;

        if app.poll_fetches() {
            needs_redraw = true;
        }

        if last_tick.elapsed() >= tick_rate {
            if app.tick(Instant::now()) {
                needs_redraw = true;
            }
            last_tick = Instant::now();
        }

        if needs_redraw {
            let draw_start = Instant::now();
            terminal.draw(|f| app.draw(f))?;
            let draw_duration = draw_start.elapsed();
            if draw_duration.as_millis() > 10 {
                debug!("Terminal draw/flush took {}ms", draw_duration.as_millis());
            }
        }

        if should_quit {
            return Ok(());
        }

        if events_processed == 0 {
            let timeout = tick_rate
                .checked_sub(last_tick.elapsed())
                .unwrap_or_else(|| Duration::from_secs(0));
            let _ = event_source.poll(timeout);
        }
    }
}
