mod rendering;

pub use rendering::ChapterRenderer;

use crate::preferences::Theme;
use crate::progress::ScrollMetrics;
use crate::reader::{PageContent, PageView};
use crate::theme::palette_for;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{
        Block, Borders, LineGauge, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState,
    },
};

/// Columns of reading measure per pixel of configured font size.
pub const MEASURE_BASE: u16 = 1440;

/// What the reader wants on top of the page: progress and scrollbar state.
#[derive(Debug, Clone, Copy)]
pub struct Overlay {
    pub progress_ratio: f64,
    pub scrollbar_visible: bool,
}

pub fn reading_measure(font_size_px: u16, available: u16) -> u16 {
    let measure = MEASURE_BASE / font_size_px.max(1);
    measure.min(available).max(1)
}

pub struct ChapterView {
    source: Option<String>,
    lines: Vec<Line<'static>>,
    // (text width, theme) the cached lines were laid out for
    layout_key: Option<(u16, Theme)>,

    scroll_offset: usize,
    visible_height: usize,

    gauge_area: Rect,
    page_area: Rect,
    content_area: Rect,
    scrollbar_area: Rect,
    content_margin: u16,
}

impl Default for ChapterView {
    fn default() -> Self {
        Self::new()
    }
}

impl ChapterView {
    pub fn new() -> Self {
        Self {
            source: None,
            lines: Vec::new(),
            layout_key: None,
            scroll_offset: 0,
            visible_height: 0,
            gauge_area: Rect::default(),
            page_area: Rect::default(),
            content_area: Rect::default(),
            scrollbar_area: Rect::default(),
            content_margin: 0,
        }
    }

    pub fn set_margin(&mut self, margin: u16) {
        self.content_margin = margin;
        self.layout_key = None;
    }

    /// Swaps in new page content; layout happens lazily on the next render.
    pub fn set_content(&mut self, content: &PageContent) {
        let source = match content {
            PageContent::Chapter(chapter) => Some(chapter.html.clone()),
            _ => None,
        };
        if source != self.source {
            self.source = source;
            self.layout_key = None;
        }
    }

    pub fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    pub fn total_lines(&self) -> usize {
        self.lines.len()
    }

    pub fn visible_height(&self) -> usize {
        self.visible_height
    }

    pub fn metrics(&self) -> ScrollMetrics {
        ScrollMetrics {
            offset: self.scroll_offset,
            scroll_height: self.lines.len(),
            client_height: self.visible_height,
        }
    }

    pub fn reset_scroll(&mut self) {
        self.scroll_offset = 0;
    }

    pub fn scroll_by(&mut self, delta: isize) {
        let max = self.metrics().max_offset();
        self.scroll_offset = self.scroll_offset.saturating_add_signed(delta).min(max);
    }

    pub fn scroll_half_screen(&mut self, down: bool) {
        let half = (self.visible_height / 2).max(1) as isize;
        self.scroll_by(if down { half } else { -half });
    }

    pub fn scroll_to_top(&mut self) {
        self.scroll_offset = 0;
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll_offset = self.metrics().max_offset();
    }

    pub fn scroll_to_ratio(&mut self, ratio: f64) {
        let max = self.metrics().max_offset();
        self.scroll_offset = (ratio.clamp(0.0, 1.0) * max as f64).round() as usize;
    }

    pub fn content_area(&self) -> Rect {
        self.content_area
    }

    pub fn scrollbar_area(&self) -> Rect {
        self.scrollbar_area
    }

    pub fn is_in_scrollbar(&self, column: u16, row: u16) -> bool {
        let area = self.scrollbar_area;
        area.width > 0
            && column >= area.x
            && column < area.x + area.width
            && row >= area.y
            && row < area.y + area.height
    }

    pub fn plain_lines(&self) -> Vec<String> {
        self.lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    /// Updates layout for `area` without drawing, so scroll metrics are
    /// known before the first frame.
    pub fn layout(&mut self, area: Rect, view: &PageView) {
        let inner = Block::default().borders(Borders::ALL).inner(area);
        let [text_area, scrollbar_area] = self.split_inner(inner, view.font_size_px);
        self.content_area = text_area;
        self.scrollbar_area = scrollbar_area;
        self.visible_height = text_area.height as usize;
        self.relayout(text_area.width, view);
        self.scroll_offset = self.scroll_offset.min(self.metrics().max_offset());
    }

    fn split_inner(&self, inner: Rect, font_size_px: u16) -> [Rect; 2] {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(inner);
        let body = columns[0];
        let available = body.width.saturating_sub(self.content_margin * 2);
        let measure = reading_measure(font_size_px, available);
        let left = body.x + (body.width.saturating_sub(measure)) / 2;
        let text_area = Rect::new(left, body.y, measure.min(body.width), body.height);
        [text_area, columns[1]]
    }

    fn relayout(&mut self, width: u16, view: &PageView) {
        let key = (width, view.theme);
        if self.layout_key == Some(key) && self.source.is_some() {
            return;
        }
        let renderer = ChapterRenderer::new(palette_for(view.theme));
        self.lines = match (&self.source, view.content.placeholder_text()) {
            (Some(source), None) => renderer.render_html(source, width as usize),
            (_, Some(placeholder)) => renderer.render_plain(&placeholder, width as usize),
            (None, None) => Vec::new(),
        };
        self.layout_key = Some(key);
    }

    /// Splits `area` into the progress line and the page, then lays the
    /// page out. Call before reading `metrics()` for the frame.
    pub fn prepare(&mut self, area: Rect, view: &PageView) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(0)])
            .split(area);
        self.gauge_area = rows[0];
        self.page_area = rows[1];
        self.layout(rows[1], view);
    }

    pub fn render(&mut self, f: &mut Frame, view: &PageView, overlay: Overlay) {
        let palette = palette_for(view.theme);

        let gauge = LineGauge::default()
            .filled_style(Style::default().fg(palette.base_0d))
            .unfilled_style(Style::default().fg(palette.base_02))
            .label(Span::styled(
                format!("{:>3}%", (overlay.progress_ratio * 100.0).round() as u16),
                Style::default().fg(palette.base_04),
            ))
            .ratio(overlay.progress_ratio.clamp(0.0, 1.0));
        f.render_widget(gauge, self.gauge_area);

        let title = if view.title.is_empty() {
            match &view.content {
                PageContent::Chapter(chapter) => format!(" Chapter {} ", chapter.number),
                PageContent::Loading { chapter }
                | PageContent::NotFound { chapter }
                | PageContent::LoadFailed { chapter, .. } => format!(" Chapter {chapter} "),
                PageContent::Empty => String::new(),
            }
        } else {
            format!(" {} ", view.title)
        };

        let (text_color, border_color, bg_color) = palette.get_panel_colors(true);
        let block = Block::default()
            .borders(Borders::ALL)
            .title(Line::from(Span::styled(
                title,
                Style::default()
                    .fg(palette.base_0a)
                    .add_modifier(Modifier::BOLD),
            )))
            .border_style(Style::default().fg(border_color))
            .style(Style::default().bg(bg_color));
        f.render_widget(block, self.page_area);

        let visible: Vec<Line> = self
            .lines
            .iter()
            .skip(self.scroll_offset)
            .take(self.visible_height)
            .cloned()
            .collect();
        let paragraph = Paragraph::new(visible).style(Style::default().fg(text_color).bg(bg_color));
        f.render_widget(paragraph, self.content_area);

        if overlay.scrollbar_visible && self.metrics().max_offset() > 0 {
            let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .style(Style::default().fg(palette.base_04))
                .begin_symbol(None)
                .end_symbol(None);
            let mut state = ScrollbarState::new(self.metrics().max_offset() + 1)
                .position(self.scroll_offset);
            f.render_stateful_widget(scrollbar, self.scrollbar_area, &mut state);
        }
    }
}
