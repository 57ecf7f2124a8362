use crate::catalog::Catalog;
use crate::main_app::VimNavMotions;
use crate::theme::Base16Palette;
use crate::widget::centered_rect;
use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState},
};

pub enum ChapterListAction {
    Open(u32),
    Close,
}

/// Popup listing every chapter in the catalog; the terminal counterpart of
/// the chapter sidebar.
pub struct ChapterList {
    items: Vec<(u32, String)>,
    current: Option<u32>,
    state: ListState,
    last_popup_area: Option<Rect>,
}

impl ChapterList {
    pub fn new(catalog: &Catalog, current: Option<u32>) -> Self {
        let items: Vec<(u32, String)> = catalog.entries().collect();
        let mut state = ListState::default();
        let selected = current
            .and_then(|c| items.iter().position(|(n, _)| *n == c))
            .unwrap_or(0);
        state.select(Some(selected));

        ChapterList {
            items,
            current,
            state,
            last_popup_area: None,
        }
    }

    pub fn selected_chapter(&self) -> Option<u32> {
        self.state
            .selected()
            .and_then(|i| self.items.get(i))
            .map(|(n, _)| *n)
    }

    pub fn render(&mut self, f: &mut Frame, area: Rect, palette: &Base16Palette) {
        let popup_area = centered_rect(50, 70, area);
        self.last_popup_area = Some(popup_area);

        f.render_widget(Clear, popup_area);

        let items: Vec<ListItem> = self
            .items
            .iter()
            .map(|(number, name)| {
                let marker = if Some(*number) == self.current {
                    " (reading)"
                } else {
                    ""
                };
                ListItem::new(Line::from(vec![
                    Span::styled(format!("{number:>3}  "), Style::default().fg(palette.base_03)),
                    Span::styled(name.clone(), Style::default().fg(palette.base_05)),
                    Span::styled(marker, Style::default().fg(palette.base_03)),
                ]))
            })
            .collect();

        let (selection_bg, selection_fg) = palette.get_selection_colors();
        let list = List::new(items)
            .block(
                Block::default()
                    .title(" Chapters ")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(palette.base_0c))
                    .style(Style::default().bg(palette.base_00)),
            )
            .highlight_style(
                Style::default()
                    .bg(selection_bg)
                    .fg(selection_fg)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("» ");

        f.render_stateful_widget(list, popup_area, &mut self.state);
    }

    fn next(&mut self) {
        let i = match self.state.selected() {
            Some(i) if i + 1 < self.items.len() => i + 1,
            Some(_) | None => 0,
        };
        self.state.select(Some(i));
    }

    fn previous(&mut self) {
        let i = match self.state.selected() {
            Some(0) | None => self.items.len().saturating_sub(1),
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }

    /// Selects the clicked row. Returns true when a row was hit.
    pub fn handle_mouse_click(&mut self, x: u16, y: u16) -> bool {
        let Some(popup_area) = self.last_popup_area else {
            return false;
        };
        if x >= popup_area.x
            && x < popup_area.x + popup_area.width
            && y > popup_area.y
            && y < popup_area.y + popup_area.height - 1
        {
            let relative_y = y.saturating_sub(popup_area.y).saturating_sub(1);
            let new_index = self.state.offset() + relative_y as usize;
            if new_index < self.items.len() {
                self.state.select(Some(new_index));
                return true;
            }
        }
        false
    }

    pub fn is_outside_popup_area(&self, x: u16, y: u16) -> bool {
        match self.last_popup_area {
            Some(popup_area) => {
                x < popup_area.x
                    || x >= popup_area.x + popup_area.width
                    || y < popup_area.y
                    || y >= popup_area.y + popup_area.height
            }
            None => true,
        }
    }

    pub fn handle_key(&mut self, key: crossterm::event::KeyEvent) -> Option<ChapterListAction> {
        use crossterm::event::{KeyCode, KeyModifiers};

        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                self.handle_j();
                None
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.handle_k();
                None
            }
            KeyCode::Char('g') => {
                self.handle_gg();
                None
            }
            KeyCode::Char('G') => {
                self.handle_upper_g();
                None
            }
            KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.handle_ctrl_d();
                None
            }
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.handle_ctrl_u();
                None
            }
            KeyCode::Esc | KeyCode::Char('c') | KeyCode::Char('q') => {
                Some(ChapterListAction::Close)
            }
            KeyCode::Enter | KeyCode::Char('l') => {
                self.selected_chapter().map(ChapterListAction::Open)
            }
            _ => None,
        }
    }
}

impl VimNavMotions for ChapterList {
    fn handle_j(&mut self) {
        self.next();
    }

    fn handle_k(&mut self) {
        self.previous();
    }

    fn handle_ctrl_d(&mut self) {
        let last = self.items.len().saturating_sub(1);
        let current = self.state.selected().unwrap_or(0);
        self.state.select(Some((current + 10).min(last)));
    }

    fn handle_ctrl_u(&mut self) {
        let current = self.state.selected().unwrap_or(0);
        self.state.select(Some(current.saturating_sub(10)));
    }

    fn handle_gg(&mut self) {
        if !self.items.is_empty() {
            self.state.select(Some(0));
        }
    }

    fn handle_upper_g(&mut self) {
        if !self.items.is_empty() {
            self.state.select(Some(self.items.len() - 1));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::empty())
    }

    #[test]
    fn starts_on_the_current_chapter() {
        let list = ChapterList::new(&Catalog::new(12), Some(7));
        assert_eq!(list.selected_chapter(), Some(7));
    }

    #[test]
    fn navigation_wraps_and_enter_opens() {
        let mut list = ChapterList::new(&Catalog::new(3), None);
        assert_eq!(list.selected_chapter(), Some(1));

        list.handle_key(key(KeyCode::Char('k')));
        assert_eq!(list.selected_chapter(), Some(3));
        list.handle_key(key(KeyCode::Char('j')));
        assert_eq!(list.selected_chapter(), Some(1));

        list.handle_key(key(KeyCode::Char('G')));
        assert!(matches!(
            list.handle_key(key(KeyCode::Enter)),
            Some(ChapterListAction::Open(3))
        ));
        assert!(matches!(
            list.handle_key(key(KeyCode::Esc)),
            Some(ChapterListAction::Close)
        ));
    }

    #[test]
    fn half_page_motions_clamp_to_the_list() {
        let mut list = ChapterList::new(&Catalog::new(25), Some(20));
        list.handle_key(KeyEvent::new(KeyCode::Char('d'), KeyModifiers::CONTROL));
        assert_eq!(list.selected_chapter(), Some(25));
        list.handle_key(KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL));
        assert_eq!(list.selected_chapter(), Some(15));
        list.handle_key(key(KeyCode::Char('g')));
        assert_eq!(list.selected_chapter(), Some(1));
        assert!(matches!(
            list.handle_key(key(KeyCode::Char('l'))),
            Some(ChapterListAction::Open(1))
        ));
    }
}
