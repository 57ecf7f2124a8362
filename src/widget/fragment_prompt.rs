use crate::theme::Base16Palette;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    Frame,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
};

pub enum FragmentPromptAction {
    Submit(String),
    Cancel,
}

/// Single-line `:` prompt that edits the address fragment.
pub struct FragmentPrompt {
    input: String,
}

impl FragmentPrompt {
    pub fn new(current: &str) -> Self {
        Self {
            input: current.trim_start_matches('#').to_string(),
        }
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<FragmentPromptAction> {
        match key.code {
            KeyCode::Char(c) => {
                self.input.push(c);
                None
            }
            KeyCode::Backspace => {
                self.input.pop();
                None
            }
            KeyCode::Enter => Some(FragmentPromptAction::Submit(format!("#{}", self.input))),
            KeyCode::Esc => Some(FragmentPromptAction::Cancel),
            _ => None,
        }
    }

    pub fn render(&self, f: &mut Frame, area: Rect, palette: &Base16Palette) {
        let line = Line::from(vec![
            Span::styled(":#", Style::default().fg(palette.base_0d)),
            Span::styled(self.input.clone(), Style::default().fg(palette.base_05)),
            Span::styled("█", Style::default().fg(palette.base_04)),
            Span::styled("  Enter: Go | ESC: Cancel", Style::default().fg(palette.base_03)),
        ]);
        f.render_widget(
            Paragraph::new(line).style(Style::default().bg(palette.base_01)),
            area,
        );
    }
}
