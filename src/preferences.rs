use crate::store::{self, KeyValueStore, keys};
use log::debug;

pub const MIN_FONT_SIZE_PX: u16 = 12;
pub const MAX_FONT_SIZE_PX: u16 = 32;
pub const DEFAULT_FONT_SIZE_PX: u16 = 18;
pub const FONT_SIZE_STEP: i32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    /// Accepts both the plain names and the older class-name values.
    pub fn parse(value: &str) -> Option<Theme> {
        match value.trim() {
            "light" | "mdui-theme-light" => Some(Theme::Light),
            "dark" | "mdui-theme-dark" => Some(Theme::Dark),
            _ => None,
        }
    }

    pub fn is_dark(&self) -> bool {
        matches!(self, Theme::Dark)
    }

    pub fn toggled(&self) -> Theme {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preferences {
    pub theme: Theme,
    pub font_size_px: u16,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            font_size_px: DEFAULT_FONT_SIZE_PX,
        }
    }
}

pub fn clamp_font_size(px: i64) -> u16 {
    px.clamp(MIN_FONT_SIZE_PX as i64, MAX_FONT_SIZE_PX as i64) as u16
}

impl Preferences {
    /// Reads both values once; missing or unreadable entries use defaults.
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let theme = store
            .get(keys::THEME)
            .and_then(|v| Theme::parse(&v))
            .unwrap_or_default();
        let font_size_px = store::get_json::<i64>(store, keys::FONT_SIZE)
            .map(clamp_font_size)
            .unwrap_or(DEFAULT_FONT_SIZE_PX);
        debug!("Loaded preferences: theme={}, font={}px", theme.as_str(), font_size_px);
        Self {
            theme,
            font_size_px,
        }
    }

    pub fn set_theme(&mut self, dark: bool, store: &mut dyn KeyValueStore) {
        self.theme = if dark { Theme::Dark } else { Theme::Light };
        store.set(keys::THEME, self.theme.as_str());
    }

    pub fn toggle_theme(&mut self, store: &mut dyn KeyValueStore) {
        let dark = !self.theme.is_dark();
        self.set_theme(dark, store);
    }

    /// Adds `delta` and clamps to the allowed range; at a bound further steps
    /// in the same direction change nothing.
    pub fn change_font_size(&mut self, delta: i32, store: &mut dyn KeyValueStore) -> u16 {
        self.font_size_px = clamp_font_size(self.font_size_px as i64 + delta as i64);
        store::set_json(store, keys::FONT_SIZE, &self.font_size_px);
        self.font_size_px
    }
}
