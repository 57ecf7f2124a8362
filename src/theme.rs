use crate::preferences::Theme;
use once_cell::sync::Lazy;
use ratatui::style::Color;

// Color palette structure
#[derive(Clone, Debug, PartialEq)]
pub struct Base16Palette {
    pub base_00: Color, // Background
    pub base_01: Color, // Lighter background
    pub base_02: Color, // Selection background
    pub base_03: Color, // Comments, invisibles
    pub base_04: Color, // Dark foreground
    pub base_05: Color, // Default foreground
    pub base_06: Color, // Light foreground
    pub base_07: Color, // Light background
    pub base_08: Color, // Red
    pub base_09: Color, // Orange
    pub base_0a: Color, // Yellow
    pub base_0b: Color, // Green
    pub base_0c: Color, // Cyan
    pub base_0d: Color, // Blue
    pub base_0e: Color, // Purple
    pub base_0f: Color, // Brown
}

const fn rgb(value: u32) -> Color {
    Color::Rgb(
        ((value >> 16) & 0xFF) as u8,
        ((value >> 8) & 0xFF) as u8,
        (value & 0xFF) as u8,
    )
}

pub fn palette_for(theme: Theme) -> &'static Base16Palette {
    match theme {
        Theme::Light => &LIGHT_PALETTE,
        Theme::Dark => &DARK_PALETTE,
    }
}

impl Base16Palette {
    /// Color for a speaker's dialogue box class. Unknown classes fall back to
    /// the default foreground.
    pub fn speaker_color(&self, class: &str) -> Color {
        match class {
            "red" => self.base_08,
            "orange" => self.base_09,
            "yellow" => self.base_0a,
            "green" => self.base_0b,
            "cyan" => self.base_0c,
            "blue" => self.base_0d,
            "purple" => self.base_0e,
            "brown" => self.base_0f,
            _ => self.base_05,
        }
    }

    pub fn get_interface_colors(&self) -> (Color, Color, Color) {
        (self.base_05, self.base_04, self.base_02)
    }

    pub fn get_panel_colors(&self, is_focused: bool) -> (Color, Color, Color) {
        if is_focused {
            (self.base_05, self.base_04, self.base_00)
        } else {
            (self.base_03, self.base_03, self.base_00)
        }
    }

    pub fn get_selection_colors(&self) -> (Color, Color) {
        (self.base_02, self.base_06)
    }
}

// Oceanic Next
static DARK_PALETTE: Lazy<Base16Palette> = Lazy::new(|| Base16Palette {
    base_00: rgb(0x1B2B34),
    base_01: rgb(0x343D46),
    base_02: rgb(0x4F5B66),
    base_03: rgb(0x65737E),
    base_04: rgb(0xA7ADBA),
    base_05: rgb(0xC0C5CE),
    base_06: rgb(0xCDD3DE),
    base_07: rgb(0xF0F4F8),
    base_08: rgb(0xEC5F67),
    base_09: rgb(0xF99157),
    base_0a: rgb(0xFAC863),
    base_0b: rgb(0x99C794),
    base_0c: rgb(0x5FB3B3),
    base_0d: rgb(0x6699CC),
    base_0e: rgb(0xC594C5),
    base_0f: rgb(0xAB7967),
});

// Solarized Light
static LIGHT_PALETTE: Lazy<Base16Palette> = Lazy::new(|| Base16Palette {
    base_00: rgb(0xFDF6E3),
    base_01: rgb(0xEEE8D5),
    base_02: rgb(0x93A1A1),
    base_03: rgb(0x839496),
    base_04: rgb(0x657B83),
    base_05: rgb(0x586E75),
    base_06: rgb(0x073642),
    base_07: rgb(0x002B36),
    base_08: rgb(0xDC322F),
    base_09: rgb(0xCB4B16),
    base_0a: rgb(0xB58900),
    base_0b: rgb(0x859900),
    base_0c: rgb(0x2AA198),
    base_0d: rgb(0x268BD2),
    base_0e: rgb(0x6C71C4),
    base_0f: rgb(0xD33682),
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_theme_has_its_own_background() {
        assert_ne!(
            palette_for(Theme::Light).base_00,
            palette_for(Theme::Dark).base_00
        );
        assert_eq!(palette_for(Theme::Dark).base_00, Color::Rgb(0x1B, 0x2B, 0x34));
    }

    #[test]
    fn speaker_classes_map_to_accents() {
        let palette = palette_for(Theme::Dark);
        assert_eq!(palette.speaker_color("red"), palette.base_08);
        assert_eq!(palette.speaker_color("blue"), palette.base_0d);
        assert_eq!(palette.speaker_color("chartreuse"), palette.base_05);
    }
}
