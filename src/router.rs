use crate::catalog::{Catalog, FIRST_CHAPTER};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fragment {
    Absent,
    Chapter(u32),
    Malformed,
}

/// Parses an address fragment such as `#12` or `12`. Anything other than a
/// positive decimal integer is malformed.
pub fn parse_fragment(fragment: &str) -> Fragment {
    let trimmed = fragment.trim();
    let body = trimmed.strip_prefix('#').unwrap_or(trimmed).trim();
    if body.is_empty() {
        return Fragment::Absent;
    }
    if !body.bytes().all(|b| b.is_ascii_digit()) {
        return Fragment::Malformed;
    }
    match body.parse::<u32>() {
        Ok(n) if n >= FIRST_CHAPTER => Fragment::Chapter(n),
        _ => Fragment::Malformed,
    }
}

pub fn fragment_for(chapter: u32) -> String {
    format!("#{chapter}")
}

/// Chapter to open when the reader starts with `fragment`. `None` means the
/// fragment is malformed and nothing should load.
pub fn resolve_startup(fragment: &str, stored_last: Option<&str>) -> Option<u32> {
    match parse_fragment(fragment) {
        Fragment::Chapter(n) => Some(n),
        Fragment::Malformed => None,
        Fragment::Absent => match stored_last.map(parse_fragment) {
            Some(Fragment::Chapter(n)) => Some(n),
            _ => Some(FIRST_CHAPTER),
        },
    }
}

/// Navigation controls derived from the current chapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavControls {
    pub slider_value: u32,
    pub slider_max: u32,
    pub prev_enabled: bool,
    pub next_enabled: bool,
}

impl NavControls {
    pub fn for_chapter(chapter: u32, catalog: &Catalog) -> Self {
        Self {
            slider_value: catalog.clamp(chapter),
            slider_max: catalog.last(),
            prev_enabled: chapter > catalog.first(),
            next_enabled: chapter < catalog.last(),
        }
    }
}

/// Chapter picked on a slider `width` cells wide, `offset` cells from its
/// left edge.
pub fn chapter_at_slider(offset: u16, width: u16, catalog: &Catalog) -> u32 {
    let span = catalog.last().saturating_sub(catalog.first());
    if width <= 1 || span == 0 {
        return catalog.first();
    }
    let fraction = f64::from(offset.min(width - 1)) / f64::from(width - 1);
    catalog.first() + (fraction * f64::from(span)).round() as u32
}

/// Cell of the slider knob for `value`.
pub fn slider_knob(value: u32, width: u16, catalog: &Catalog) -> u16 {
    let span = catalog.last().saturating_sub(catalog.first());
    if width <= 1 || span == 0 {
        return 0;
    }
    let fraction = f64::from(catalog.clamp(value) - catalog.first()) / f64::from(span);
    (fraction * f64::from(width - 1)).round() as u16
}

pub fn next_chapter(current: Option<u32>, catalog: &Catalog) -> Option<u32> {
    current.filter(|&n| n < catalog.last()).map(|n| n + 1)
}

pub fn previous_chapter(current: Option<u32>, catalog: &Catalog) -> Option<u32> {
    current.filter(|&n| n > catalog.first()).map(|n| n - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slider_maps_cells_to_chapters() {
        let catalog = Catalog::new(12);
        assert_eq!(chapter_at_slider(0, 12, &catalog), 1);
        assert_eq!(chapter_at_slider(11, 12, &catalog), 12);
        assert_eq!(chapter_at_slider(40, 12, &catalog), 12);
        assert_eq!(chapter_at_slider(5, 12, &catalog), 6);

        for chapter in 1..=12 {
            let knob = slider_knob(chapter, 12, &catalog);
            assert_eq!(chapter_at_slider(knob, 12, &catalog), chapter);
        }
        assert_eq!(chapter_at_slider(3, 12, &Catalog::new(1)), 1);
    }

    #[test]
    fn parses_positive_decimal_fragments() {
        assert_eq!(parse_fragment("#12"), Fragment::Chapter(12));
        assert_eq!(parse_fragment("7"), Fragment::Chapter(7));
        assert_eq!(parse_fragment(" #3 "), Fragment::Chapter(3));
        assert_eq!(parse_fragment("#007"), Fragment::Chapter(7));
    }

    #[test]
    fn empty_fragment_is_absent() {
        assert_eq!(parse_fragment(""), Fragment::Absent);
        assert_eq!(parse_fragment("#"), Fragment::Absent);
    }

    #[test]
    fn rejects_everything_else() {
        for input in ["#0", "#-1", "#1.5", "#abc", "#12abc", "#sidebar", "#99999999999"] {
            assert_eq!(parse_fragment(input), Fragment::Malformed, "{input}");
        }
    }

    #[test]
    fn startup_prefers_fragment_then_stored_then_first() {
        assert_eq!(resolve_startup("#4", Some("9")), Some(4));
        assert_eq!(resolve_startup("", Some("9")), Some(9));
        assert_eq!(resolve_startup("", Some("garbage")), Some(1));
        assert_eq!(resolve_startup("", None), Some(1));
        assert_eq!(resolve_startup("#x", Some("9")), None);
    }

    #[test]
    fn controls_follow_catalog_bounds() {
        let catalog = Catalog::new(10);
        let first = NavControls::for_chapter(1, &catalog);
        assert!(!first.prev_enabled && first.next_enabled);

        let last = NavControls::for_chapter(10, &catalog);
        assert!(last.prev_enabled && !last.next_enabled);

        let beyond = NavControls::for_chapter(40, &catalog);
        assert_eq!(beyond.slider_value, 10);
        assert!(beyond.prev_enabled && !beyond.next_enabled);
    }

    #[test]
    fn relative_navigation_stops_at_edges() {
        let catalog = Catalog::new(3);
        assert_eq!(next_chapter(Some(2), &catalog), Some(3));
        assert_eq!(next_chapter(Some(3), &catalog), None);
        assert_eq!(previous_chapter(Some(1), &catalog), None);
        assert_eq!(previous_chapter(Some(2), &catalog), Some(1));
        assert_eq!(next_chapter(None, &catalog), None);
    }
}
