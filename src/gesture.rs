use std::time::Duration;

/// Minimum horizontal travel.
pub const THRESHOLD: f64 = 80.0;
/// Maximum vertical drift.
pub const RESTRAINT: f64 = 100.0;
pub const ALLOWED_TIME: Duration = Duration::from_millis(200);

/// Terminal cells are far coarser than touch points; one column counts as
/// 8 units and one row as 16.
pub const CELL_WIDTH_UNITS: f64 = 8.0;
pub const CELL_HEIGHT_UNITS: f64 = 16.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Swipe {
    Left,
    Right,
}

pub fn classify(start: (f64, f64), end: (f64, f64), elapsed: Duration) -> Option<Swipe> {
    if elapsed > ALLOWED_TIME {
        return None;
    }
    let dist_x = end.0 - start.0;
    let dist_y = end.1 - start.1;
    if dist_x.abs() >= THRESHOLD && dist_y.abs() <= RESTRAINT {
        Some(if dist_x > 0.0 { Swipe::Right } else { Swipe::Left })
    } else {
        None
    }
}

pub fn cell_to_units(column: u16, row: u16) -> (f64, f64) {
    (
        column as f64 * CELL_WIDTH_UNITS,
        row as f64 * CELL_HEIGHT_UNITS,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const FAST: Duration = Duration::from_millis(120);

    #[test]
    fn horizontal_fast_moves_are_swipes() {
        assert_eq!(classify((0.0, 0.0), (90.0, 10.0), FAST), Some(Swipe::Right));
        assert_eq!(classify((200.0, 0.0), (100.0, -20.0), FAST), Some(Swipe::Left));
    }

    #[test]
    fn short_slow_or_vertical_moves_are_not() {
        assert_eq!(classify((0.0, 0.0), (60.0, 0.0), FAST), None);
        assert_eq!(classify((0.0, 0.0), (120.0, 150.0), FAST), None);
        assert_eq!(
            classify((0.0, 0.0), (120.0, 0.0), Duration::from_millis(250)),
            None
        );
    }

    #[test]
    fn ten_columns_is_enough_in_a_terminal() {
        let start = cell_to_units(5, 4);
        let end = cell_to_units(15, 5);
        assert_eq!(classify(start, end, FAST), Some(Swipe::Right));
    }
}
