//! Color-cycle allocation for new tasks.

pub const DEFAULT_PALETTE: [u8; 6] = [167, 71, 136, 110, 139, 73];

/// Returns the color at `cursor` and the cursor to use next.
///
/// The cursor is 0-based and wraps at the end of the palette. An empty
/// palette falls back to [`DEFAULT_PALETTE`]; `Settings` never produces one.
pub fn next_color(cursor: usize, palette: &[u8]) -> (u8, usize) {
    let palette = if palette.is_empty() {
        &DEFAULT_PALETTE[..]
    } else {
        palette
    };
    let idx = cursor % palette.len();
    (palette[idx], (idx + 1) % palette.len())
}

/// Assigns colors to `count` tasks from the start of the palette.
pub fn regenerate(count: usize, palette: &[u8]) -> (Vec<u8>, usize) {
    let mut cursor = 0;
    let mut colors = Vec::with_capacity(count);
    for _ in 0..count {
        let (color, next) = next_color(cursor, palette);
        colors.push(color);
        cursor = next;
    }
    (colors, cursor)
}

pub fn fg(color: u8) -> String {
    format!("\x1b[38;5;{}m", color)
}

pub fn bg(color: u8) -> String {
    format!("\x1b[48;5;{}m", color)
}

pub const BOLD: &str = "\x1b[1m";
pub const DIM: &str = "\x1b[2m";
pub const RESET: &str = "\x1b[0m";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycles_through_palette_in_order() {
        let palette = [10, 20, 30];
        let mut cursor = 0;
        let mut seen = Vec::new();
        for _ in 0..7 {
            let (color, next) = next_color(cursor, &palette);
            seen.push(color);
            cursor = next;
        }
        assert_eq!(seen, vec![10, 20, 30, 10, 20, 30, 10]);
        assert_eq!(cursor, 1);
    }

    #[test]
    fn sequence_matches_modulo_rule_for_any_length() {
        for n in 1..=8usize {
            let palette: Vec<u8> = (0..n as u8).map(|i| i * 3 + 1).collect();
            let mut cursor = 0;
            for m in 0..(n * 3) {
                let (color, next) = next_color(cursor, &palette);
                assert_eq!(color, palette[m % n]);
                cursor = next;
            }
        }
    }

    #[test]
    fn stale_cursor_beyond_palette_wraps() {
        assert_eq!(next_color(7, &[1, 2, 3]), (2, 2));
    }

    #[test]
    fn regenerate_restarts_at_first_entry() {
        let (colors, cursor) = regenerate(4, &[5, 6, 7]);
        assert_eq!(colors, vec![5, 6, 7, 5]);
        assert_eq!(cursor, 1);
        assert_eq!(regenerate(0, &[5]), (Vec::new(), 0));
    }

    #[test]
    fn empty_palette_uses_default() {
        assert_eq!(next_color(0, &[]).0, DEFAULT_PALETTE[0]);
    }
}
