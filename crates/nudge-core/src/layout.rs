//! Box layout for the prompt.
//!
//! The rendered block is `columns` wide: an affirmation column on the left
//! and the task box flush right. All widths are display widths.

use crate::palette::{bg, fg, BOLD, RESET};
use crate::settings::{HeartPosition, Settings};
use crate::tasks::{strip_control, TaskList};
use crate::width::{char_width, display_width, pad_to_width, strip_ansi, truncate_to_width};

pub const MIN_BOX_WIDTH: usize = 30;
pub const MAX_BOX_WIDTH: usize = 80;
/// Below this the prompt is left alone instead of drawing a mangled box.
pub const MIN_TERMINAL_COLUMNS: usize = 40;
pub const ELLIPSIS: &str = "...";

/// `round(columns * fraction)` clamped to `[min, max]`, then to `columns`.
pub fn compute_box_width(columns: usize, fraction: f64, min: usize, max: usize) -> usize {
    let scaled = (columns as f64 * fraction).round();
    let scaled = if scaled.is_finite() && scaled > 0.0 {
        scaled as usize
    } else {
        0
    };
    scaled.clamp(min, max.max(min)).min(columns)
}

fn split_long_word(word: &str, max_width: usize) -> Vec<String> {
    if display_width(word) <= max_width {
        return vec![word.to_string()];
    }
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut used = 0;
    for ch in word.chars() {
        let w = char_width(ch);
        if used + w > max_width && !current.is_empty() {
            pieces.push(std::mem::take(&mut current));
            used = 0;
        }
        current.push(ch);
        used += w;
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}

/// Greedy word wrap.
///
/// Titles come back as a single line without a bullet. Task text gets
/// `bullet` and a space on the first line; continuation lines are indented
/// by the same width. Words longer than a line are split.
pub fn wrap(text: &str, max_width: usize, is_title: bool, bullet: &str) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return Vec::new();
    }
    if is_title {
        return vec![words.join(" ")];
    }

    let indent = display_width(bullet) + 1;
    let available = max_width.saturating_sub(indent).max(1);
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_width = 0;
    for word in words {
        for piece in split_long_word(word, available) {
            let w = display_width(&piece);
            if current.is_empty() {
                current = piece;
                current_width = w;
            } else if current_width + w + 1 <= available {
                current.push(' ');
                current.push_str(&piece);
                current_width += w + 1;
            } else {
                lines.push(std::mem::replace(&mut current, piece));
                current_width = w;
            }
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }

    let continuation = " ".repeat(indent);
    lines
        .into_iter()
        .enumerate()
        .map(|(idx, line)| {
            if idx == 0 {
                format!("{} {}", bullet, line)
            } else {
                format!("{}{}", continuation, line)
            }
        })
        .collect()
}

fn ellipsize(text: &str, max_width: usize) -> String {
    if display_width(text) <= max_width {
        return text.to_string();
    }
    let budget = max_width.saturating_sub(display_width(ELLIPSIS));
    format!("{}{}", truncate_to_width(text, budget).trim_end(), ELLIPSIS)
}

/// Decorates the affirmation with hearts and squeezes it into `budget`
/// columns. Truncation only ever eats into the text; the hearts are put back
/// afterwards. Returns `None` when not even an ellipsis fits.
pub fn fit_affirmation(
    text: &str,
    heart: &str,
    position: HeartPosition,
    budget: usize,
) -> Option<String> {
    let text = strip_control(&strip_ansi(text)).trim().to_string();
    if text.is_empty() {
        return None;
    }
    let (before, after) = match position {
        HeartPosition::Left => (format!("{} ", heart), String::new()),
        HeartPosition::Right => (String::new(), format!(" {}", heart)),
        HeartPosition::Both => (format!("{} ", heart), format!(" {}", heart)),
        HeartPosition::None => (String::new(), String::new()),
    };
    let decoration = display_width(&before) + display_width(&after);
    if decoration + display_width(&text) <= budget {
        return Some(format!("{}{}{}", before, text, after));
    }
    let text_budget = budget.checked_sub(decoration + display_width(ELLIPSIS))?;
    if text_budget == 0 {
        return None;
    }
    let cut = truncate_to_width(&text, text_budget);
    Some(format!("{}{}{}{}", before, cut.trim_end(), ELLIPSIS, after))
}

enum RowStyle {
    Blank,
    Title,
    Task(u8),
}

fn horizontal_rule(left: &str, fill: &str, right: &str, width: usize) -> String {
    let inner = width.saturating_sub(display_width(left) + display_width(right));
    let fill_width = display_width(fill).max(1);
    let count = inner / fill_width;
    format!(
        "{}{}{}{}",
        left,
        fill.repeat(count),
        " ".repeat(inner - count * fill_width),
        right
    )
}

/// Renders the reminder block, one string per terminal row.
///
/// Returns `None` when there is nothing to draw: no tasks, everything hidden,
/// or a terminal too narrow to hold the box.
pub fn render_box(
    tasks: &TaskList,
    settings: &Settings,
    columns: usize,
    affirmation: &str,
) -> Option<Vec<String>> {
    if tasks.is_empty() || (!settings.show_box && !settings.show_affirmation) {
        return None;
    }
    if columns < MIN_TERMINAL_COLUMNS {
        return None;
    }

    let box_width = compute_box_width(
        columns,
        settings.box_width_fraction,
        MIN_BOX_WIDTH,
        MAX_BOX_WIDTH,
    );
    let glyphs = &settings.glyphs;
    let padding = &settings.padding;
    let edge = if settings.show_box {
        display_width(&glyphs.vertical)
    } else {
        0
    };
    let content_width = box_width.checked_sub(2 * edge + padding.left + padding.right)?;
    if content_width < display_width(&settings.bullet_char) + 2 {
        return None;
    }

    let mut interior: Vec<(String, RowStyle)> = Vec::new();
    for _ in 0..padding.top {
        interior.push((String::new(), RowStyle::Blank));
    }
    let title = ellipsize(&settings.title, content_width);
    for line in wrap(&title, content_width, true, &settings.bullet_char) {
        interior.push((line, RowStyle::Title));
    }
    for task in tasks.iter() {
        for line in wrap(&task.text, content_width, false, &settings.bullet_char) {
            interior.push((line, RowStyle::Task(task.color)));
        }
    }
    for _ in 0..padding.bottom {
        interior.push((String::new(), RowStyle::Blank));
    }

    let border = fg(settings.border_color);
    let background = if settings.show_box {
        bg(settings.background_color)
    } else {
        String::new()
    };
    let left_pad = " ".repeat(padding.left);
    let right_pad = " ".repeat(padding.right);

    let mut rows: Vec<String> = Vec::with_capacity(interior.len() + 2);
    if settings.show_box {
        rows.push(format!(
            "{}{}{}",
            border,
            horizontal_rule(&glyphs.top_left, &glyphs.horizontal, &glyphs.top_right, box_width),
            RESET
        ));
    }
    for (text, style) in &interior {
        let styled = match style {
            RowStyle::Blank => String::new(),
            RowStyle::Title => format!("{}{}", BOLD, fg(settings.title_color)),
            RowStyle::Task(color) => fg(*color),
        };
        let body = format!(
            "{}{}{}{}{}{}",
            background,
            left_pad,
            styled,
            pad_to_width(text, content_width),
            right_pad,
            RESET
        );
        if settings.show_box {
            rows.push(format!(
                "{b}{v}{r}{body}{b}{v}{r}",
                b = border,
                v = glyphs.vertical,
                r = RESET,
                body = body
            ));
        } else {
            rows.push(body);
        }
    }
    if settings.show_box {
        rows.push(format!(
            "{}{}{}",
            border,
            horizontal_rule(
                &glyphs.bottom_left,
                &glyphs.horizontal,
                &glyphs.bottom_right,
                box_width
            ),
            RESET
        ));
    }

    let left_width = columns - box_width;
    let affirmation_row = if settings.show_box {
        interior.len() / 2 + 1
    } else {
        interior.len() / 2
    };
    // One column of margin on each side of the affirmation.
    let fitted = if settings.show_affirmation && left_width > 2 {
        fit_affirmation(
            affirmation,
            &settings.heart_char,
            settings.heart_position,
            left_width - 2,
        )
    } else {
        None
    };

    let lines = rows
        .into_iter()
        .enumerate()
        .map(|(idx, row)| {
            let left = match (&fitted, idx == affirmation_row) {
                (Some(text), true) => format!(
                    " {}{}{}",
                    fg(settings.affirmation_color),
                    text,
                    RESET
                ),
                _ => String::new(),
            };
            format!("{}{}", pad_to_width(&left, left_width), row)
        })
        .collect();
    Some(lines)
}

/// A dim hint right-aligned under the box.
pub fn hint_line(settings: &Settings, columns: usize, hint: &str) -> String {
    let hint = ellipsize(&strip_control(hint), columns);
    let indent = columns.saturating_sub(display_width(&hint));
    format!("{}{}{}{}", " ".repeat(indent), fg(settings.text_color), hint, RESET)
}
