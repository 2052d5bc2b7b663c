use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::palette::DEFAULT_PALETTE;
use crate::tasks::strip_control;
use crate::width::display_width;

pub const ENV_PREFIX: &str = "NUDGE_";
pub const MAX_TITLE_WIDTH: usize = 40;
pub const MAX_GLYPH_WIDTH: usize = 4;
pub const MAX_PADDING: usize = 10;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Unknown setting: {0}")]
    UnknownKey(String),
    #[error("Invalid value for {key}: {value:?} ({reason})")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
    #[error("Unknown preset: {0} (available: subtle, balanced, vibrant, loud)")]
    UnknownPreset(String),
    #[error("Unknown reset scope: {0} (expected all, content, display, padding, colors, box)")]
    UnknownScope(String),
    #[error("{}:{}: expected key=value", .path.display(), .line)]
    Malformed { path: PathBuf, line: usize },
    #[error("Settings IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HeartPosition {
    Left,
    Right,
    Both,
    None,
}

impl HeartPosition {
    pub fn as_str(&self) -> &'static str {
        match self {
            HeartPosition::Left => "left",
            HeartPosition::Right => "right",
            HeartPosition::Both => "both",
            HeartPosition::None => "none",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "left" => Some(HeartPosition::Left),
            "right" => Some(HeartPosition::Right),
            "both" => Some(HeartPosition::Both),
            "none" => Some(HeartPosition::None),
            _ => None,
        }
    }
}

impl fmt::Display for HeartPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Padding {
    pub top: usize,
    pub right: usize,
    pub bottom: usize,
    pub left: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoxGlyphs {
    pub top_left: String,
    pub top_right: String,
    pub bottom_left: String,
    pub bottom_right: String,
    pub horizontal: String,
    pub vertical: String,
}

/// Every presentation knob, fully validated.
///
/// Built once per invocation from defaults, environment and the persisted
/// snapshot, then passed by reference to whatever needs it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Settings {
    pub title: String,
    pub heart_char: String,
    pub heart_position: HeartPosition,
    pub bullet_char: String,
    pub show_affirmation: bool,
    pub show_box: bool,
    pub show_hints: bool,
    pub padding: Padding,
    pub border_color: u8,
    pub background_color: u8,
    pub text_color: u8,
    pub title_color: u8,
    pub affirmation_color: u8,
    pub box_width_fraction: f64,
    pub task_colors: Vec<u8>,
    pub glyphs: BoxGlyphs,
    /// Keys chosen explicitly (set, preset, import or a saved snapshot).
    /// These are persisted even when they match the base layer.
    #[serde(skip)]
    explicit: BTreeSet<&'static str>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            title: "REMEMBER".to_string(),
            heart_char: "♥".to_string(),
            heart_position: HeartPosition::Left,
            bullet_char: "▪".to_string(),
            show_affirmation: true,
            show_box: true,
            show_hints: true,
            padding: Padding {
                top: 0,
                right: 1,
                bottom: 0,
                left: 1,
            },
            border_color: 240,
            background_color: 235,
            text_color: 250,
            title_color: 255,
            affirmation_color: 109,
            box_width_fraction: 0.5,
            task_colors: DEFAULT_PALETTE.to_vec(),
            glyphs: BoxGlyphs {
                top_left: "┌".to_string(),
                top_right: "┐".to_string(),
                bottom_left: "└".to_string(),
                bottom_right: "┘".to_string(),
                horizontal: "─".to_string(),
                vertical: "│".to_string(),
            },
            explicit: BTreeSet::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SettingGroup {
    Content,
    Display,
    Padding,
    Colors,
    Box,
}

impl SettingGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            SettingGroup::Content => "content",
            SettingGroup::Display => "display",
            SettingGroup::Padding => "padding",
            SettingGroup::Colors => "colors",
            SettingGroup::Box => "box",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetScope {
    All,
    Group(SettingGroup),
}

impl ResetScope {
    pub fn parse(value: &str) -> Result<Self, SettingsError> {
        match value.trim().to_lowercase().as_str() {
            "" | "all" => Ok(ResetScope::All),
            "content" => Ok(ResetScope::Group(SettingGroup::Content)),
            "display" => Ok(ResetScope::Group(SettingGroup::Display)),
            "padding" => Ok(ResetScope::Group(SettingGroup::Padding)),
            "colors" | "color" => Ok(ResetScope::Group(SettingGroup::Colors)),
            "box" => Ok(ResetScope::Group(SettingGroup::Box)),
            other => Err(SettingsError::UnknownScope(other.to_string())),
        }
    }

    fn covers(&self, group: SettingGroup) -> bool {
        match self {
            ResetScope::All => true,
            ResetScope::Group(g) => *g == group,
        }
    }
}

/// One row of the settings table: how a key is read, validated and written.
pub struct SettingSpec {
    pub key: &'static str,
    pub group: SettingGroup,
    pub description: &'static str,
    get: fn(&Settings) -> String,
    set: fn(&mut Settings, &str) -> Result<(), String>,
}

impl SettingSpec {
    pub fn get(&self, settings: &Settings) -> String {
        (self.get)(settings)
    }

    /// Validates `value` and stores it. Nothing changes on error.
    pub fn apply(&self, settings: &mut Settings, value: &str) -> Result<(), SettingsError> {
        (self.set)(settings, value).map_err(|reason| SettingsError::InvalidValue {
            key: self.key.to_string(),
            value: value.to_string(),
            reason,
        })
    }

    /// Glyph values may carry meaningful leading or trailing spaces.
    pub fn keeps_whitespace(&self) -> bool {
        self.key.ends_with("-char")
            || (self.group == SettingGroup::Box && self.key != "box-width-fraction")
    }

    pub fn env_var(&self) -> String {
        format!("{}{}", ENV_PREFIX, self.key.to_uppercase().replace('-', "_"))
    }
}

fn parse_bool(value: &str) -> Result<bool, String> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err("expected true or false".to_string()),
    }
}

fn parse_color(value: &str) -> Result<u8, String> {
    let n: u32 = value
        .trim()
        .parse()
        .map_err(|_| "expected a color number 0-255".to_string())?;
    u8::try_from(n).map_err(|_| "color must be between 0 and 255".to_string())
}

fn parse_padding(value: &str) -> Result<usize, String> {
    let n: usize = value
        .trim()
        .parse()
        .map_err(|_| "expected a non-negative integer".to_string())?;
    if n > MAX_PADDING {
        return Err(format!("padding must be at most {}", MAX_PADDING));
    }
    Ok(n)
}

fn parse_fraction(value: &str) -> Result<f64, String> {
    let f: f64 = value
        .trim()
        .parse()
        .map_err(|_| "expected a number in (0, 1]".to_string())?;
    if !f.is_finite() || f <= 0.0 || f > 1.0 {
        return Err("fraction must be greater than 0 and at most 1".to_string());
    }
    Ok(f)
}

fn parse_palette(value: &str) -> Result<Vec<u8>, String> {
    let colors = value
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(parse_color)
        .collect::<Result<Vec<_>, _>>()?;
    if colors.is_empty() {
        return Err("palette needs at least one color".to_string());
    }
    Ok(colors)
}

fn parse_glyph(value: &str) -> Result<String, String> {
    let glyph = strip_control(value);
    let width = display_width(&glyph);
    if width == 0 {
        return Err("glyph must not be empty".to_string());
    }
    if width > MAX_GLYPH_WIDTH {
        return Err(format!("glyph must be at most {} columns wide", MAX_GLYPH_WIDTH));
    }
    Ok(glyph)
}

fn parse_title(value: &str) -> Result<String, String> {
    let title = strip_control(value).trim().to_string();
    if title.is_empty() {
        return Err("title must not be empty".to_string());
    }
    if display_width(&title) > MAX_TITLE_WIDTH {
        return Err(format!("title must be at most {} columns wide", MAX_TITLE_WIDTH));
    }
    Ok(title)
}

fn join_palette(colors: &[u8]) -> String {
    colors
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

pub static SETTINGS: &[SettingSpec] = &[
    SettingSpec {
        key: "title",
        group: SettingGroup::Content,
        description: "Heading shown at the top of the box",
        get: |s| s.title.clone(),
        set: |s, v| {
            s.title = parse_title(v)?;
            Ok(())
        },
    },
    SettingSpec {
        key: "heart-char",
        group: SettingGroup::Content,
        description: "Glyph decorating the affirmation",
        get: |s| s.heart_char.clone(),
        set: |s, v| {
            s.heart_char = parse_glyph(v)?;
            Ok(())
        },
    },
    SettingSpec {
        key: "heart-position",
        group: SettingGroup::Content,
        description: "Where the heart goes: left, right, both or none",
        get: |s| s.heart_position.as_str().to_string(),
        set: |s, v| {
            s.heart_position = HeartPosition::parse(v)
                .ok_or_else(|| "expected left, right, both or none".to_string())?;
            Ok(())
        },
    },
    SettingSpec {
        key: "bullet-char",
        group: SettingGroup::Content,
        description: "Glyph in front of each task",
        get: |s| s.bullet_char.clone(),
        set: |s, v| {
            s.bullet_char = parse_glyph(v)?;
            Ok(())
        },
    },
    SettingSpec {
        key: "show-affirmation",
        group: SettingGroup::Display,
        description: "Show the affirmation next to the box",
        get: |s| s.show_affirmation.to_string(),
        set: |s, v| {
            s.show_affirmation = parse_bool(v)?;
            Ok(())
        },
    },
    SettingSpec {
        key: "show-box",
        group: SettingGroup::Display,
        description: "Draw the task box",
        get: |s| s.show_box.to_string(),
        set: |s, v| {
            s.show_box = parse_bool(v)?;
            Ok(())
        },
    },
    SettingSpec {
        key: "show-hints",
        group: SettingGroup::Display,
        description: "Occasionally print a usage hint below the box",
        get: |s| s.show_hints.to_string(),
        set: |s, v| {
            s.show_hints = parse_bool(v)?;
            Ok(())
        },
    },
    SettingSpec {
        key: "padding-top",
        group: SettingGroup::Padding,
        description: "Blank rows above the title",
        get: |s| s.padding.top.to_string(),
        set: |s, v| {
            s.padding.top = parse_padding(v)?;
            Ok(())
        },
    },
    SettingSpec {
        key: "padding-right",
        group: SettingGroup::Padding,
        description: "Blank columns before the right border",
        get: |s| s.padding.right.to_string(),
        set: |s, v| {
            s.padding.right = parse_padding(v)?;
            Ok(())
        },
    },
    SettingSpec {
        key: "padding-bottom",
        group: SettingGroup::Padding,
        description: "Blank rows below the last task",
        get: |s| s.padding.bottom.to_string(),
        set: |s, v| {
            s.padding.bottom = parse_padding(v)?;
            Ok(())
        },
    },
    SettingSpec {
        key: "padding-left",
        group: SettingGroup::Padding,
        description: "Blank columns after the left border",
        get: |s| s.padding.left.to_string(),
        set: |s, v| {
            s.padding.left = parse_padding(v)?;
            Ok(())
        },
    },
    SettingSpec {
        key: "border-color",
        group: SettingGroup::Colors,
        description: "256-color code of the box border",
        get: |s| s.border_color.to_string(),
        set: |s, v| {
            s.border_color = parse_color(v)?;
            Ok(())
        },
    },
    SettingSpec {
        key: "background-color",
        group: SettingGroup::Colors,
        description: "256-color code behind the box contents",
        get: |s| s.background_color.to_string(),
        set: |s, v| {
            s.background_color = parse_color(v)?;
            Ok(())
        },
    },
    SettingSpec {
        key: "text-color",
        group: SettingGroup::Colors,
        description: "256-color code for hints and secondary text",
        get: |s| s.text_color.to_string(),
        set: |s, v| {
            s.text_color = parse_color(v)?;
            Ok(())
        },
    },
    SettingSpec {
        key: "title-color",
        group: SettingGroup::Colors,
        description: "256-color code of the title",
        get: |s| s.title_color.to_string(),
        set: |s, v| {
            s.title_color = parse_color(v)?;
            Ok(())
        },
    },
    SettingSpec {
        key: "affirmation-color",
        group: SettingGroup::Colors,
        description: "256-color code of the affirmation",
        get: |s| s.affirmation_color.to_string(),
        set: |s, v| {
            s.affirmation_color = parse_color(v)?;
            Ok(())
        },
    },
    SettingSpec {
        key: "task-colors",
        group: SettingGroup::Colors,
        description: "Comma-separated palette new tasks cycle through",
        get: |s| join_palette(&s.task_colors),
        set: |s, v| {
            s.task_colors = parse_palette(v)?;
            Ok(())
        },
    },
    SettingSpec {
        key: "box-width-fraction",
        group: SettingGroup::Box,
        description: "Share of the terminal width used by the box",
        get: |s| s.box_width_fraction.to_string(),
        set: |s, v| {
            s.box_width_fraction = parse_fraction(v)?;
            Ok(())
        },
    },
    SettingSpec {
        key: "box-top-left",
        group: SettingGroup::Box,
        description: "Top-left corner glyph",
        get: |s| s.glyphs.top_left.clone(),
        set: |s, v| {
            s.glyphs.top_left = parse_glyph(v)?;
            Ok(())
        },
    },
    SettingSpec {
        key: "box-top-right",
        group: SettingGroup::Box,
        description: "Top-right corner glyph",
        get: |s| s.glyphs.top_right.clone(),
        set: |s, v| {
            s.glyphs.top_right = parse_glyph(v)?;
            Ok(())
        },
    },
    SettingSpec {
        key: "box-bottom-left",
        group: SettingGroup::Box,
        description: "Bottom-left corner glyph",
        get: |s| s.glyphs.bottom_left.clone(),
        set: |s, v| {
            s.glyphs.bottom_left = parse_glyph(v)?;
            Ok(())
        },
    },
    SettingSpec {
        key: "box-bottom-right",
        group: SettingGroup::Box,
        description: "Bottom-right corner glyph",
        get: |s| s.glyphs.bottom_right.clone(),
        set: |s, v| {
            s.glyphs.bottom_right = parse_glyph(v)?;
            Ok(())
        },
    },
    SettingSpec {
        key: "box-horizontal",
        group: SettingGroup::Box,
        description: "Glyph repeated along the top and bottom edges",
        get: |s| s.glyphs.horizontal.clone(),
        set: |s, v| {
            s.glyphs.horizontal = parse_glyph(v)?;
            Ok(())
        },
    },
    SettingSpec {
        key: "box-vertical",
        group: SettingGroup::Box,
        description: "Glyph on the left and right edges",
        get: |s| s.glyphs.vertical.clone(),
        set: |s, v| {
            s.glyphs.vertical = parse_glyph(v)?;
            Ok(())
        },
    },
];

pub fn find_setting(key: &str) -> Option<&'static SettingSpec> {
    let key = key.trim().to_lowercase().replace('_', "-");
    SETTINGS.iter().find(|spec| spec.key == key)
}

pub struct Preset {
    pub name: &'static str,
    pub description: &'static str,
    pub overrides: &'static [(&'static str, &'static str)],
}

pub static PRESETS: &[Preset] = &[
    Preset {
        name: "subtle",
        description: "Muted greys that stay out of the way",
        overrides: &[
            ("border-color", "238"),
            ("background-color", "234"),
            ("text-color", "245"),
            ("title-color", "250"),
            ("affirmation-color", "243"),
            ("task-colors", "103,108,138,144,109,139"),
        ],
    },
    Preset {
        name: "balanced",
        description: "The default look",
        overrides: &[
            ("border-color", "240"),
            ("background-color", "235"),
            ("text-color", "250"),
            ("title-color", "255"),
            ("affirmation-color", "109"),
            ("task-colors", "167,71,136,110,139,73"),
        ],
    },
    Preset {
        name: "vibrant",
        description: "Saturated task colors on a dark box",
        overrides: &[
            ("border-color", "33"),
            ("background-color", "234"),
            ("text-color", "255"),
            ("title-color", "226"),
            ("affirmation-color", "214"),
            ("task-colors", "196,46,33,226,201,51"),
        ],
    },
    Preset {
        name: "loud",
        description: "Hard to ignore",
        overrides: &[
            ("border-color", "196"),
            ("background-color", "16"),
            ("text-color", "231"),
            ("title-color", "226"),
            ("affirmation-color", "201"),
            ("task-colors", "196,202,226,46,51,201"),
        ],
    },
];

pub fn find_preset(name: &str) -> Option<&'static Preset> {
    let name = name.trim();
    PRESETS
        .iter()
        .find(|preset| preset.name.eq_ignore_ascii_case(name))
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub applied: usize,
    pub ignored: Vec<String>,
}

impl Settings {
    /// Defaults overlaid with `NUDGE_*` variables from the process environment.
    pub fn from_env() -> Self {
        Self::default().with_env(|name| std::env::var(name).ok())
    }

    /// Overlays values from `lookup`; invalid values are logged and skipped.
    pub fn with_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        for spec in SETTINGS {
            let var = spec.env_var();
            let Some(value) = lookup(&var) else {
                continue;
            };
            if let Err(err) = spec.apply(&mut self, &value) {
                warn!(variable = %var, "ignoring environment override: {}", err);
            }
        }
        self
    }

    pub fn get(&self, key: &str) -> Result<String, SettingsError> {
        let spec = find_setting(key).ok_or_else(|| SettingsError::UnknownKey(key.to_string()))?;
        Ok(spec.get(self))
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
        let spec = find_setting(key).ok_or_else(|| SettingsError::UnknownKey(key.to_string()))?;
        spec.apply(self, value)?;
        self.explicit.insert(spec.key);
        Ok(())
    }

    pub fn is_explicit(&self, key: &str) -> bool {
        find_setting(key).is_some_and(|spec| self.explicit.contains(spec.key))
    }

    /// Applies a persisted snapshot. Keys outside the table are ignored and
    /// invalid values are skipped individually.
    pub fn apply_snapshot<'a, I>(&mut self, pairs: I)
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        for (key, value) in pairs {
            let Some(spec) = find_setting(key) else {
                debug!(key, "ignoring unknown key in saved settings");
                continue;
            };
            match spec.apply(self, value) {
                Ok(()) => {
                    self.explicit.insert(spec.key);
                }
                Err(err) => warn!("ignoring saved setting: {}", err),
            }
        }
    }

    /// Key/value pairs to persist, in table order: every explicit key plus
    /// anything else that differs from `base`.
    pub fn snapshot(&self, base: &Settings) -> Vec<(&'static str, String)> {
        SETTINGS
            .iter()
            .filter_map(|spec| {
                let value = spec.get(self);
                (self.explicit.contains(spec.key) || value != spec.get(base))
                    .then_some((spec.key, value))
            })
            .collect()
    }

    pub fn entries(&self) -> Vec<(&'static str, String)> {
        SETTINGS
            .iter()
            .map(|spec| (spec.key, spec.get(self)))
            .collect()
    }

    /// Applies every override of the preset, or none of them.
    pub fn apply_preset(&mut self, name: &str) -> Result<&'static Preset, SettingsError> {
        let preset = find_preset(name).ok_or_else(|| SettingsError::UnknownPreset(name.to_string()))?;
        let mut next = self.clone();
        for (key, value) in preset.overrides {
            next.set(key, value)?;
        }
        *self = next;
        Ok(preset)
    }

    /// Restores the settings in `scope` to the values in `base` and forgets
    /// that they were ever chosen, so they follow the base layer again.
    pub fn reset(&mut self, scope: ResetScope, base: &Settings) {
        for spec in SETTINGS.iter().filter(|spec| scope.covers(spec.group)) {
            let value = spec.get(base);
            if let Err(err) = spec.apply(self, &value) {
                warn!("could not reset {}: {}", spec.key, err);
            }
            self.explicit.remove(spec.key);
        }
    }

    pub fn export_text(&self, colors_only: bool) -> String {
        let mut out = String::new();
        for spec in SETTINGS {
            if colors_only && spec.group != SettingGroup::Colors {
                continue;
            }
            out.push_str(spec.key);
            out.push('=');
            out.push_str(&spec.get(self));
            out.push('\n');
        }
        out
    }

    pub fn export_to(&self, path: &Path, colors_only: bool) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.export_text(colors_only))?;
        Ok(())
    }

    /// Parses `key=value` pairs separated by newlines or the record
    /// separator. All values must validate before any is applied.
    pub fn import_text(&mut self, text: &str, origin: &Path) -> Result<ImportReport, SettingsError> {
        let mut next = self.clone();
        let mut report = ImportReport::default();
        for (idx, raw) in text.split(['\n', crate::store::FIELD_SEPARATOR]).enumerate() {
            let line = raw.strip_suffix('\r').unwrap_or(raw);
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                return Err(SettingsError::Malformed {
                    path: origin.to_path_buf(),
                    line: idx + 1,
                });
            };
            let key = key.trim();
            match find_setting(key) {
                Some(spec) => {
                    let value = if spec.keeps_whitespace() {
                        value
                    } else {
                        value.trim()
                    };
                    spec.apply(&mut next, value)?;
                    next.explicit.insert(spec.key);
                    report.applied += 1;
                }
                None => {
                    warn!(key, "ignoring unknown key in {}", origin.display());
                    report.ignored.push(key.to_string());
                }
            }
        }
        *self = next;
        Ok(report)
    }

    pub fn import_from(&mut self, path: &Path) -> Result<ImportReport, SettingsError> {
        let text = fs::read_to_string(path)?;
        self.import_text(&text, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn table_keys_are_unique_and_round_trip_defaults() {
        let defaults = Settings::default();
        let mut seen = std::collections::HashSet::new();
        for spec in SETTINGS {
            assert!(seen.insert(spec.key), "duplicate key {}", spec.key);
            let mut copy = Settings::default();
            spec.apply(&mut copy, &spec.get(&defaults)).expect("default validates");
            assert_eq!(copy, defaults, "{} did not round trip", spec.key);
        }
    }

    #[test]
    fn border_color_out_of_range_is_rejected_without_change() {
        let mut settings = Settings::default();
        settings.set("border-color", "12").expect("valid color");
        let err = settings.set("border-color", "256").expect_err("256 rejected");
        assert!(matches!(err, SettingsError::InvalidValue { ref key, .. } if key == "border-color"));
        assert_eq!(settings.border_color, 12);
        assert!(settings.set("border-color", "-1").is_err());
        assert!(settings.set("border-color", "red").is_err());
    }

    #[test]
    fn booleans_must_be_exact() {
        let mut settings = Settings::default();
        assert!(settings.set("show-box", "yes").is_err());
        assert!(settings.set("show-box", "True").is_err());
        settings.set("show-box", "false").expect("false");
        assert!(!settings.show_box);
    }

    #[test]
    fn fraction_palette_and_glyph_validation() {
        let mut settings = Settings::default();
        assert!(settings.set("box-width-fraction", "0").is_err());
        assert!(settings.set("box-width-fraction", "1.5").is_err());
        settings.set("box-width-fraction", "1").expect("upper bound");
        assert_eq!(settings.box_width_fraction, 1.0);

        assert!(settings.set("task-colors", "").is_err());
        assert!(settings.set("task-colors", "1,300").is_err());
        settings.set("task-colors", " 1, 2 ,3 ").expect("palette");
        assert_eq!(settings.task_colors, vec![1, 2, 3]);

        assert!(settings.set("bullet-char", "").is_err());
        assert!(settings.set("bullet-char", "abcde").is_err());
        settings.set("bullet-char", "🚀").expect("emoji glyph");
        assert_eq!(settings.bullet_char, "🚀");

        assert!(settings.set("heart-position", "top").is_err());
        settings.set("heart_position", "both").expect("underscore alias");
        assert_eq!(settings.heart_position, HeartPosition::Both);
    }

    #[test]
    fn unknown_key_is_reported() {
        let mut settings = Settings::default();
        assert!(matches!(
            settings.set("nope", "1"),
            Err(SettingsError::UnknownKey(_))
        ));
    }

    #[test]
    fn env_overrides_apply_and_invalid_ones_are_skipped() {
        let vars: HashMap<&str, &str> = [
            ("NUDGE_TITLE", "TODO"),
            ("NUDGE_BORDER_COLOR", "999"),
            ("NUDGE_PADDING_LEFT", "3"),
        ]
        .into_iter()
        .collect();
        let settings = Settings::default().with_env(|name| vars.get(name).map(|v| v.to_string()));
        assert_eq!(settings.title, "TODO");
        assert_eq!(settings.border_color, Settings::default().border_color);
        assert_eq!(settings.padding.left, 3);
    }

    #[test]
    fn snapshot_holds_only_changed_keys() {
        let base = Settings::default();
        let mut settings = base.clone();
        assert!(settings.snapshot(&base).is_empty());
        settings.set("text-color", "42").expect("set");
        assert_eq!(settings.snapshot(&base), vec![("text-color", "42".to_string())]);
    }

    #[test]
    fn snapshot_ignores_unknown_and_invalid_pairs() {
        let mut settings = Settings::default();
        settings.apply_snapshot([("title", "Work"), ("evil", "1"), ("text-color", "900")]);
        assert_eq!(settings.title, "Work");
        assert_eq!(settings.text_color, Settings::default().text_color);
    }

    #[test]
    fn preset_applies_all_overrides() {
        let mut settings = Settings::default();
        let preset = settings.apply_preset("LOUD").expect("preset");
        assert_eq!(preset.name, "loud");
        assert_eq!(settings.border_color, 196);
        assert_eq!(settings.task_colors, vec![196, 202, 226, 46, 51, 201]);
        assert!(matches!(
            settings.apply_preset("quiet"),
            Err(SettingsError::UnknownPreset(_))
        ));
    }

    #[test]
    fn every_preset_validates() {
        for preset in PRESETS {
            let mut settings = Settings::default();
            settings.apply_preset(preset.name).expect(preset.name);
        }
    }

    #[test]
    fn reset_scope_only_touches_its_group() {
        let base = Settings::default();
        let mut settings = base.clone();
        settings.set("border-color", "1").expect("set");
        settings.set("padding-top", "2").expect("set");
        settings.reset(ResetScope::parse("colors").expect("scope"), &base);
        assert_eq!(settings.border_color, base.border_color);
        assert_eq!(settings.padding.top, 2);
        settings.reset(ResetScope::All, &base);
        assert_eq!(settings, base);
        assert!(ResetScope::parse("everything").is_err());
    }

    #[test]
    fn import_is_atomic() {
        let mut settings = Settings::default();
        let origin = Path::new("theme.conf");
        let err = settings
            .import_text("border-color=10\ntext-color=300\n", origin)
            .expect_err("invalid import");
        assert!(matches!(err, SettingsError::InvalidValue { .. }));
        assert_eq!(settings, Settings::default());

        let report = settings
            .import_text("# theme\nborder-color=10\n\nmystery=1\n", origin)
            .expect("import");
        assert_eq!(report.applied, 1);
        assert_eq!(report.ignored, vec!["mystery".to_string()]);
        assert_eq!(settings.border_color, 10);

        assert!(matches!(
            settings.import_text("garbage", origin),
            Err(SettingsError::Malformed { line: 1, .. })
        ));
    }

    #[test]
    fn export_and_import_round_trip() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("themes").join("mine.conf");
        let mut original = Settings::default();
        original.apply_preset("vibrant").expect("preset");
        original.set("title", "Today").expect("title");
        original.export_to(&path, false).expect("export");

        let mut restored = Settings::default();
        let report = restored.import_from(&path).expect("import");
        assert_eq!(report.applied, SETTINGS.len());
        assert_eq!(restored.entries(), original.entries());
    }

    #[test]
    fn import_keeps_spaces_in_glyphs() {
        let mut original = Settings::default();
        original.set("heart-char", " ♥").expect("padded heart");
        original.set("box-horizontal", "- ").expect("padded rule");
        let text = original.export_text(false);

        let mut restored = Settings::default();
        restored
            .import_text(&text, Path::new("glyphs.conf"))
            .expect("import");
        assert_eq!(restored.heart_char, " ♥");
        assert_eq!(restored.glyphs.horizontal, "- ");

        restored
            .import_text("border-color = 12 \r\n", Path::new("spaced.conf"))
            .expect("spaced numbers");
        assert_eq!(restored.border_color, 12);
    }

    #[test]
    fn explicit_keys_survive_snapshot_and_reset_forgets_them() {
        let base = Settings::default().with_env(|name| {
            (name == "NUDGE_TITLE").then(|| "WORK".to_string())
        });
        assert_eq!(base.title, "WORK");
        assert!(!base.is_explicit("title"));

        let mut settings = base.clone();
        settings.set("title", "WORK").expect("set");
        assert!(settings.is_explicit("title"));
        assert_eq!(settings.snapshot(&base), vec![("title", "WORK".to_string())]);

        let mut reloaded = Settings::default();
        reloaded.apply_snapshot([("title", "WORK")]);
        assert!(reloaded.is_explicit("title"));

        settings.reset(ResetScope::parse("content").expect("scope"), &base);
        assert!(!settings.is_explicit("title"));
        assert!(settings.snapshot(&base).is_empty());
    }

    #[test]
    fn colors_only_export_skips_other_groups() {
        let text = Settings::default().export_text(true);
        assert!(text.contains("border-color="));
        assert!(text.contains("task-colors="));
        assert!(!text.contains("title="));
        assert!(!text.contains("padding-left="));
    }
}
