use std::fs;
use std::path::{Path, PathBuf};

use crate::store::resolve_nudge_home_dir;
use crate::tasks::strip_control;

pub const FALLBACK_AFFIRMATION: &str = "Keep going, you're doing great";
pub const AFFIRMATION_FILE_NAME: &str = "affirmation";

pub fn default_affirmation_path() -> Option<PathBuf> {
    if let Ok(value) = std::env::var("NUDGE_AFFIRMATION_FILE") {
        let trimmed = value.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed));
        }
    }
    resolve_nudge_home_dir().map(|home| home.join(AFFIRMATION_FILE_NAME))
}

/// First non-empty line of the cache file, or the fallback. Something else
/// keeps the file fresh; a missing or empty file is normal.
pub fn read_affirmation(path: Option<&Path>) -> String {
    path.and_then(|path| fs::read_to_string(path).ok())
        .and_then(|text| {
            text.lines()
                .map(|line| strip_control(line).trim().to_string())
                .find(|line| !line.is_empty())
        })
        .unwrap_or_else(|| FALLBACK_AFFIRMATION.to_string())
}
