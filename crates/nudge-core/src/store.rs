//! The task file.
//!
//! Layout, one field per line:
//!
//! 1. task texts joined by [`FIELD_SEPARATOR`]
//! 2. task colors joined the same way
//! 3. the color cursor
//! 4. `key=value` settings that differ from the base layer (optional on read)
//!
//! Any other line count is a format error: the file is copied aside and the
//! state starts over empty.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::Local;
use fs2::FileExt;
use thiserror::Error;
use tracing::{debug, warn};
use ulid::Ulid;

use crate::settings::Settings;
use crate::tasks::{sanitize_task_text, Task, TaskList};

/// ASCII unit separator. Task text and settings never contain control
/// characters, so it cannot collide with content.
pub const FIELD_SEPARATOR: char = '\x1f';
pub const SAVE_FILE_NAME: &str = "tasks.save";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to read {}: {}", .path.display(), .source)]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to write {}: {}", .path.display(), .source)]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(
        "Refusing to overwrite {}: it could not be read or backed up; move it aside and retry",
        .path.display()
    )]
    Protected { path: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("expected 3 or 4 lines, found {0}")]
    LineCount(usize),
    #[error("invalid color cursor {0:?}")]
    Cursor(String),
    #[error("file is not valid UTF-8")]
    Encoding,
}

pub fn resolve_user_home_dir() -> Option<PathBuf> {
    if let Ok(home) = std::env::var("HOME") {
        let trimmed = home.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed));
        }
    }
    if let Ok(profile) = std::env::var("USERPROFILE") {
        let trimmed = profile.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed));
        }
    }
    None
}

pub fn resolve_nudge_home_dir() -> Option<PathBuf> {
    if let Ok(value) = std::env::var("NUDGE_HOME") {
        let trimmed = value.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed));
        }
    }
    resolve_user_home_dir().map(|home| home.join(".nudge"))
}

pub fn default_save_path() -> Option<PathBuf> {
    if let Ok(value) = std::env::var("NUDGE_SAVE_FILE") {
        let trimmed = value.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed));
        }
    }
    resolve_nudge_home_dir().map(|home| home.join(SAVE_FILE_NAME))
}

pub fn encode_fields<I, S>(fields: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = String::new();
    for (idx, field) in fields.into_iter().enumerate() {
        if idx > 0 {
            out.push(FIELD_SEPARATOR);
        }
        out.push_str(field.as_ref());
    }
    out
}

/// Inverse of [`encode_fields`]. An empty line holds zero fields.
pub fn decode_fields(line: &str) -> Vec<&str> {
    if line.is_empty() {
        return Vec::new();
    }
    line.split(FIELD_SEPARATOR).collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord<'a> {
    pub texts: Vec<&'a str>,
    pub colors: Vec<&'a str>,
    pub cursor: usize,
    pub settings: Vec<(&'a str, &'a str)>,
}

pub fn encode_record(tasks: &TaskList, settings: &Settings, base: &Settings) -> String {
    let texts = encode_fields(tasks.iter().map(|task| task.text.as_str()));
    let colors = encode_fields(tasks.iter().map(|task| task.color.to_string()));
    let pairs = encode_fields(
        settings
            .snapshot(base)
            .into_iter()
            .map(|(key, value)| format!("{}={}", key, value)),
    );
    format!("{}\n{}\n{}\n{}\n", texts, colors, tasks.color_cursor, pairs)
}

pub fn decode_record(text: &str) -> Result<RawRecord<'_>, FormatError> {
    let lines: Vec<&str> = text.lines().collect();
    if lines.len() != 3 && lines.len() != 4 {
        return Err(FormatError::LineCount(lines.len()));
    }
    let cursor_raw = lines[2].trim();
    let cursor = cursor_raw
        .parse::<usize>()
        .map_err(|_| FormatError::Cursor(cursor_raw.to_string()))?;
    let settings = match lines.get(3) {
        Some(line) => decode_fields(line)
            .into_iter()
            .filter_map(|pair| pair.split_once('='))
            .map(|(key, value)| (key.trim(), value))
            .collect(),
        None => Vec::new(),
    };
    Ok(RawRecord {
        texts: decode_fields(lines[0]),
        colors: decode_fields(lines[1]),
        cursor,
        settings,
    })
}

/// Cheap fingerprint deciding whether the cached state is stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModToken {
    modified: Option<SystemTime>,
    len: u64,
}

impl ModToken {
    fn from_metadata(meta: &fs::Metadata) -> Self {
        Self {
            modified: meta.modified().ok(),
            len: meta.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// No file yet (or an empty one).
    Missing,
    /// Served from memory; the file did not change since the last read or write.
    Cached,
    Loaded,
    /// Color count disagreed with task count; colors were reassigned and saved.
    Regenerated,
    /// Task text held control characters, blank entries or overlong text;
    /// the cleaned list was saved.
    Cleaned,
    /// Unexpected layout; the original bytes were copied to `backup`.
    Reset { backup: PathBuf },
    /// The file exists but could not be read (or backed up); defaults are in
    /// effect and saves are refused until a later load succeeds.
    Unreadable,
}

#[derive(Debug, Clone)]
pub struct Loaded {
    pub tasks: TaskList,
    pub settings: Settings,
    pub outcome: LoadOutcome,
}

struct Cached {
    token: ModToken,
    tasks: TaskList,
    settings: Settings,
}

pub struct Store {
    path: PathBuf,
    base: Settings,
    cache: Option<Cached>,
    disk_reads: usize,
    protected: bool,
}

impl Store {
    /// `base` is the defaults-plus-environment layer the saved snapshot is
    /// applied on top of.
    pub fn new(path: impl Into<PathBuf>, base: Settings) -> Self {
        Self {
            path: path.into(),
            base,
            cache: None,
            disk_reads: 0,
            protected: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn base(&self) -> &Settings {
        &self.base
    }

    /// Number of times the file contents were actually read.
    pub fn disk_reads(&self) -> usize {
        self.disk_reads
    }

    /// True while the file on disk holds bytes that were neither loaded nor
    /// backed up, so saving would destroy them.
    pub fn is_protected(&self) -> bool {
        self.protected
    }

    fn defaults(&self, outcome: LoadOutcome) -> Loaded {
        Loaded {
            tasks: TaskList::default(),
            settings: self.base.clone(),
            outcome,
        }
    }

    fn remember(&mut self, token: ModToken, tasks: &TaskList, settings: &Settings) {
        self.cache = Some(Cached {
            token,
            tasks: tasks.clone(),
            settings: settings.clone(),
        });
    }

    /// Loads the task list and settings. Never fails: problems are logged and
    /// degrade to defaults.
    pub fn load(&mut self) -> Loaded {
        let meta = match fs::metadata(&self.path) {
            Ok(meta) => meta,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                self.cache = None;
                self.protected = false;
                return self.defaults(LoadOutcome::Missing);
            }
            Err(err) => {
                warn!("cannot stat {}: {}", self.path.display(), err);
                self.protected = true;
                return self.defaults(LoadOutcome::Unreadable);
            }
        };
        let token = ModToken::from_metadata(&meta);
        if let Some(cached) = self.cache.as_ref().filter(|c| c.token == token) {
            return Loaded {
                tasks: cached.tasks.clone(),
                settings: cached.settings.clone(),
                outcome: LoadOutcome::Cached,
            };
        }

        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!("cannot read {}: {}", self.path.display(), err);
                self.protected = true;
                return self.defaults(LoadOutcome::Unreadable);
            }
        };
        self.disk_reads += 1;
        self.protected = false;
        debug!(path = %self.path.display(), bytes = bytes.len(), "read task file");

        if bytes.is_empty() {
            let loaded = self.defaults(LoadOutcome::Missing);
            self.remember(token, &loaded.tasks, &loaded.settings);
            return loaded;
        }

        let parsed = std::str::from_utf8(&bytes)
            .map_err(|_| FormatError::Encoding)
            .and_then(decode_record);
        let record = match parsed {
            Ok(record) => record,
            Err(err) => return self.reset_corrupt(&bytes, &err),
        };

        let mut settings = self.base.clone();
        settings.apply_snapshot(record.settings.iter().copied());

        let colors: Option<Vec<u8>> = record
            .colors
            .iter()
            .map(|raw| raw.trim().parse::<u8>().ok())
            .collect::<Option<Vec<u8>>>()
            .filter(|colors| colors.len() == record.texts.len());
        let palette_len = settings.task_colors.len().max(1);
        let mut tasks = TaskList {
            tasks: Vec::with_capacity(record.texts.len()),
            color_cursor: record.cursor % palette_len,
        };
        let mut cleaned = false;
        for (idx, raw) in record.texts.iter().enumerate() {
            // Blank entries are dropped along with their color.
            let Some(text) = sanitize_task_text(raw) else {
                cleaned = true;
                continue;
            };
            cleaned |= text != *raw;
            let color = colors
                .as_ref()
                .and_then(|colors| colors.get(idx).copied())
                .unwrap_or(0);
            tasks.tasks.push(Task { text, color });
        }

        let outcome = match (colors.is_some(), cleaned) {
            (true, false) => {
                self.remember(token, &tasks, &settings);
                return Loaded {
                    tasks,
                    settings,
                    outcome: LoadOutcome::Loaded,
                };
            }
            (true, true) => {
                warn!(
                    tasks = tasks.len(),
                    entries = record.texts.len(),
                    "task text needed cleaning; saving the cleaned list"
                );
                LoadOutcome::Cleaned
            }
            (false, _) => {
                warn!(
                    tasks = tasks.len(),
                    colors = record.colors.len(),
                    "task colors out of sync; reassigning from palette"
                );
                tasks.regenerate_colors(&settings.task_colors);
                LoadOutcome::Regenerated
            }
        };
        if let Err(err) = self.save(&tasks, &settings) {
            warn!("could not persist repaired task file: {}", err);
            self.remember(token, &tasks, &settings);
        }
        Loaded {
            tasks,
            settings,
            outcome,
        }
    }

    fn reset_corrupt(&mut self, bytes: &[u8], err: &FormatError) -> Loaded {
        let backup = backup_path(&self.path);
        if let Err(copy_err) = fs::write(&backup, bytes) {
            // Without a backup the original must stay where it is.
            warn!(
                "{} is malformed ({}) and could not be backed up: {}",
                self.path.display(),
                err,
                copy_err
            );
            self.protected = true;
            return self.defaults(LoadOutcome::Unreadable);
        }
        warn!(
            "{} is malformed ({}); saved a copy to {} and started fresh",
            self.path.display(),
            err,
            backup.display()
        );
        let loaded = self.defaults(LoadOutcome::Reset {
            backup: backup.clone(),
        });
        if let Err(save_err) = self.save(&loaded.tasks, &loaded.settings) {
            warn!("could not reset {}: {}", self.path.display(), save_err);
        }
        loaded
    }

    /// Writes the record through a temp file and rename. On failure the
    /// previous file and the cache are left as they were.
    pub fn save(&mut self, tasks: &TaskList, settings: &Settings) -> Result<(), StoreError> {
        if self.protected {
            return Err(StoreError::Protected {
                path: self.path.clone(),
            });
        }
        let body = encode_record(tasks, settings, &self.base);
        let write_err = |source| StoreError::Write {
            path: self.path.clone(),
            source,
        };

        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        fs::create_dir_all(&dir).map_err(write_err)?;

        let file_name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| SAVE_FILE_NAME.to_string());
        let lock = fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(dir.join(format!("{}.lock", file_name)))
            .map_err(write_err)?;
        lock.lock_exclusive().map_err(write_err)?;

        let tmp = dir.join(format!(".{}.{}.tmp", file_name, Ulid::new()));
        let result = write_atomically(&tmp, &self.path, body.as_bytes());
        let _ = FileExt::unlock(&lock);
        if let Err(err) = result {
            let _ = fs::remove_file(&tmp);
            return Err(write_err(err));
        }

        let token = fs::metadata(&self.path)
            .map(|meta| ModToken::from_metadata(&meta))
            .map_err(|source| StoreError::Read {
                path: self.path.clone(),
                source,
            })?;
        self.remember(token, tasks, settings);
        debug!(path = %self.path.display(), tasks = tasks.len(), "saved task file");
        Ok(())
    }
}

fn write_atomically(tmp: &Path, target: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = fs::File::create(tmp)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    drop(file);
    fs::rename(tmp, target)
}

fn backup_path(path: &Path) -> PathBuf {
    let stamp = Local::now().format("%Y%m%d-%H%M%S").to_string();
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| SAVE_FILE_NAME.to_string());
    let mut candidate = path.with_file_name(format!("{}.bak-{}", name, stamp));
    let mut n = 1;
    while candidate.exists() {
        candidate = path.with_file_name(format!("{}.bak-{}-{}", name, stamp, n));
        n += 1;
    }
    candidate
}
