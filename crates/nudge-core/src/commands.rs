//! User-facing operations. Each mutating command reloads the file first so
//! edits from other shells are not clobbered, applies the change, saves, and
//! reports a one-line status.

use std::path::Path;

use anyhow::{anyhow, Result};
use serde::Serialize;

use crate::layout;
use crate::settings::{ResetScope, Settings, SettingsError};
use crate::store::{default_save_path, LoadOutcome, Store};
use crate::tasks::{TaskError, TaskList};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandOutcome {
    pub ok: bool,
    pub message: String,
}

impl CommandOutcome {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Affirmation,
    Box,
    All,
}

pub struct Session {
    store: Store,
    tasks: TaskList,
    settings: Settings,
    last_load: LoadOutcome,
}

fn on_off(value: bool) -> &'static str {
    if value {
        "on"
    } else {
        "off"
    }
}

fn set_flag(settings: &mut Settings, key: &str, value: bool) -> Result<(), SettingsError> {
    settings.set(key, if value { "true" } else { "false" })
}

pub fn format_task_list(tasks: &TaskList) -> String {
    if tasks.is_empty() {
        return "No tasks.".to_string();
    }
    tasks
        .iter()
        .enumerate()
        .map(|(idx, task)| format!("  {}. {}", idx + 1, task.text))
        .collect::<Vec<_>>()
        .join("\n")
}

impl Session {
    pub fn open(mut store: Store) -> Self {
        let loaded = store.load();
        Self {
            store,
            tasks: loaded.tasks,
            settings: loaded.settings,
            last_load: loaded.outcome,
        }
    }

    /// Opens the default task file with settings from the environment.
    pub fn open_default() -> Result<Self> {
        let path = default_save_path().ok_or_else(|| {
            anyhow!("Unable to resolve home directory; set NUDGE_HOME to an absolute path")
        })?;
        Ok(Self::open(Store::new(path, Settings::from_env())))
    }

    pub fn tasks(&self) -> &TaskList {
        &self.tasks
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn last_load(&self) -> &LoadOutcome {
        &self.last_load
    }

    pub fn refresh(&mut self) {
        let loaded = self.store.load();
        self.tasks = loaded.tasks;
        self.settings = loaded.settings;
        self.last_load = loaded.outcome;
    }

    fn persist(&mut self, message: String) -> CommandOutcome {
        match self.store.save(&self.tasks, &self.settings) {
            Ok(()) => CommandOutcome::success(message),
            Err(err) => CommandOutcome::failure(format!("Could not save: {}", err)),
        }
    }

    fn apply_settings<F>(&mut self, change: F) -> Result<String, SettingsError>
    where
        F: FnOnce(&mut Settings, &Settings) -> Result<String, SettingsError>,
    {
        self.refresh();
        let mut next = self.settings.clone();
        let message = change(&mut next, self.store.base())?;
        self.settings = next;
        Ok(message)
    }

    fn settings_command<F>(&mut self, change: F) -> CommandOutcome
    where
        F: FnOnce(&mut Settings, &Settings) -> Result<String, SettingsError>,
    {
        match self.apply_settings(change) {
            Ok(message) => self.persist(message),
            Err(err) => CommandOutcome::failure(err.to_string()),
        }
    }

    pub fn add(&mut self, text: &str) -> CommandOutcome {
        self.refresh();
        let palette = self.settings.task_colors.clone();
        let added = match self.tasks.add(text, &palette) {
            Ok(task) => task.text.clone(),
            Err(err) => return CommandOutcome::failure(err.to_string()),
        };
        self.persist(format!("Added: {}", added))
    }

    pub fn complete(&mut self, pattern: &str) -> CommandOutcome {
        self.refresh();
        match self.tasks.complete(pattern) {
            Ok(task) => self.persist(format!("Completed: {}", task.text)),
            Err(TaskError::NotFound(pattern)) if self.tasks.is_empty() => {
                CommandOutcome::failure(format!("No task matches {:?}; the list is empty.", pattern))
            }
            Err(TaskError::NotFound(pattern)) => CommandOutcome::failure(format!(
                "No task matches {:?}. Current tasks:\n{}",
                pattern,
                format_task_list(&self.tasks)
            )),
            Err(err) => CommandOutcome::failure(err.to_string()),
        }
    }

    pub fn hide(&mut self) -> CommandOutcome {
        self.settings_command(|s, _| {
            set_flag(s, "show-box", false)?;
            set_flag(s, "show-affirmation", false)?;
            Ok("Reminders hidden".to_string())
        })
    }

    pub fn show(&mut self) -> CommandOutcome {
        self.settings_command(|s, _| {
            set_flag(s, "show-box", true)?;
            set_flag(s, "show-affirmation", true)?;
            Ok("Reminders shown".to_string())
        })
    }

    pub fn toggle(&mut self, which: Toggle) -> CommandOutcome {
        self.settings_command(move |s, _| {
            Ok(match which {
                Toggle::Affirmation => {
                    let next = !s.show_affirmation;
                    set_flag(s, "show-affirmation", next)?;
                    format!("Affirmation {}", on_off(s.show_affirmation))
                }
                Toggle::Box => {
                    let next = !s.show_box;
                    set_flag(s, "show-box", next)?;
                    format!("Box {}", on_off(s.show_box))
                }
                Toggle::All => {
                    let visible = !(s.show_box || s.show_affirmation);
                    set_flag(s, "show-box", visible)?;
                    set_flag(s, "show-affirmation", visible)?;
                    format!("Box and affirmation {}", on_off(visible))
                }
            })
        })
    }

    pub fn toggle_affirmation(&mut self) -> CommandOutcome {
        self.toggle(Toggle::Affirmation)
    }

    pub fn toggle_box(&mut self) -> CommandOutcome {
        self.toggle(Toggle::Box)
    }

    pub fn toggle_all(&mut self) -> CommandOutcome {
        self.toggle(Toggle::All)
    }

    pub fn config_set(&mut self, key: &str, value: &str) -> CommandOutcome {
        self.settings_command(|s, _| {
            s.set(key, value)?;
            Ok(format!("Set {} = {}", key, s.get(key)?))
        })
    }

    pub fn config_reset(&mut self, scope: &str) -> CommandOutcome {
        self.settings_command(|s, base| {
            let parsed = ResetScope::parse(scope)?;
            s.reset(parsed, base);
            Ok(match parsed {
                ResetScope::All => "Reset all settings".to_string(),
                ResetScope::Group(group) => format!("Reset {} settings", group.as_str()),
            })
        })
    }

    pub fn config_apply_preset(&mut self, name: &str) -> CommandOutcome {
        self.settings_command(|s, _| {
            let preset = s.apply_preset(name)?;
            Ok(format!("Applied preset {}", preset.name))
        })
    }

    /// Recolors existing tasks from the current palette.
    pub fn recolor(&mut self) -> CommandOutcome {
        self.refresh();
        let palette = self.settings.task_colors.clone();
        self.tasks.regenerate_colors(&palette);
        self.persist(format!("Recolored {} task(s)", self.tasks.len()))
    }

    pub fn config_export(&mut self, path: &Path, colors_only: bool) -> CommandOutcome {
        self.refresh();
        match self.settings.export_to(path, colors_only) {
            Ok(()) => CommandOutcome::success(format!(
                "Exported {} settings to {}",
                if colors_only { "color" } else { "all" },
                path.display()
            )),
            Err(err) => CommandOutcome::failure(format!("Could not export to {}: {}", path.display(), err)),
        }
    }

    pub fn config_import(&mut self, path: &Path) -> CommandOutcome {
        self.settings_command(|s, _| {
            let report = s.import_from(path)?;
            let mut message = format!("Imported {} setting(s) from {}", report.applied, path.display());
            if !report.ignored.is_empty() {
                message.push_str(&format!(" (ignored: {})", report.ignored.join(", ")));
            }
            Ok(message)
        })
    }

    /// The prompt block, or `None` when nothing should be drawn.
    pub fn render(&mut self, columns: usize, affirmation: &str) -> Option<Vec<String>> {
        self.refresh();
        layout::render_box(&self.tasks, &self.settings, columns, affirmation)
    }
}
