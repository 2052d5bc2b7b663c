use serde::Serialize;
use thiserror::Error;

use crate::palette;

pub const MAX_TASK_CHARS: usize = 500;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TaskError {
    #[error("Task text is empty")]
    EmptyText,
    #[error("Completion pattern is empty")]
    EmptyPattern,
    #[error("No task matches {0:?}")]
    NotFound(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Task {
    pub text: String,
    /// 256-color code used for the bullet and text.
    pub color: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaskList {
    pub tasks: Vec<Task>,
    /// Palette index handed to the next added task.
    pub color_cursor: usize,
}

/// Drops control characters, which also keeps the record separator out of
/// anything that gets persisted.
pub fn strip_control(text: &str) -> String {
    text.chars().filter(|ch| !ch.is_control()).collect()
}

/// Normalizes user input into storable task text: whitespace controls become
/// spaces, other controls vanish, and the result is capped at
/// [`MAX_TASK_CHARS`] characters.
pub fn sanitize_task_text(text: &str) -> Option<String> {
    let spaced: String = text
        .chars()
        .map(|ch| if ch.is_whitespace() { ' ' } else { ch })
        .collect();
    let cleaned = strip_control(&spaced);
    let trimmed = cleaned.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.chars().take(MAX_TASK_CHARS).collect::<String>().trim_end().to_string())
}

impl TaskList {
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Task> {
        self.tasks.iter()
    }

    /// Appends a task colored with the next palette entry.
    pub fn add(&mut self, text: &str, palette: &[u8]) -> Result<&Task, TaskError> {
        let text = sanitize_task_text(text).ok_or(TaskError::EmptyText)?;
        let (color, cursor) = palette::next_color(self.color_cursor, palette);
        self.color_cursor = cursor;
        self.tasks.push(Task { text, color });
        Ok(&self.tasks[self.tasks.len() - 1])
    }

    /// Removes the first task whose text starts with `pattern`, ignoring case.
    pub fn complete(&mut self, pattern: &str) -> Result<Task, TaskError> {
        let needle = strip_control(pattern).trim().to_lowercase();
        if needle.is_empty() {
            return Err(TaskError::EmptyPattern);
        }
        let idx = self
            .tasks
            .iter()
            .position(|task| task.text.to_lowercase().starts_with(&needle))
            .ok_or_else(|| TaskError::NotFound(pattern.trim().to_string()))?;
        Ok(self.tasks.remove(idx))
    }

    /// Reassigns every task's color from the start of the palette.
    pub fn regenerate_colors(&mut self, palette: &[u8]) {
        let (colors, cursor) = palette::regenerate(self.tasks.len(), palette);
        for (task, color) in self.tasks.iter_mut().zip(colors) {
            task.color = color;
        }
        self.color_cursor = cursor;
    }
}
