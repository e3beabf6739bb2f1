//! Task persistence and the in-memory application state.

use crate::error::{Error, Result};
use crate::model::{AnnotationList, Task, TaskStatus, TaskUpdate};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ── Store ───────────────────────────────────────────────────────────────────

/// Read-one/write-one access to task records, keyed by task id.
pub trait TaskStore {
    /// Every task assigned to `user_id`, in store order.
    fn tasks_for(&self, user_id: &str) -> Result<Vec<Task>>;

    fn get(&self, task_id: &str) -> Result<Task>;

    fn update(&mut self, task_id: &str, update: TaskUpdate) -> Result<()>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct TaskFile {
    tasks: Vec<Task>,
}

/// Tasks kept in a single pretty-printed JSON file.
///
/// A missing file reads as an empty store.
#[derive(Debug, Clone)]
pub struct JsonTaskStore {
    path: PathBuf,
}

impl JsonTaskStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory relative image references resolve against.
    pub fn base_dir(&self) -> Option<&Path> {
        self.path.parent()
    }

    fn read(&self) -> Result<TaskFile> {
        if !self.path.exists() {
            return Ok(TaskFile::default());
        }
        let data = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&data)?)
    }

    fn write(&self, file: &TaskFile) -> Result<()> {
        let data = serde_json::to_string_pretty(file)?;
        std::fs::write(&self.path, data)?;
        Ok(())
    }
}

impl TaskStore for JsonTaskStore {
    fn tasks_for(&self, user_id: &str) -> Result<Vec<Task>> {
        Ok(self
            .read()?
            .tasks
            .into_iter()
            .filter(|task| task.assigned_to == user_id)
            .collect())
    }

    fn get(&self, task_id: &str) -> Result<Task> {
        self.read()?
            .tasks
            .into_iter()
            .find(|task| task.task_id == task_id)
            .ok_or_else(|| Error::TaskNotFound {
                task_id: task_id.to_owned(),
            })
    }

    fn update(&mut self, task_id: &str, update: TaskUpdate) -> Result<()> {
        let mut file = self.read()?;
        let task = file
            .tasks
            .iter_mut()
            .find(|task| task.task_id == task_id)
            .ok_or_else(|| Error::TaskNotFound {
                task_id: task_id.to_owned(),
            })?;
        task.annotations = update.annotations;
        task.status = update.status;
        self.write(&file)?;
        log::info!("store: saved task {task_id} to {}", self.path.display());
        Ok(())
    }
}

// ── App state ───────────────────────────────────────────────────────────────

/// Tasks loaded for the signed-in user and the one being worked on.
///
/// Created once at startup and handed by reference to whatever needs it.
/// All changes go through the methods below.
#[derive(Debug, Default)]
pub struct AppState {
    tasks: Vec<Task>,
    incomplete_task_ids: Vec<String>,
    current_task_index: Option<usize>,
    current_annotations: AnnotationList,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all tasks. Clears the current selection.
    pub fn set_tasks(&mut self, tasks: Vec<Task>) {
        self.incomplete_task_ids = tasks
            .iter()
            .filter(|task| task.status != TaskStatus::Completed)
            .map(|task| task.task_id.clone())
            .collect();
        self.tasks = tasks;
        self.current_task_index = None;
        self.current_annotations = AnnotationList::new();
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn task_by_id(&self, task_id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.task_id == task_id)
    }

    pub fn incomplete_task_ids(&self) -> &[String] {
        &self.incomplete_task_ids
    }

    /// First incomplete task other than `current_task_id`.
    pub fn next_incomplete_task(&self, current_task_id: &str) -> Option<&str> {
        self.incomplete_task_ids
            .iter()
            .find(|id| id.as_str() != current_task_id)
            .map(String::as_str)
    }

    pub fn set_current_task(&mut self, index: usize) -> Option<&Task> {
        let task = self.tasks.get(index)?;
        self.current_annotations = task.annotations.clone();
        self.current_task_index = Some(index);
        self.tasks.get(index)
    }

    pub fn select_task(&mut self, task_id: &str) -> Option<&Task> {
        let index = self.tasks.iter().position(|task| task.task_id == task_id)?;
        self.set_current_task(index)
    }

    pub fn current_task(&self) -> Option<&Task> {
        self.current_task_index.and_then(|i| self.tasks.get(i))
    }

    pub fn current_annotations(&self) -> &AnnotationList {
        &self.current_annotations
    }

    /// Replace the current task's annotations. No-op without a current task.
    pub fn update_annotations(&mut self, annotations: AnnotationList) {
        let Some(task) = self.current_task_index.and_then(|i| self.tasks.get_mut(i)) else {
            return;
        };
        task.annotations = annotations.clone();
        self.current_annotations = annotations;
    }

    /// Record a successful save.
    pub fn mark_completed(&mut self, task_id: &str) {
        if let Some(task) = self.tasks.iter_mut().find(|task| task.task_id == task_id) {
            task.status = TaskStatus::Completed;
        }
        self.incomplete_task_ids.retain(|id| id != task_id);
    }

    /// Share of loaded tasks that are completed, in `0.0..=1.0`.
    /// `None` when no tasks are assigned.
    pub fn progress(&self) -> Option<f32> {
        if self.tasks.is_empty() {
            return None;
        }
        let completed = self
            .tasks
            .iter()
            .filter(|task| task.status == TaskStatus::Completed)
            .count();
        Some(completed as f32 / self.tasks.len() as f32)
    }
}
