use std::fs::{self, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use crate::error::Result;
use crate::models::Task;

/// Returns the path to the tasks database file (`tasks.json`).
///
/// The path is determined in the following order:
/// 1. `TASKS_DB` environment variable.
/// 2. `~/.local/share/taskplan/tasks.json` (on Linux).
/// 3. `./tasks.json` (fallback).
pub fn db_path() -> PathBuf {
    std::env::var("TASKS_DB").map(PathBuf::from).unwrap_or_else(|_| {
        let mut p = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
        p.push("taskplan");
        if !p.exists() {
            if let Err(e) = fs::create_dir_all(&p) {
                log::warn!("Unable to create data directory {}: {}", p.display(), e);
            }
        }
        p.push("tasks.json");
        p
    })
}

/// Returns the path to the configuration file (`config.json`).
///
/// `TASKPLAN_CONFIG` wins; otherwise the file sits next to the tasks database.
pub fn config_path() -> PathBuf {
    if let Ok(p) = std::env::var("TASKPLAN_CONFIG") {
        return PathBuf::from(p);
    }
    let mut p = db_path();
    p.pop();
    p.push("config.json");
    p
}

/// Reads a whole file, `None` when it is missing or unreadable.
pub(crate) fn read_file(path: &Path) -> Option<String> {
    if !path.exists() {
        return None;
    }
    let mut f = match OpenOptions::new().read(true).open(path) {
        Ok(f) => f,
        Err(e) => {
            log::warn!("Unable to open {}: {}", path.display(), e);
            return None;
        }
    };
    let mut s = String::new();
    if let Err(e) = f.read_to_string(&mut s) {
        log::warn!("Unable to read {}: {}", path.display(), e);
        return None;
    }
    Some(s)
}

/// Replaces the content of a file.
pub(crate) fn write_file(path: &Path, content: &str) -> Result<()> {
    let mut f = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)?;
    f.write_all(content.as_bytes())?;
    Ok(())
}

/// Loads a single task by its ID.
///
/// Returns `None` if the task is not found.
pub fn load_task(id: u64) -> Option<Task> {
    load_tasks().into_iter().find(|t| t.id == id)
}

/// Loads all tasks, failing when the file exists but cannot be read or parsed.
///
/// Every read-modify-write path goes through this so a damaged file is
/// never overwritten with a partial list.
pub fn try_load_tasks() -> Result<Vec<Task>> {
    let path = db_path();
    if !path.exists() {
        return Ok(Vec::new());
    }
    let s = fs::read_to_string(&path)?;
    if s.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(&s)?)
}

/// Loads all tasks from the storage file.
///
/// Returns an empty vector if the file does not exist or cannot be read.
pub fn load_tasks() -> Vec<Task> {
    try_load_tasks().unwrap_or_else(|e| {
        log::warn!("Ignoring unreadable task file {}: {}", db_path().display(), e);
        Vec::new()
    })
}

/// Saves or updates a single task in the storage file.
///
/// If the task with the same ID exists, it is updated; otherwise, it is added.
pub fn save_task(task: &Task) -> Result<()> {
    let mut tasks = try_load_tasks()?;
    if let Some(t) = tasks.iter_mut().find(|t| t.id == task.id) {
        *t = task.clone();
    }
    else {
        tasks.push(task.clone());
    }
    save_tasks(&tasks)
}

/// Saves the given list of tasks to the storage file.
///
/// Overwrites the existing file.
pub fn save_tasks(tasks: &[Task]) -> Result<()> {
    let s = serde_json::to_string_pretty(tasks)?;
    write_file(&db_path(), &s)
}

/// Appends new tasks, giving each one the next free id.
///
/// Returns the assigned ids in order.
pub fn insert_tasks(new_tasks: Vec<Task>) -> Result<Vec<u64>> {
    let mut tasks = try_load_tasks()?;
    let mut next_id = tasks.iter().map(|t| t.id).max().unwrap_or(0) + 1;
    let mut ids = Vec::with_capacity(new_tasks.len());
    for mut t in new_tasks {
        t.id = next_id;
        ids.push(next_id);
        next_id += 1;
        tasks.push(t);
    }
    save_tasks(&tasks)?;
    log::debug!("Stored {} new task(s)", ids.len());
    Ok(ids)
}

/// Deletes one task. Returns whether it existed.
pub fn delete_task(id: u64) -> Result<bool> {
    let mut tasks = try_load_tasks()?;
    let len_before = tasks.len();
    tasks.retain(|t| t.id != id);
    if tasks.len() == len_before {
        return Ok(false);
    }
    save_tasks(&tasks)?;
    Ok(true)
}

/// Deletes every task of a recurring series. Returns how many were removed.
pub fn delete_group(group_id: &str) -> Result<usize> {
    let mut tasks = try_load_tasks()?;
    let len_before = tasks.len();
    tasks.retain(|t| t.group_id.as_deref() != Some(group_id));
    let removed = len_before - tasks.len();
    if removed > 0 {
        save_tasks(&tasks)?;
    }
    Ok(removed)
}

/// Deletes the tasks database file.
pub fn delete_database() -> Result<()> {
    let t_path = db_path();
    if t_path.exists() {
        fs::remove_file(t_path)?;
    }
    Ok(())
}
