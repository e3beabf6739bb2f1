//! Settings from `settings.toml`, overridden by command line flags.

use crate::editor::{EditorOptions, SurfaceSizing};
use crate::error::Result;
use crate::history::DEFAULT_HISTORY_LIMIT;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "settings.toml";
const APP_NAME: &str = "annotate-task";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// JSON file holding the task records.
    pub tasks_file: PathBuf,
    /// Sign in as this user at startup.
    pub user: Option<String>,
    /// Open this task instead of the first incomplete one.
    pub task: Option<String>,
    pub history_limit: usize,
    /// Fixed `[width, height]` for the drawing surface. Unset means the
    /// image's natural size.
    pub canvas_size: Option<[u32; 2]>,
    pub log_level: LogLevel,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tasks_file: PathBuf::from("tasks.json"),
            user: None,
            task: None,
            history_limit: DEFAULT_HISTORY_LIMIT,
            canvas_size: None,
            log_level: LogLevel::Info,
        }
    }
}

impl Config {
    pub fn apply_cli(&mut self, cli: CliArgs) {
        if let Some(tasks_file) = cli.tasks_file {
            self.tasks_file = tasks_file;
        }
        if cli.user.is_some() {
            self.user = cli.user;
        }
        if cli.task.is_some() {
            self.task = cli.task;
        }
    }

    pub fn editor_options(&self) -> EditorOptions {
        let sizing = match self.canvas_size {
            Some([width, height]) => SurfaceSizing::Fixed { width, height },
            None => SurfaceSizing::Natural,
        };
        EditorOptions {
            history_limit: self.history_limit,
            sizing,
            ..EditorOptions::default()
        }
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|mut path| {
        path.push(APP_NAME);
        path.push(CONFIG_FILE);
        path
    })
}

/// Settings from `path`, or defaults when the file does not exist.
pub fn load_from_path(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

pub fn save_to_path(config: &Config, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, toml::to_string_pretty(config)?)?;
    Ok(())
}

// ── Command line ────────────────────────────────────────────────────────────

#[derive(Debug, Default, PartialEq)]
pub struct CliArgs {
    pub config: Option<PathBuf>,
    pub tasks_file: Option<PathBuf>,
    pub user: Option<String>,
    pub task: Option<String>,
    /// Write the merged settings back to the config file.
    pub save_config: bool,
    /// Leftover arguments nothing consumed.
    pub unexpected: Vec<OsString>,
}

impl CliArgs {
    pub fn parse(mut args: pico_args::Arguments) -> Result<Self> {
        let cli = Self {
            config: args.opt_value_from_str("--config")?,
            tasks_file: args.opt_value_from_str("--tasks")?,
            user: args.opt_value_from_str("--user")?,
            task: args.opt_value_from_str("--task")?,
            save_config: args.contains("--save-config"),
            unexpected: Vec::new(),
        };
        Ok(Self {
            unexpected: args.finish(),
            ..cli
        })
    }
}
