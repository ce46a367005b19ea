//! TOML-backed configuration for the workflow engine and live feed.
//!
//! Every key is optional; anything left out falls back to the compiled
//! default.
//!
//! ```toml
//! log_filter = "orderflow=debug"
//!
//! [workload]
//! max_age_secs = 30
//! tie_break = "worker_id"
//!
//! [provenance]
//! max_depth = 5
//!
//! [feed]
//! queue_capacity = 256
//! dedupe_window_secs = 120
//! reload_interval_secs = 300
//!
//! [templates]
//! new_task = "New task: {{ title }}"
//! overdue = "Overdue: {{ title }}"
//! ```

use chrono::Duration;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::notification::services::{
    DEFAULT_DEDUPE_WINDOW_SECS, DEFAULT_NEW_TASK_TEMPLATE, DEFAULT_OVERDUE_TEMPLATE, FeedSettings,
    NotificationError, NotificationTemplates,
};
use crate::workflow::services::{TieBreak, WorkflowSettings};

/// Log filter used when neither the file nor the environment sets one.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse the TOML configuration.
    #[error("failed to parse config file: {0}")]
    ParseToml(#[from] toml::de::Error),

    /// A value parsed but is out of range.
    #[error("invalid value for {field}: {reason}")]
    InvalidValue {
        /// Dotted key of the offending value.
        field: &'static str,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// A notification template does not parse.
    #[error(transparent)]
    Template(#[from] NotificationError),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    log_filter: Option<String>,
    workload: WorkloadSection,
    provenance: ProvenanceSection,
    feed: FeedSection,
    templates: TemplatesSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct WorkloadSection {
    max_age_secs: Option<u32>,
    tie_break: Option<TieBreak>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ProvenanceSection {
    max_depth: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FeedSection {
    queue_capacity: Option<usize>,
    dedupe_window_secs: Option<u32>,
    reload_interval_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct TemplatesSection {
    new_task: Option<String>,
    overdue: Option<String>,
}

/// Fully resolved configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowConfig {
    /// `tracing` filter directive.
    pub log_filter: String,
    /// Workflow engine tunables.
    pub workflow: WorkflowSettings,
    /// Live feed tunables.
    pub feed: FeedSettings,
    /// Window for change-feed duplicate suppression.
    pub dedupe_window: Duration,
    /// Notification text templates.
    pub templates: NotificationTemplates,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            log_filter: DEFAULT_LOG_FILTER.to_owned(),
            workflow: WorkflowSettings::default(),
            feed: FeedSettings::default(),
            dedupe_window: Duration::seconds(DEFAULT_DEDUPE_WINDOW_SECS),
            templates: NotificationTemplates::default(),
        }
    }
}

impl WorkflowConfig {
    /// Reads and resolves the TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read, does not
    /// parse, or holds an out-of-range value.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&contents)?;
        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Parses and resolves TOML source.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the source does not parse or holds an
    /// out-of-range value.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(source)?;
        Self::resolve(file)
    }

    fn resolve(file: ConfigFile) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let max_depth = file
            .provenance
            .max_depth
            .unwrap_or(defaults.workflow.max_provenance_depth);
        if max_depth == 0 {
            return Err(ConfigError::InvalidValue {
                field: "provenance.max_depth",
                reason: "must be at least 1",
            });
        }
        let queue_capacity = file
            .feed
            .queue_capacity
            .unwrap_or(defaults.feed.queue_capacity);
        if queue_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "feed.queue_capacity",
                reason: "must be at least 1",
            });
        }
        let reload_interval = file
            .feed
            .reload_interval_secs
            .map_or(defaults.feed.reload_interval, std::time::Duration::from_secs);
        if reload_interval.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "feed.reload_interval_secs",
                reason: "must be at least 1",
            });
        }

        let templates = match (file.templates.new_task, file.templates.overdue) {
            (None, None) => defaults.templates,
            (new_task, overdue) => NotificationTemplates::new(
                new_task.unwrap_or_else(|| DEFAULT_NEW_TASK_TEMPLATE.to_owned()),
                overdue.unwrap_or_else(|| DEFAULT_OVERDUE_TEMPLATE.to_owned()),
            )?,
        };

        Ok(Self {
            log_filter: file.log_filter.unwrap_or(defaults.log_filter),
            workflow: WorkflowSettings {
                workload_max_age: file
                    .workload
                    .max_age_secs
                    .map_or(defaults.workflow.workload_max_age, |secs| {
                        Duration::seconds(i64::from(secs))
                    }),
                tie_break: file.workload.tie_break.unwrap_or(defaults.workflow.tie_break),
                max_provenance_depth: max_depth,
            },
            feed: FeedSettings {
                queue_capacity,
                reload_interval,
            },
            dedupe_window: file
                .feed
                .dedupe_window_secs
                .map_or(defaults.dedupe_window, |secs| {
                    Duration::seconds(i64::from(secs))
                }),
            templates,
        })
    }
}
