//! Notification text rendering.

use minijinja::Environment;
use serde_json::{Map, Value};

use crate::notification::domain::NotificationKind;
use crate::workflow::domain::{Task, TaskTypeLabel};

use super::NotificationError;

/// Default template for new-task alerts.
pub const DEFAULT_NEW_TASK_TEMPLATE: &str =
    "New {{ task_type }} task: {{ title }} (order {{ order_number }}), due {{ due_date }}";

/// Default template for overdue alerts.
pub const DEFAULT_OVERDUE_TEMPLATE: &str = "Overdue: {{ title }} (order {{ order_number }}) was due \
     {{ due_date }}{% if due_time %} {{ due_time }}{% endif %}";

/// `minijinja` sources for each notification kind.
///
/// Templates see `title`, `order_number`, `task_type`, `status`,
/// `priority`, `assignee`, `due_date`, and `due_time`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationTemplates {
    new_task: String,
    overdue: String,
}

impl Default for NotificationTemplates {
    fn default() -> Self {
        Self {
            new_task: DEFAULT_NEW_TASK_TEMPLATE.to_owned(),
            overdue: DEFAULT_OVERDUE_TEMPLATE.to_owned(),
        }
    }
}

impl NotificationTemplates {
    /// Creates a template set, rejecting sources that do not parse.
    ///
    /// # Errors
    ///
    /// Returns [`NotificationError::Template`] naming the first template
    /// with a syntax error.
    pub fn new(
        new_task: impl Into<String>,
        overdue: impl Into<String>,
    ) -> Result<Self, NotificationError> {
        let templates = Self {
            new_task: new_task.into(),
            overdue: overdue.into(),
        };
        let environment = Environment::new();
        for kind in [NotificationKind::NewTask, NotificationKind::Overdue] {
            environment
                .template_from_str(templates.source(kind))
                .map_err(|error| NotificationError::Template {
                    kind,
                    reason: error.to_string(),
                })?;
        }
        Ok(templates)
    }

    /// Returns the source for `kind`.
    #[must_use]
    pub fn source(&self, kind: NotificationKind) -> &str {
        match kind {
            NotificationKind::NewTask => &self.new_task,
            NotificationKind::Overdue => &self.overdue,
        }
    }

    /// Renders the alert text for `task`.
    ///
    /// # Errors
    ///
    /// Returns [`NotificationError::Template`] when rendering fails.
    pub fn render(&self, kind: NotificationKind, task: &Task) -> Result<String, NotificationError> {
        Environment::new()
            .render_str(self.source(kind), template_context(task))
            .map_err(|error| NotificationError::Template {
                kind,
                reason: error.to_string(),
            })
    }
}

fn template_context(task: &Task) -> Map<String, Value> {
    let mut context = Map::new();
    context.insert("title".to_owned(), Value::from(task.title()));
    context.insert(
        "order_number".to_owned(),
        Value::from(task.display_order_number()),
    );
    context.insert(
        "task_type".to_owned(),
        Value::from(TaskTypeLabel(task.task_type()).to_string()),
    );
    context.insert("status".to_owned(), Value::from(task.status().as_str()));
    context.insert("priority".to_owned(), Value::from(task.priority().as_str()));
    context.insert("assignee".to_owned(), Value::from(task.assignee_name()));
    context.insert(
        "due_date".to_owned(),
        Value::from(task.due_date().format("%Y-%m-%d").to_string()),
    );
    context.insert(
        "due_time".to_owned(),
        task.due_time()
            .map_or(Value::Null, |time| Value::from(time.format("%H:%M").to_string())),
    );
    context
}
