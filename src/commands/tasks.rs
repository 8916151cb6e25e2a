//! Task-list collaborator for the chat surface
//!
//! Receives `(action, payload)` notifications from the dispatcher and
//! keeps the terminal task view in sync. Payload-driven updates are
//! preferred: when the reply carries the mutated entity or a task list,
//! the view renders it directly. Only a payload-less action falls back to
//! a delayed refetch of `GET {api_base}/todos`, tolerating the backend's
//! write-then-read latency on AI-triggered mutations.

use crate::chat::dispatcher::join_url;
use crate::chat::ActionKind;
use crate::error::{Result, TaskchatError};

use colored::Colorize;
use prettytable::{row, Table};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

/// One task record as the backend serializes it
///
/// Field types are deliberately loose (`id` may be a string or a number
/// depending on backend revision); missing fields default rather than
/// failing the render.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskRecord {
    /// Task identifier; string or number on the wire
    #[serde(default)]
    pub id: serde_json::Value,
    /// Task title
    #[serde(default)]
    pub title: String,
    /// Optional longer description
    #[serde(default)]
    pub description: Option<String>,
    /// Completion flag
    #[serde(default)]
    pub completed: bool,
    /// Optional priority label
    #[serde(default)]
    pub priority: Option<String>,
}

impl TaskRecord {
    /// Identifier rendered without JSON quoting
    pub fn id_display(&self) -> String {
        match &self.id {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}

/// Pull task records out of an action payload
///
/// Accepts the three shapes the backend produces: a bare array, an object
/// wrapping a `tasks` array, or a single task object. Anything else
/// yields `None` and the caller falls back to refetching.
pub fn extract_tasks(payload: &serde_json::Value) -> Option<Vec<TaskRecord>> {
    if let Some(array) = payload.as_array() {
        let tasks: Vec<TaskRecord> = array
            .iter()
            .filter_map(|v| serde_json::from_value(v.clone()).ok())
            .collect();
        return Some(tasks);
    }
    if let Some(array) = payload.get("tasks").and_then(|t| t.as_array()) {
        let tasks: Vec<TaskRecord> = array
            .iter()
            .filter_map(|v| serde_json::from_value(v.clone()).ok())
            .collect();
        return Some(tasks);
    }
    if payload.get("title").is_some() {
        return serde_json::from_value(payload.clone()).ok().map(|t| vec![t]);
    }
    None
}

/// Build the terminal table for a list of tasks
pub fn table_for(tasks: &[TaskRecord]) -> Table {
    let mut table = Table::new();
    table.add_row(row!["ID", "Title", "Done", "Priority"]);
    for task in tasks {
        table.add_row(row![
            task.id_display(),
            task.title,
            if task.completed { "yes" } else { "no" },
            task.priority.as_deref().unwrap_or("-"),
        ]);
    }
    table
}

/// One-line summary for a single-task mutation
pub fn summary_line(action: ActionKind, task: &TaskRecord) -> String {
    let verb = match action {
        ActionKind::CreateTask => "created",
        ActionKind::UpdateTask => "updated",
        ActionKind::DeleteTask => "deleted",
        ActionKind::CompleteTask => "completed",
        ActionKind::ListTasks | ActionKind::Clarify => "touched",
    };
    format!("Task {} [{}]: {}", verb, task.id_display(), task.title)
}

/// Terminal task view fed by the action notifier
pub struct TaskListView {
    client: reqwest::Client,
    list_url: String,
    refresh_delay: Duration,
}

impl TaskListView {
    /// Create a view refetching from `{api_base}/todos`
    pub fn new(api_base: &str, timeout: Duration, refresh_delay: Duration) -> Result<Arc<Self>> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("taskchat/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TaskchatError::Dispatch(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Arc::new(Self {
            client,
            list_url: join_url(api_base, "todos"),
            refresh_delay,
        }))
    }

    /// Handle one action notification
    ///
    /// Renders directly from the payload when one is present; otherwise
    /// spawns the delayed refetch. Fire-and-forget either way: failures
    /// are logged, never surfaced to the dispatcher.
    pub fn handle_action(self: &Arc<Self>, action: ActionKind, payload: Option<&serde_json::Value>) {
        if let Some(payload) = payload {
            if let Some(tasks) = extract_tasks(payload) {
                render(action, &tasks);
                return;
            }
            tracing::debug!("Unrecognized action payload shape, falling back to refetch");
        }

        let view = Arc::clone(self);
        tokio::spawn(async move {
            // The backend does not guarantee read-after-write for
            // AI-triggered mutations; give it a moment before refetching.
            tokio::time::sleep(view.refresh_delay).await;
            if let Err(e) = view.refetch_and_render(action).await {
                tracing::warn!("Task refetch failed: {}", e);
            }
        });
    }

    /// Fetch the task list from the backend and render it
    async fn refetch_and_render(&self, action: ActionKind) -> Result<()> {
        tracing::debug!("Refetching task list from {}", self.list_url);
        let response = self.client.get(&self.list_url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TaskchatError::Backend {
                status: status.as_u16(),
                detail: format!("Task list fetch failed with status {}", status),
            }
            .into());
        }
        let tasks: Vec<TaskRecord> = response
            .json()
            .await
            .map_err(|e| TaskchatError::Dispatch(format!("Malformed task list: {}", e)))?;
        render(action, &tasks);
        Ok(())
    }
}

/// Print the view update for an action
fn render(action: ActionKind, tasks: &[TaskRecord]) {
    match (action, tasks) {
        (_, []) => println!("{}", "No tasks.".dimmed()),
        (ActionKind::ListTasks, tasks) => {
            table_for(tasks).printstd();
        }
        (action, [task]) => println!("{}", summary_line(action, task).dimmed()),
        (_, tasks) => {
            table_for(tasks).printstd();
        }
    }
}
