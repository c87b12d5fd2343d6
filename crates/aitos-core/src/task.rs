//! Task board
//!
//! Tasks live in one persisted list, newest first. Status moves are
//! unrestricted: any column can move to any other column.

use crate::ids::next_id;
use crate::roster::{RosterStore, TeamMember};
use crate::storage::{self, KeyValueStore, TASKS_KEY};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Review,
    Completed,
    Blocked,
}

impl TaskStatus {
    /// Board columns, left to right
    pub const ALL: [TaskStatus; 5] = [
        TaskStatus::Todo,
        TaskStatus::InProgress,
        TaskStatus::Review,
        TaskStatus::Completed,
        TaskStatus::Blocked,
    ];

    pub fn column_title(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "To Do",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Review => "Review",
            TaskStatus::Completed => "Completed",
            TaskStatus::Blocked => "Blocked",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            TaskStatus::Todo => 0,
            TaskStatus::InProgress => 1,
            TaskStatus::Review => 2,
            TaskStatus::Completed => 3,
            TaskStatus::Blocked => 4,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Review => "review",
            TaskStatus::Completed => "completed",
            TaskStatus::Blocked => "blocked",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Priority {
    pub const ALL: [Priority; 4] = [
        Priority::Low,
        Priority::Medium,
        Priority::High,
        Priority::Critical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Critical => "critical",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            Priority::Low => Priority::Medium,
            Priority::Medium => Priority::High,
            Priority::High => Priority::Critical,
            Priority::Critical => Priority::Low,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub user_id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    pub created_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_hours: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_hours: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blockers: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The fields a user fills in on the new-task form
#[derive(Debug, Clone, Default)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub assigned_to: String,
    pub due_date: Option<DateTime<Utc>>,
    pub estimated_hours: Option<f64>,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>, priority: Priority) -> Self {
        Self {
            title: title.into(),
            priority,
            ..Self::default()
        }
    }
}

/// Task counts per column, in board order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BoardSummary {
    pub counts: [usize; 5],
}

impl BoardSummary {
    pub fn count(&self, status: TaskStatus) -> usize {
        self.counts[status.index()]
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }
}

impl fmt::Display for BoardSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} completed, {} in progress, {} blocked",
            self.count(TaskStatus::Completed),
            self.total(),
            self.count(TaskStatus::InProgress),
            self.count(TaskStatus::Blocked)
        )
    }
}

pub struct TaskStore {
    store: Arc<dyn KeyValueStore>,
    tasks: Vec<Task>,
}

impl TaskStore {
    /// Load the persisted task list. When nothing has been stored yet and
    /// `seed_demo` is set, the demo tasks are written and used.
    pub fn load(store: Arc<dyn KeyValueStore>, seed_demo: bool) -> Self {
        let tasks = match storage::read_list(store.as_ref(), TASKS_KEY) {
            Ok(Some(tasks)) => tasks,
            Ok(None) if seed_demo => {
                let tasks = demo_tasks(Utc::now());
                if let Err(e) = storage::write_list(store.as_ref(), TASKS_KEY, &tasks) {
                    tracing::error!(error = %e, "failed to persist demo tasks");
                }
                tasks
            }
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "task list unreadable, starting from defaults");
                if seed_demo {
                    demo_tasks(Utc::now())
                } else {
                    Vec::new()
                }
            }
        };
        Self { store, tasks }
    }

    /// Create a task from a draft. Returns `None` without touching the board
    /// when the title is blank.
    pub fn create_task(&mut self, created_by: &str, draft: TaskDraft) -> Option<Task> {
        if draft.title.trim().is_empty() {
            return None;
        }

        let now = Utc::now();
        let task = Task {
            id: format!("task-{}", next_id()),
            user_id: created_by.to_string(),
            title: draft.title,
            description: non_empty(draft.description),
            status: TaskStatus::Todo,
            priority: draft.priority,
            assigned_to: non_empty(draft.assigned_to),
            created_by: created_by.to_string(),
            due_date: draft.due_date,
            estimated_hours: draft.estimated_hours,
            actual_hours: None,
            tags: Vec::new(),
            blockers: None,
            created_at: now,
            updated_at: now,
        };

        tracing::info!(id = %task.id, title = %task.title, priority = task.priority.as_str(), "task created");
        self.tasks.insert(0, task.clone());
        self.persist();
        Some(task)
    }

    /// Move a task to another column. Returns false if the id is unknown.
    pub fn update_status(&mut self, task_id: &str, status: TaskStatus) -> bool {
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == task_id) else {
            return false;
        };

        let from = task.status;
        task.status = status;
        task.updated_at = task.updated_at.max(Utc::now());
        tracing::info!(id = %task_id, %from, to = %status, "task moved");

        self.persist();
        true
    }

    /// Tasks in one column, in list order
    pub fn list_by_status(&self, status: TaskStatus) -> Vec<&Task> {
        self.tasks.iter().filter(|t| t.status == status).collect()
    }

    /// The roster member a task is assigned to, if any
    pub fn resolve_assignee<'a>(&self, task: &Task, roster: &'a RosterStore) -> Option<&'a TeamMember> {
        task.assigned_to
            .as_deref()
            .and_then(|user_id| roster.find_by_user_id(user_id))
    }

    /// Board columns with their titles, left to right
    pub fn columns() -> [(TaskStatus, &'static str); 5] {
        TaskStatus::ALL.map(|status| (status, status.column_title()))
    }

    pub fn get(&self, task_id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == task_id)
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn summary(&self) -> BoardSummary {
        let mut summary = BoardSummary::default();
        for task in &self.tasks {
            summary.counts[task.status.index()] += 1;
        }
        summary
    }

    fn persist(&self) {
        if let Err(e) = storage::write_list(self.store.as_ref(), TASKS_KEY, &self.tasks) {
            tracing::error!(error = %e, "failed to persist tasks");
        }
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

/// One demo task per column, assigned across the default roster
pub fn demo_tasks(now: DateTime<Utc>) -> Vec<Task> {
    let specs = [
        ("task-1", "mock-user-1", "Implement WhatsApp API integration",
         "Set up WhatsApp Business API for OSS BOT communication",
         TaskStatus::InProgress, Priority::High, 7, 8.0),
        ("task-2", "mock-user-2", "Complete AI module documentation",
         "Document the AI module for team reference",
         TaskStatus::Review, Priority::Medium, 3, 4.0),
        ("task-3", "mock-user-3", "Tech sprint summary for Daniel",
         "Prepare comprehensive tech sprint report",
         TaskStatus::Todo, Priority::Medium, 5, 2.0),
        ("task-4", "mock-user-1", "Set up Slack integration",
         "Configure Slack bot for team notifications",
         TaskStatus::Completed, Priority::High, -2, 6.0),
        ("task-5", "mock-user-2", "Database optimization",
         "Optimize database queries for better performance",
         TaskStatus::Blocked, Priority::Low, 10, 12.0),
    ];

    specs
        .into_iter()
        .map(|(id, owner, title, description, status, priority, due_in_days, hours)| Task {
            id: id.to_string(),
            user_id: owner.to_string(),
            title: title.to_string(),
            description: Some(description.to_string()),
            status,
            priority,
            assigned_to: Some(owner.to_string()),
            created_by: owner.to_string(),
            due_date: Some(now + Duration::days(due_in_days)),
            estimated_hours: Some(hours),
            actual_hours: None,
            tags: Vec::new(),
            blockers: None,
            created_at: now,
            updated_at: now,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::CurrentUser;
    use crate::storage::MemoryStore;

    fn empty_board() -> (Arc<dyn KeyValueStore>, TaskStore) {
        let kv: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let store = TaskStore::load(kv.clone(), false);
        (kv, store)
    }

    #[test]
    fn test_create_task_lands_first_in_todo() {
        let (_, mut board) = empty_board();
        board.create_task("me", TaskDraft::new("First", Priority::Low)).unwrap();
        let task = board.create_task("me", TaskDraft::new("Second", Priority::High)).unwrap();

        assert_eq!(task.status, TaskStatus::Todo);
        assert_eq!(task.created_at, task.updated_at);
        let todo = board.list_by_status(TaskStatus::Todo);
        assert_eq!(todo[0].id, task.id);
        assert_eq!(todo.len(), 2);
    }

    #[test]
    fn test_blank_title_is_rejected() {
        let (kv, mut board) = empty_board();
        for title in ["", "   ", "\t\n"] {
            assert!(board.create_task("me", TaskDraft::new(title, Priority::Medium)).is_none());
        }
        assert!(board.is_empty());
        assert!(kv.get(TASKS_KEY).unwrap().is_none());
    }

    #[test]
    fn test_blank_optional_fields_become_none() {
        let (_, mut board) = empty_board();
        let draft = TaskDraft {
            title: "Write report".to_string(),
            description: "  ".to_string(),
            assigned_to: String::new(),
            ..TaskDraft::default()
        };
        let task = board.create_task("me", draft).unwrap();
        assert!(task.description.is_none());
        assert!(task.assigned_to.is_none());
        assert_eq!(task.priority, Priority::Medium);
    }

    #[test]
    fn test_ids_unique_within_session() {
        let (_, mut board) = empty_board();
        for i in 0..20 {
            board.create_task("me", TaskDraft::new(format!("t{i}"), Priority::Low));
        }
        let mut ids: Vec<_> = board.tasks().iter().map(|t| t.id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 20);
    }

    #[test]
    fn test_update_status_any_to_any() {
        let (kv, mut board) = empty_board();
        let id = board.create_task("me", TaskDraft::new("Deploy", Priority::Critical)).unwrap().id;

        let sequence = [
            TaskStatus::Completed,
            TaskStatus::Todo,
            TaskStatus::Blocked,
            TaskStatus::Review,
            TaskStatus::InProgress,
        ];
        let mut last_updated = board.get(&id).unwrap().updated_at;
        for status in sequence {
            assert!(board.update_status(&id, status));
            let task = board.get(&id).unwrap();
            assert_eq!(task.status, status);
            assert!(task.updated_at >= last_updated);
            last_updated = task.updated_at;
        }

        let reloaded = TaskStore::load(kv, false);
        assert_eq!(reloaded.get(&id).unwrap().status, TaskStatus::InProgress);
    }

    #[test]
    fn test_update_status_unknown_id_is_noop() {
        let (kv, mut board) = empty_board();
        assert!(!board.update_status("task-missing", TaskStatus::Blocked));
        assert!(kv.get(TASKS_KEY).unwrap().is_none());
    }

    #[test]
    fn test_resolve_assignee() {
        let kv: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let mut roster = RosterStore::load(kv.clone());
        roster.ensure_current_user(&CurrentUser::new("me", None));
        let mut board = TaskStore::load(kv, false);

        let mut draft = TaskDraft::new("Assigned", Priority::Low);
        draft.assigned_to = "mock-user-2".to_string();
        let assigned = board.create_task("me", draft).unwrap();
        assert_eq!(board.resolve_assignee(&assigned, &roster).unwrap().display_name, "Nitish");

        let mut draft = TaskDraft::new("Dangling", Priority::Low);
        draft.assigned_to = "someone-gone".to_string();
        let dangling = board.create_task("me", draft).unwrap();
        assert!(board.resolve_assignee(&dangling, &roster).is_none());
    }

    #[test]
    fn test_demo_seed_written_once() {
        let kv: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let board = TaskStore::load(kv.clone(), true);
        assert_eq!(board.len(), 5);
        for status in TaskStatus::ALL {
            assert_eq!(board.list_by_status(status).len(), 1);
        }
        assert!(kv.get(TASKS_KEY).unwrap().is_some());
    }

    #[test]
    fn test_summary() {
        let kv: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let board = TaskStore::load(kv, true);
        let summary = board.summary();
        assert_eq!(summary.total(), 5);
        assert_eq!(summary.to_string(), "1/5 completed, 1 in progress, 1 blocked");
    }

    #[test]
    fn test_columns_in_board_order() {
        let titles: Vec<_> = TaskStore::columns().iter().map(|(_, t)| *t).collect();
        assert_eq!(titles, vec!["To Do", "In Progress", "Review", "Completed", "Blocked"]);
        assert_eq!(TaskStatus::from_index(4), Some(TaskStatus::Blocked));
        assert_eq!(TaskStatus::from_index(5), None);
    }

    #[test]
    fn test_reads_stored_json_shape() {
        let json = r#"[{
            "id": "task-1700000000000",
            "user_id": "u1",
            "title": "Imported",
            "status": "in_progress",
            "priority": "critical",
            "created_by": "u1",
            "tags": ["ops"],
            "created_at": "2024-01-02T03:04:05.000Z",
            "updated_at": "2024-01-02T03:04:05.000Z"
        }]"#;
        let kv: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        kv.set(TASKS_KEY, json).unwrap();

        let board = TaskStore::load(kv, true);
        assert_eq!(board.len(), 1);
        let task = &board.tasks()[0];
        assert_eq!(task.status, TaskStatus::InProgress);
        assert_eq!(task.priority, Priority::Critical);
        assert_eq!(task.tags, vec!["ops"]);
    }
}
