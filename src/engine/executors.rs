// Paw Voice Engine — Reminder & Task Action Executor
// Executes parsed generative actions against the repository traits.
// In-memory stores back the CLI and the tests; persistent stores plug in
// through the same traits.

use crate::atoms::error::{EngineError, EngineResult};
use crate::atoms::traits::{
    GenerativeActionExecutor, Reminder, ReminderRepository, Task, TaskRepository,
};
use crate::atoms::types::{ActionSuccess, GenerativeAction, GenerativeActionKind};
use async_trait::async_trait;
use chrono::Utc;
use log::info;
use parking_lot::Mutex;
use std::sync::Arc;

// ── In-memory repositories ─────────────────────────────────────────────────

/// Insertion-ordered reminder store.
#[derive(Default)]
pub struct MemoryReminderStore {
    items: Mutex<Vec<Reminder>>,
}

impl MemoryReminderStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReminderRepository for MemoryReminderStore {
    async fn insert(&self, reminder: Reminder) -> EngineResult<()> {
        let mut items = self.items.lock();
        if items.iter().any(|r| r.id == reminder.id) {
            return Err(EngineError::Repository(format!("duplicate reminder id {}", reminder.id)));
        }
        items.push(reminder);
        Ok(())
    }

    async fn update(&self, reminder: Reminder) -> EngineResult<bool> {
        let mut items = self.items.lock();
        match items.iter_mut().find(|r| r.id == reminder.id) {
            Some(slot) => {
                *slot = reminder;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn get(&self, id: &str) -> EngineResult<Option<Reminder>> {
        Ok(self.items.lock().iter().find(|r| r.id == id).cloned())
    }

    async fn delete(&self, id: &str) -> EngineResult<bool> {
        let mut items = self.items.lock();
        let before = items.len();
        items.retain(|r| r.id != id);
        Ok(items.len() != before)
    }

    async fn list(&self) -> EngineResult<Vec<Reminder>> {
        Ok(self.items.lock().clone())
    }
}

/// Insertion-ordered task store.
#[derive(Default)]
pub struct MemoryTaskStore {
    items: Mutex<Vec<Task>>,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskRepository for MemoryTaskStore {
    async fn insert(&self, task: Task) -> EngineResult<()> {
        let mut items = self.items.lock();
        if items.iter().any(|t| t.id == task.id) {
            return Err(EngineError::Repository(format!("duplicate task id {}", task.id)));
        }
        items.push(task);
        Ok(())
    }

    async fn update(&self, task: Task) -> EngineResult<bool> {
        let mut items = self.items.lock();
        match items.iter_mut().find(|t| t.id == task.id) {
            Some(slot) => {
                *slot = task;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn get(&self, id: &str) -> EngineResult<Option<Task>> {
        Ok(self.items.lock().iter().find(|t| t.id == id).cloned())
    }

    async fn delete(&self, id: &str) -> EngineResult<bool> {
        let mut items = self.items.lock();
        let before = items.len();
        items.retain(|t| t.id != id);
        Ok(items.len() != before)
    }

    async fn list(&self) -> EngineResult<Vec<Task>> {
        Ok(self.items.lock().clone())
    }
}

// ── Executor ───────────────────────────────────────────────────────────────

pub struct RepositoryActionExecutor {
    reminders: Arc<dyn ReminderRepository>,
    tasks: Arc<dyn TaskRepository>,
}

fn required<'a>(action: &'a GenerativeAction, key: &str) -> EngineResult<&'a str> {
    action.param(key).ok_or_else(|| {
        EngineError::action(action.kind.wire_name(), format!("missing required parameter '{key}'"))
    })
}

fn not_found(action: &GenerativeAction, what: &str, id: &str) -> EngineError {
    EngineError::action(action.kind.wire_name(), format!("no {what} with id '{id}'"))
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 { format!("1 {word}") } else { format!("{n} {word}s") }
}

fn json_data<T: serde::Serialize>(value: &T) -> EngineResult<serde_json::Value> {
    Ok(serde_json::to_value(value)?)
}

impl RepositoryActionExecutor {
    pub fn new(reminders: Arc<dyn ReminderRepository>, tasks: Arc<dyn TaskRepository>) -> Self {
        RepositoryActionExecutor { reminders, tasks }
    }

    /// Executor over fresh in-memory stores.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryReminderStore::new()), Arc::new(MemoryTaskStore::new()))
    }

    // ── Reminders ──────────────────────────────────────────────────────────

    async fn create_reminder(&self, action: &GenerativeAction) -> EngineResult<ActionSuccess> {
        let title = required(action, "title")?;
        let reminder = Reminder {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.to_string(),
            time: action.param("time").map(str::to_string),
            created_at: Utc::now(),
        };
        let message = match &reminder.time {
            Some(time) => format!("Reminder set: {} ({})", reminder.title, time),
            None => format!("Reminder set: {}", reminder.title),
        };
        let data = json_data(&reminder)?;
        self.reminders.insert(reminder).await?;
        Ok(ActionSuccess::with_data(message, data))
    }

    async fn update_reminder(&self, action: &GenerativeAction) -> EngineResult<ActionSuccess> {
        let id = required(action, "id")?;
        let mut reminder = self
            .reminders
            .get(id)
            .await?
            .ok_or_else(|| not_found(action, "reminder", id))?;
        if let Some(title) = action.param("title") {
            reminder.title = title.to_string();
        }
        if let Some(time) = action.param("time") {
            reminder.time = Some(time.to_string());
        }
        let data = json_data(&reminder)?;
        let message = format!("Reminder updated: {}", reminder.title);
        if !self.reminders.update(reminder).await? {
            return Err(not_found(action, "reminder", id));
        }
        Ok(ActionSuccess::with_data(message, data))
    }

    async fn delete_reminder(&self, action: &GenerativeAction) -> EngineResult<ActionSuccess> {
        let id = required(action, "id")?;
        if !self.reminders.delete(id).await? {
            return Err(not_found(action, "reminder", id));
        }
        Ok(ActionSuccess::new("Reminder deleted"))
    }

    async fn list_reminders(&self) -> EngineResult<ActionSuccess> {
        let reminders = self.reminders.list().await?;
        let message = if reminders.is_empty() {
            "You have no reminders".to_string()
        } else {
            format!("You have {}", plural(reminders.len(), "reminder"))
        };
        Ok(ActionSuccess::with_data(message, json_data(&reminders)?))
    }

    // ── Tasks ──────────────────────────────────────────────────────────────

    async fn create_task(&self, action: &GenerativeAction) -> EngineResult<ActionSuccess> {
        let title = required(action, "title")?;
        let task = Task {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.to_string(),
            due: action.param("due").map(str::to_string),
            completed: false,
            created_at: Utc::now(),
        };
        let message = format!("Task added: {}", task.title);
        let data = json_data(&task)?;
        self.tasks.insert(task).await?;
        Ok(ActionSuccess::with_data(message, data))
    }

    async fn update_task(&self, action: &GenerativeAction) -> EngineResult<ActionSuccess> {
        let id = required(action, "id")?;
        let mut task = self
            .tasks
            .get(id)
            .await?
            .ok_or_else(|| not_found(action, "task", id))?;
        if let Some(title) = action.param("title") {
            task.title = title.to_string();
        }
        if let Some(due) = action.param("due") {
            task.due = Some(due.to_string());
        }
        if let Some(completed) = action.param("completed") {
            task.completed = completed.eq_ignore_ascii_case("true");
        }
        let data = json_data(&task)?;
        let message = format!("Task updated: {}", task.title);
        if !self.tasks.update(task).await? {
            return Err(not_found(action, "task", id));
        }
        Ok(ActionSuccess::with_data(message, data))
    }

    async fn complete_task(&self, action: &GenerativeAction) -> EngineResult<ActionSuccess> {
        let id = required(action, "id")?;
        let mut task = self
            .tasks
            .get(id)
            .await?
            .ok_or_else(|| not_found(action, "task", id))?;
        task.completed = true;
        let message = format!("Task completed: {}", task.title);
        let data = json_data(&task)?;
        if !self.tasks.update(task).await? {
            return Err(not_found(action, "task", id));
        }
        Ok(ActionSuccess::with_data(message, data))
    }

    async fn delete_task(&self, action: &GenerativeAction) -> EngineResult<ActionSuccess> {
        let id = required(action, "id")?;
        if !self.tasks.delete(id).await? {
            return Err(not_found(action, "task", id));
        }
        Ok(ActionSuccess::new("Task deleted"))
    }

    async fn list_tasks(&self) -> EngineResult<ActionSuccess> {
        let tasks = self.tasks.list().await?;
        let open = tasks.iter().filter(|t| !t.completed).count();
        let message = if tasks.is_empty() {
            "You have no tasks".to_string()
        } else {
            format!("You have {} ({} open)", plural(tasks.len(), "task"), open)
        };
        Ok(ActionSuccess::with_data(message, json_data(&tasks)?))
    }
}

#[async_trait]
impl GenerativeActionExecutor for RepositoryActionExecutor {
    async fn execute(&self, action: &GenerativeAction) -> EngineResult<ActionSuccess> {
        info!("[executor] {} {:?}", action.kind.wire_name(), action.parameters);
        match action.kind {
            GenerativeActionKind::CreateReminder => self.create_reminder(action).await,
            GenerativeActionKind::UpdateReminder => self.update_reminder(action).await,
            GenerativeActionKind::DeleteReminder => self.delete_reminder(action).await,
            GenerativeActionKind::ListReminders => self.list_reminders().await,
            GenerativeActionKind::CreateTask => self.create_task(action).await,
            GenerativeActionKind::UpdateTask => self.update_task(action).await,
            GenerativeActionKind::CompleteTask => self.complete_task(action).await,
            GenerativeActionKind::DeleteTask => self.delete_task(action).await,
            GenerativeActionKind::ListTasks => self.list_tasks().await,
            GenerativeActionKind::Unknown => {
                Err(EngineError::action(action.kind.wire_name(), "unsupported action"))
            }
        }
    }
}
