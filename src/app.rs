use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::widgets::ListState;
use tracing::{debug, info, warn};

use crate::api::Gateway;
use crate::error::GatewayError;
use crate::filter::{self, Selection, SmartCounts, SmartList};
use crate::forms::{FormAction, ListForm, TaskForm};
use crate::models::{ListPatch, Task, TaskList, TaskPatch};
use crate::views::{self, ViewMode};

const NOTICE_TTL: Duration = Duration::from_secs(4);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// Transient message shown in the footer.
#[derive(Debug)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub detail: Option<String>,
    created: Instant,
}

#[derive(Clone, Debug, PartialEq)]
pub enum PendingDelete {
    Task { id: String, title: String },
    List { id: String, name: String },
}

pub enum InputMode {
    Normal,
    Search,
    TaskForm(TaskForm),
    ListForm(ListForm),
    Confirm(PendingDelete),
}

pub struct App {
    pub tasks: Vec<Task>,
    pub lists: Vec<TaskList>,
    pub selection: Selection,
    pub search_query: String,
    pub view_mode: ViewMode,
    pub state: ListState,
    pub input_mode: InputMode,
    pub notice: Option<Notice>,
}

impl App {
    pub fn new() -> App {
        App {
            tasks: Vec::new(),
            lists: Vec::new(),
            selection: Selection::default(),
            search_query: String::new(),
            view_mode: ViewMode::default(),
            state: ListState::default(),
            input_mode: InputMode::Normal,
            notice: None,
        }
    }

    pub fn visible_tasks(&self, now: &DateTime<Local>) -> Vec<&Task> {
        filter::visible_tasks(&self.tasks, &self.selection, &self.search_query, now)
    }

    pub fn counts(&self, now: &DateTime<Local>) -> SmartCounts {
        SmartCounts::compute(&self.tasks, now)
    }

    pub fn title(&self) -> String {
        filter::view_title(&self.selection, &self.lists)
    }

    /// Visible tasks in the order the current view lays them out. The cursor
    /// indexes into this sequence.
    pub fn display_order(&self, now: &DateTime<Local>) -> Vec<&Task> {
        views::display_order(&self.visible_tasks(now), self.view_mode)
    }

    pub fn selected_task(&self, now: &DateTime<Local>) -> Option<&Task> {
        let ordered = self.display_order(now);
        self.state.selected().and_then(|i| ordered.get(i).copied())
    }

    /// Switches between list and kanban, keeping the same task highlighted.
    pub fn toggle_view(&mut self) {
        let now = Local::now();
        let current = self.selected_task(&now).map(|task| task.id.clone());
        self.view_mode = self.view_mode.toggled();
        let position = current.and_then(|id| {
            self.display_order(&now)
                .iter()
                .position(|task| task.id == id)
        });
        if position.is_some() {
            self.state.select(position);
        }
        self.clamp_cursor();
    }

    /// Sidebar entries in display order: smart lists, then user lists.
    pub fn sidebar_entries(&self) -> Vec<Selection> {
        SmartList::ALL
            .iter()
            .map(|smart| Selection::Smart(*smart))
            .chain(self.lists.iter().map(|list| Selection::List(list.id.clone())))
            .collect()
    }

    pub fn visible_notice(&self) -> Option<&Notice> {
        self.notice
            .as_ref()
            .filter(|notice| notice.created.elapsed() < NOTICE_TTL)
    }

    fn notify(&mut self, level: NoticeLevel, title: &str, detail: Option<String>) {
        self.notice = Some(Notice {
            level,
            title: title.to_string(),
            detail,
            created: Instant::now(),
        });
    }

    fn notify_error(&mut self, title: &str, err: &GatewayError) {
        warn!(error = %err, "{}", title);
        self.notify(NoticeLevel::Error, title, Some(err.to_string()));
    }

    /// Keeps the cursor inside the visible sequence.
    pub fn clamp_cursor(&mut self) {
        let len = self.display_order(&Local::now()).len();
        let i = match self.state.selected() {
            _ if len == 0 => None,
            Some(i) if i >= len => Some(len - 1),
            Some(i) => Some(i),
            None => Some(0),
        };
        self.state.select(i);
    }

    pub fn next(&mut self) {
        let len = self.display_order(&Local::now()).len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) => {
                if i >= len - 1 {
                    0
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.display_order(&Local::now()).len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) => {
                if i == 0 {
                    len - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn select(&mut self, selection: Selection) {
        debug!(?selection, "selection changed");
        self.selection = selection;
        self.state.select(None);
        self.clamp_cursor();
    }

    fn cycle_selection(&mut self, forward: bool) {
        let entries = self.sidebar_entries();
        let len = entries.len();
        let i = entries
            .iter()
            .position(|entry| *entry == self.selection)
            .unwrap_or(0);
        let next = if forward { (i + 1) % len } else { (i + len - 1) % len };
        self.select(entries[next].clone());
    }

    pub async fn reload_tasks(&mut self, gateway: &dyn Gateway) {
        match gateway.fetch_tasks().await {
            Ok(tasks) => {
                debug!(count = tasks.len(), "tasks reloaded");
                self.tasks = tasks;
                self.clamp_cursor();
            }
            Err(err) => self.notify_error("Could not load tasks", &err),
        }
    }

    pub async fn reload_lists(&mut self, gateway: &dyn Gateway) {
        match gateway.fetch_lists().await {
            Ok(lists) => {
                debug!(count = lists.len(), "lists reloaded");
                self.lists = lists;
            }
            Err(err) => self.notify_error("Could not load lists", &err),
        }
    }

    pub async fn reload_all(&mut self, gateway: &dyn Gateway) {
        self.reload_lists(gateway).await;
        self.reload_tasks(gateway).await;
    }

    pub async fn save_task(&mut self, gateway: &dyn Gateway, patch: TaskPatch) {
        let (result, done) = match &patch.id {
            Some(id) => (gateway.update_task(id, &patch).await, "Task updated"),
            None => (gateway.create_task(&patch).await, "Task created"),
        };
        match result {
            Ok(()) => {
                info!(task = ?patch.id, "task saved");
                self.notify(NoticeLevel::Info, done, None);
                self.reload_tasks(gateway).await;
            }
            Err(err) => self.notify_error("Could not save task", &err),
        }
    }

    pub async fn toggle_status(&mut self, gateway: &dyn Gateway, task_id: &str) {
        let Some(task) = self.tasks.iter().find(|t| t.id == task_id) else {
            return;
        };
        let status = task.status.toggled();
        match gateway.set_task_status(task_id, status).await {
            Ok(()) => self.reload_tasks(gateway).await,
            Err(err) => self.notify_error("Could not update task", &err),
        }
    }

    pub async fn delete_task(&mut self, gateway: &dyn Gateway, task_id: &str) {
        match gateway.delete_task(task_id).await {
            Ok(()) => {
                info!(task = task_id, "task deleted");
                self.notify(NoticeLevel::Info, "Task deleted", None);
                self.reload_tasks(gateway).await;
            }
            Err(err) => self.notify_error("Could not delete task", &err),
        }
    }

    pub async fn save_list(&mut self, gateway: &dyn Gateway, patch: ListPatch) {
        let (result, done) = match &patch.id {
            Some(id) => (gateway.update_list(id, &patch).await, "List updated"),
            None => (gateway.create_list(&patch).await, "List created"),
        };
        match result {
            Ok(()) => {
                info!(list = ?patch.id, "list saved");
                self.notify(NoticeLevel::Info, done, None);
                self.reload_lists(gateway).await;
            }
            Err(err) => self.notify_error("Could not save list", &err),
        }
    }

    /// Deletes a list. Its tasks stay, unassigned; an active selection of the
    /// list falls back to All.
    pub async fn delete_list(&mut self, gateway: &dyn Gateway, list_id: &str) {
        match gateway.delete_list(list_id).await {
            Ok(()) => {
                info!(list = list_id, "list deleted");
                self.notify(NoticeLevel::Info, "List deleted", None);
                if self.selection.list_id() == Some(list_id) {
                    self.select(Selection::default());
                }
                self.reload_all(gateway).await;
            }
            Err(err) => {
                self.notify_error("Could not delete list", &err);
                // The unassign step may have gone through before the failure
                self.reload_tasks(gateway).await;
            }
        }
    }

    async fn confirm_delete(&mut self, gateway: &dyn Gateway, pending: PendingDelete) {
        match pending {
            PendingDelete::Task { id, .. } => self.delete_task(gateway, &id).await,
            PendingDelete::List { id, .. } => self.delete_list(gateway, &id).await,
        }
    }

    fn pending_task_delete(&self, id: String) -> PendingDelete {
        let title = self
            .tasks
            .iter()
            .find(|t| t.id == id)
            .map(|t| t.title.clone())
            .unwrap_or_default();
        PendingDelete::Task { id, title }
    }

    fn pending_list_delete(&self, id: String) -> PendingDelete {
        let name = self
            .lists
            .iter()
            .find(|l| l.id == id)
            .map(|l| l.name.clone())
            .unwrap_or_default();
        PendingDelete::List { id, name }
    }

    fn selected_list(&self) -> Option<&TaskList> {
        let id = self.selection.list_id()?;
        self.lists.iter().find(|list| list.id == id)
    }

    /// Handles one key press. Returns `true` when the app should quit.
    pub async fn handle_input(&mut self, key: KeyEvent, gateway: &dyn Gateway) -> bool {
        let now = Local::now();
        let mode = std::mem::replace(&mut self.input_mode, InputMode::Normal);
        match mode {
            InputMode::Normal => match key.code {
                KeyCode::Char('q') => return true,
                KeyCode::Char('j') | KeyCode::Down => self.next(),
                KeyCode::Char('k') | KeyCode::Up => self.previous(),
                KeyCode::Char(']') => self.cycle_selection(true),
                KeyCode::Char('[') => self.cycle_selection(false),
                KeyCode::Char('/') => self.input_mode = InputMode::Search,
                KeyCode::Esc => {
                    self.search_query.clear();
                    self.clamp_cursor();
                }
                KeyCode::Char('v') => self.toggle_view(),
                KeyCode::Char('r') => self.reload_all(gateway).await,
                KeyCode::Char('a') => {
                    self.input_mode = InputMode::TaskForm(TaskForm::new(&self.lists));
                }
                KeyCode::Enter => {
                    let form = self
                        .selected_task(&now)
                        .map(|task| TaskForm::edit(task, &self.lists));
                    if let Some(form) = form {
                        self.input_mode = InputMode::TaskForm(form);
                    }
                }
                KeyCode::Char('x') | KeyCode::Char(' ') => {
                    let id = self.selected_task(&now).map(|t| t.id.clone());
                    if let Some(id) = id {
                        self.toggle_status(gateway, &id).await;
                    }
                }
                KeyCode::Char('d') => {
                    let id = self.selected_task(&now).map(|t| t.id.clone());
                    if let Some(id) = id {
                        self.input_mode = InputMode::Confirm(self.pending_task_delete(id));
                    }
                }
                KeyCode::Char('L') => self.input_mode = InputMode::ListForm(ListForm::new()),
                KeyCode::Char('e') => {
                    let form = self.selected_list().map(ListForm::edit);
                    if let Some(form) = form {
                        self.input_mode = InputMode::ListForm(form);
                    }
                }
                KeyCode::Char('D') => {
                    let id = self.selected_list().map(|l| l.id.clone());
                    if let Some(id) = id {
                        self.input_mode = InputMode::Confirm(self.pending_list_delete(id));
                    }
                }
                _ => {}
            },

            InputMode::Search => {
                match key.code {
                    KeyCode::Enter => {}
                    KeyCode::Esc => self.search_query.clear(),
                    KeyCode::Char(c) => {
                        self.search_query.push(c);
                        self.input_mode = InputMode::Search;
                    }
                    KeyCode::Backspace => {
                        self.search_query.pop();
                        self.input_mode = InputMode::Search;
                    }
                    _ => self.input_mode = InputMode::Search,
                }
                self.clamp_cursor();
            }

            InputMode::TaskForm(mut form) => match form.handle_key(key) {
                Some(FormAction::Save(patch)) => self.save_task(gateway, patch).await,
                Some(FormAction::Delete(id)) => {
                    self.input_mode = InputMode::Confirm(self.pending_task_delete(id));
                }
                Some(FormAction::Close) => {}
                None => self.input_mode = InputMode::TaskForm(form),
            },

            InputMode::ListForm(mut form) => match form.handle_key(key) {
                Some(FormAction::Save(patch)) => self.save_list(gateway, patch).await,
                Some(FormAction::Delete(id)) => {
                    self.input_mode = InputMode::Confirm(self.pending_list_delete(id));
                }
                Some(FormAction::Close) => {}
                None => self.input_mode = InputMode::ListForm(form),
            },

            InputMode::Confirm(pending) => match key.code {
                KeyCode::Char('y') | KeyCode::Enter => self.confirm_delete(gateway, pending).await,
                KeyCode::Char('n') | KeyCode::Esc => {}
                _ => self.input_mode = InputMode::Confirm(pending),
            },
        }
        false
    }
}

impl Default for App {
    fn default() -> Self {
        App::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ListColor, ListIcon, Priority, Status};
    use async_trait::async_trait;
    use chrono::Utc;
    use crossterm::event::KeyModifiers;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// In-memory backend double.
    #[derive(Default)]
    struct MemoryGateway {
        tasks: Mutex<Vec<Task>>,
        lists: Mutex<Vec<TaskList>>,
        fail_writes: AtomicBool,
        fail_reads: AtomicBool,
        /// Fails only the final delete of `delete_list`, after unassigning.
        fail_list_removal: AtomicBool,
        next_id: AtomicUsize,
    }

    impl MemoryGateway {
        fn with(tasks: Vec<Task>, lists: Vec<TaskList>) -> MemoryGateway {
            MemoryGateway {
                tasks: Mutex::new(tasks),
                lists: Mutex::new(lists),
                ..Default::default()
            }
        }

        fn check_write(&self) -> Result<(), GatewayError> {
            if self.fail_writes.load(Ordering::SeqCst) {
                Err(GatewayError::Status {
                    status: 500,
                    message: "database unavailable".to_string(),
                })
            } else {
                Ok(())
            }
        }

        fn check_read(&self) -> Result<(), GatewayError> {
            if self.fail_reads.load(Ordering::SeqCst) {
                Err(GatewayError::Status {
                    status: 503,
                    message: "connection reset".to_string(),
                })
            } else {
                Ok(())
            }
        }

        fn new_id(&self, prefix: &str) -> String {
            format!("{}-{}", prefix, self.next_id.fetch_add(1, Ordering::SeqCst))
        }
    }

    fn apply(task: &mut Task, patch: &TaskPatch) {
        task.title = patch.title.clone();
        task.description = patch.description.clone();
        task.priority = patch.priority;
        task.status = patch.status;
        task.due_date = patch.due_date;
        task.list_id = patch.list_id.clone();
        task.tags = patch.tags.clone();
        task.updated_at = Utc::now();
    }

    #[async_trait]
    impl Gateway for MemoryGateway {
        async fn fetch_tasks(&self) -> Result<Vec<Task>, GatewayError> {
            self.check_read()?;
            Ok(self.tasks.lock().unwrap().clone())
        }

        async fn fetch_lists(&self) -> Result<Vec<TaskList>, GatewayError> {
            self.check_read()?;
            Ok(self.lists.lock().unwrap().clone())
        }

        async fn create_task(&self, patch: &TaskPatch) -> Result<(), GatewayError> {
            self.check_write()?;
            let mut task = task(&self.new_id("t"), "");
            apply(&mut task, patch);
            self.tasks.lock().unwrap().insert(0, task);
            Ok(())
        }

        async fn update_task(&self, id: &str, patch: &TaskPatch) -> Result<(), GatewayError> {
            self.check_write()?;
            for task in self.tasks.lock().unwrap().iter_mut().filter(|t| t.id == id) {
                apply(task, patch);
            }
            Ok(())
        }

        async fn set_task_status(&self, id: &str, status: Status) -> Result<(), GatewayError> {
            self.check_write()?;
            for task in self.tasks.lock().unwrap().iter_mut().filter(|t| t.id == id) {
                task.status = status;
            }
            Ok(())
        }

        async fn delete_task(&self, id: &str) -> Result<(), GatewayError> {
            self.check_write()?;
            self.tasks.lock().unwrap().retain(|t| t.id != id);
            Ok(())
        }

        async fn create_list(&self, patch: &ListPatch) -> Result<(), GatewayError> {
            self.check_write()?;
            let list = TaskList {
                id: self.new_id("l"),
                name: patch.name.clone(),
                color: patch.color,
                icon: patch.icon,
                created_at: Utc::now(),
            };
            self.lists.lock().unwrap().push(list);
            Ok(())
        }

        async fn update_list(&self, id: &str, patch: &ListPatch) -> Result<(), GatewayError> {
            self.check_write()?;
            for list in self.lists.lock().unwrap().iter_mut().filter(|l| l.id == id) {
                list.name = patch.name.clone();
                list.color = patch.color;
                list.icon = patch.icon;
            }
            Ok(())
        }

        async fn delete_list(&self, id: &str) -> Result<(), GatewayError> {
            self.check_write()?;
            for task in self.tasks.lock().unwrap().iter_mut() {
                if task.list_id.as_deref() == Some(id) {
                    task.list_id = None;
                }
            }
            if self.fail_list_removal.load(Ordering::SeqCst) {
                return Err(GatewayError::Status {
                    status: 409,
                    message: "list is locked".to_string(),
                });
            }
            self.lists.lock().unwrap().retain(|l| l.id != id);
            Ok(())
        }
    }

    fn task(id: &str, title: &str) -> Task {
        let now = Utc::now();
        Task {
            id: id.to_string(),
            title: title.to_string(),
            description: None,
            priority: Priority::Medium,
            status: Status::Todo,
            due_date: None,
            tags: Vec::new(),
            list_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn list(id: &str, name: &str) -> TaskList {
        TaskList {
            id: id.to_string(),
            name: name.to_string(),
            color: ListColor::Blue,
            icon: ListIcon::Circle,
            created_at: Utc::now(),
        }
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    async fn loaded(gateway: &MemoryGateway) -> App {
        let mut app = App::new();
        app.reload_all(gateway).await;
        app
    }

    fn seeded() -> MemoryGateway {
        let in_work = |id: &str, title: &str| Task {
            list_id: Some("work".to_string()),
            ..task(id, title)
        };
        MemoryGateway::with(
            vec![in_work("1", "Deploy"), in_work("2", "Review"), task("3", "Laundry")],
            vec![list("work", "Work"), list("home", "Home")],
        )
    }

    #[tokio::test]
    async fn test_reload_selects_first_task() {
        let gateway = seeded();
        let app = loaded(&gateway).await;
        assert_eq!(app.tasks.len(), 3);
        assert_eq!(app.lists.len(), 2);
        assert_eq!(app.state.selected(), Some(0));
        assert_eq!(app.title(), "All Tasks");
    }

    #[tokio::test]
    async fn test_delete_selected_list_unassigns_and_resets_selection() {
        let gateway = seeded();
        let mut app = loaded(&gateway).await;
        app.select(Selection::List("work".to_string()));
        assert_eq!(app.title(), "Work");

        app.handle_input(key(KeyCode::Char('D')), &gateway).await;
        assert!(matches!(
            app.input_mode,
            InputMode::Confirm(PendingDelete::List { ref name, .. }) if name == "Work"
        ));
        app.handle_input(key(KeyCode::Char('y')), &gateway).await;

        assert_eq!(app.selection, Selection::Smart(SmartList::All));
        assert_eq!(app.lists.len(), 1);
        assert_eq!(app.tasks.len(), 3);
        assert!(app.tasks.iter().all(|t| t.list_id.is_none()));
    }

    #[tokio::test]
    async fn test_deleting_other_list_keeps_selection() {
        let gateway = seeded();
        let mut app = loaded(&gateway).await;
        app.select(Selection::List("work".to_string()));
        app.delete_list(&gateway, "home").await;
        assert_eq!(app.selection, Selection::List("work".to_string()));
        assert_eq!(app.visible_tasks(&Local::now()).len(), 2);
    }

    #[tokio::test]
    async fn test_failed_write_keeps_state_and_reports() {
        let gateway = seeded();
        let mut app = loaded(&gateway).await;
        gateway.fail_writes.store(true, Ordering::SeqCst);

        app.toggle_status(&gateway, "1").await;

        assert_eq!(app.tasks[0].status, Status::Todo);
        let notice = app.visible_notice().expect("error notice");
        assert_eq!(notice.level, NoticeLevel::Error);
        assert_eq!(notice.title, "Could not update task");
        assert!(notice.detail.as_deref().unwrap().contains("database unavailable"));
    }

    #[tokio::test]
    async fn test_toggle_status_round_trips() {
        let gateway = seeded();
        let mut app = loaded(&gateway).await;
        app.handle_input(key(KeyCode::Char('x')), &gateway).await;
        assert_eq!(app.tasks[0].status, Status::Done);
        app.handle_input(key(KeyCode::Char('x')), &gateway).await;
        assert_eq!(app.tasks[0].status, Status::Todo);
    }

    #[tokio::test]
    async fn test_create_task_through_form() {
        let gateway = seeded();
        let mut app = loaded(&gateway).await;
        app.handle_input(key(KeyCode::Char('a')), &gateway).await;
        assert!(matches!(app.input_mode, InputMode::TaskForm(_)));

        for c in "Buy Milk !high".chars() {
            app.handle_input(key(KeyCode::Char(c)), &gateway).await;
        }
        app.handle_input(key(KeyCode::Enter), &gateway).await;

        assert!(matches!(app.input_mode, InputMode::Normal));
        assert_eq!(app.tasks.len(), 4);
        let created = &app.tasks[0];
        assert_eq!(created.title, "Buy Milk");
        assert_eq!(created.priority, Priority::High);
        assert_eq!(created.list_id.as_deref(), Some("work"));
        assert_eq!(app.visible_notice().map(|n| n.title.as_str()), Some("Task created"));
    }

    #[tokio::test]
    async fn test_search_narrows_and_escape_clears() {
        let gateway = seeded();
        let mut app = loaded(&gateway).await;
        app.handle_input(key(KeyCode::Char('/')), &gateway).await;
        for c in "REV".chars() {
            app.handle_input(key(KeyCode::Char(c)), &gateway).await;
        }
        let visible: Vec<String> = app
            .visible_tasks(&Local::now())
            .iter()
            .map(|t| t.title.clone())
            .collect();
        assert_eq!(visible, vec!["Review".to_string()]);
        assert_eq!(app.counts(&Local::now()).total, 3);

        app.handle_input(key(KeyCode::Enter), &gateway).await;
        assert!(matches!(app.input_mode, InputMode::Normal));
        app.handle_input(key(KeyCode::Esc), &gateway).await;
        assert!(app.search_query.is_empty());
        assert_eq!(app.visible_tasks(&Local::now()).len(), 3);
    }

    #[tokio::test]
    async fn test_failed_reload_keeps_previous_collection() {
        let gateway = seeded();
        let mut app = loaded(&gateway).await;
        gateway.fail_reads.store(true, Ordering::SeqCst);

        app.handle_input(key(KeyCode::Char('r')), &gateway).await;

        assert_eq!(app.tasks.len(), 3);
        assert_eq!(app.lists.len(), 2);
        let notice = app.visible_notice().expect("error notice");
        assert_eq!(notice.level, NoticeLevel::Error);
        assert!(notice.detail.as_deref().unwrap().contains("connection reset"));
    }

    #[tokio::test]
    async fn test_failed_list_removal_still_refreshes_tasks() {
        let gateway = seeded();
        let mut app = loaded(&gateway).await;
        gateway.fail_list_removal.store(true, Ordering::SeqCst);

        app.delete_list(&gateway, "work").await;

        assert_eq!(app.lists.len(), 2);
        assert!(app.tasks.iter().all(|t| t.list_id.is_none()));
        assert_eq!(
            app.visible_notice().map(|n| n.title.as_str()),
            Some("Could not delete list")
        );
    }

    #[tokio::test]
    async fn test_kanban_cursor_walks_columns() {
        let gateway = MemoryGateway::with(
            vec![
                task("1", "Draft"),
                Task {
                    status: Status::Done,
                    ..task("2", "Shipped")
                },
                task("3", "Polish"),
            ],
            Vec::new(),
        );
        let mut app = loaded(&gateway).await;
        app.handle_input(key(KeyCode::Char('v')), &gateway).await;
        assert_eq!(app.view_mode, ViewMode::Kanban);

        let mut walked = Vec::new();
        for _ in 0..3 {
            walked.push(app.selected_task(&Local::now()).unwrap().id.clone());
            app.handle_input(key(KeyCode::Char('j')), &gateway).await;
        }
        assert_eq!(walked, vec!["1", "3", "2"]);
    }

    #[tokio::test]
    async fn test_view_toggle_keeps_highlighted_task() {
        let gateway = MemoryGateway::with(
            vec![
                task("1", "Draft"),
                Task {
                    status: Status::Done,
                    ..task("2", "Shipped")
                },
                task("3", "Polish"),
            ],
            Vec::new(),
        );
        let mut app = loaded(&gateway).await;
        app.state.select(Some(2));
        app.handle_input(key(KeyCode::Char('v')), &gateway).await;
        assert_eq!(app.selected_task(&Local::now()).unwrap().id, "3");
        assert_eq!(app.state.selected(), Some(1));
    }

    #[tokio::test]
    async fn test_cycle_selection_walks_sidebar() {
        let gateway = seeded();
        let mut app = loaded(&gateway).await;
        let mut seen = Vec::new();
        for _ in 0..6 {
            app.handle_input(key(KeyCode::Char(']')), &gateway).await;
            seen.push(app.selection.clone());
        }
        assert_eq!(
            seen,
            vec![
                Selection::Smart(SmartList::Today),
                Selection::Smart(SmartList::Overdue),
                Selection::Smart(SmartList::Priority),
                Selection::List("work".to_string()),
                Selection::List("home".to_string()),
                Selection::Smart(SmartList::All),
            ]
        );
        app.handle_input(key(KeyCode::Char('[')), &gateway).await;
        assert_eq!(app.selection, Selection::List("home".to_string()));
        assert_eq!(app.state.selected(), None);
    }

    #[tokio::test]
    async fn test_delete_task_needs_confirmation() {
        let gateway = seeded();
        let mut app = loaded(&gateway).await;
        app.handle_input(key(KeyCode::Char('d')), &gateway).await;
        app.handle_input(key(KeyCode::Esc), &gateway).await;
        assert_eq!(app.tasks.len(), 3);

        app.handle_input(key(KeyCode::Char('d')), &gateway).await;
        app.handle_input(key(KeyCode::Enter), &gateway).await;
        assert_eq!(app.tasks.len(), 2);
        assert!(app.tasks.iter().all(|t| t.id != "1"));
    }

    #[tokio::test]
    async fn test_edit_list_through_form() {
        let gateway = seeded();
        let mut app = loaded(&gateway).await;
        app.select(Selection::List("home".to_string()));
        app.handle_input(key(KeyCode::Char('e')), &gateway).await;
        for _ in 0.."Home".len() {
            app.handle_input(key(KeyCode::Backspace), &gateway).await;
        }
        for c in "House".chars() {
            app.handle_input(key(KeyCode::Char(c)), &gateway).await;
        }
        app.handle_input(key(KeyCode::Enter), &gateway).await;
        assert_eq!(app.title(), "House");
    }

    #[tokio::test]
    async fn test_cursor_clamped_after_delete() {
        let gateway = seeded();
        let mut app = loaded(&gateway).await;
        app.state.select(Some(2));
        app.delete_task(&gateway, "3").await;
        assert_eq!(app.state.selected(), Some(1));
    }
}
