//! Task and list editing surfaces.
//!
//! A form owns a draft seeded from the entity being edited (or defaults) and
//! never talks to the backend. Key handling returns a [`FormAction`] that
//! the caller acts on.

use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::models::{ListColor, ListIcon, ListPatch, Priority, Status, Task, TaskList, TaskPatch};
use crate::parser::parse_task_input;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, PartialEq)]
pub enum FormAction<P> {
    Save(P),
    /// Delete the entity with this id. Callers confirm before acting.
    Delete(String),
    Close,
}

fn cycle<T: Copy + PartialEq>(options: &[T], current: T, forward: bool) -> T {
    let len = options.len();
    let i = options.iter().position(|o| *o == current).unwrap_or(0);
    let next = if forward { (i + 1) % len } else { (i + len - 1) % len };
    options[next]
}

fn is_delete_chord(key: &KeyEvent) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('d')
}

/// Local midnight of `date`, as an instant.
fn local_midnight(date: NaiveDate) -> Option<DateTime<Utc>> {
    let naive = date.and_hms_opt(0, 0, 0)?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|d| d.with_timezone(&Utc))
}

fn parse_due_date(text: &str) -> Result<Option<DateTime<Utc>>, String> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    let date = NaiveDate::parse_from_str(text, DATE_FORMAT)
        .map_err(|_| format!("Due date must look like 2024-05-31, got `{}`", text))?;
    local_midnight(date)
        .map(Some)
        .ok_or_else(|| format!("No local midnight on {}", text))
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TaskField {
    Title,
    Description,
    List,
    DueDate,
    Priority,
    Status,
    Tags,
}

impl TaskField {
    pub const ORDER: [TaskField; 7] = [
        TaskField::Title,
        TaskField::Description,
        TaskField::List,
        TaskField::DueDate,
        TaskField::Priority,
        TaskField::Status,
        TaskField::Tags,
    ];
}

pub struct TaskForm {
    /// Id of the task being edited; `None` when creating.
    pub editing: Option<String>,
    pub title: String,
    pub description: String,
    pub list_id: Option<String>,
    pub due_date: String,
    pub priority: Priority,
    pub status: Status,
    pub tags: Vec<String>,
    pub new_tag: String,
    pub field: TaskField,
    pub error: Option<String>,
    list_choices: Vec<(String, String)>,
}

impl TaskForm {
    pub fn new(lists: &[TaskList]) -> TaskForm {
        TaskForm {
            editing: None,
            title: String::new(),
            description: String::new(),
            list_id: lists.first().map(|l| l.id.clone()),
            due_date: String::new(),
            priority: Priority::Medium,
            status: Status::Todo,
            tags: Vec::new(),
            new_tag: String::new(),
            field: TaskField::Title,
            error: None,
            list_choices: lists.iter().map(|l| (l.id.clone(), l.name.clone())).collect(),
        }
    }

    pub fn edit(task: &Task, lists: &[TaskList]) -> TaskForm {
        TaskForm {
            editing: Some(task.id.clone()),
            title: task.title.clone(),
            description: task.description.clone().unwrap_or_default(),
            list_id: task.list_id.clone(),
            due_date: task
                .due_date
                .map(|d| d.with_timezone(&Local).format(DATE_FORMAT).to_string())
                .unwrap_or_default(),
            priority: task.priority,
            status: task.status,
            tags: task.tags.clone(),
            ..TaskForm::new(lists)
        }
    }

    pub fn heading(&self) -> &'static str {
        if self.editing.is_some() {
            "Edit Task"
        } else {
            "New Task"
        }
    }

    pub fn can_submit(&self) -> bool {
        !self.title.trim().is_empty()
    }

    /// Name of the selected list, or "None" when unassigned.
    pub fn list_name(&self) -> &str {
        self.list_id
            .as_deref()
            .and_then(|id| self.list_choices.iter().find(|(lid, _)| lid == id))
            .map(|(_, name)| name.as_str())
            .unwrap_or("None")
    }

    /// Adds the pending tag. Empty and duplicate tags are refused.
    pub fn add_tag(&mut self) -> bool {
        let tag = self.new_tag.trim().to_string();
        if tag.is_empty() || self.tags.contains(&tag) {
            return false;
        }
        self.tags.push(tag);
        self.new_tag.clear();
        true
    }

    pub fn remove_tag(&mut self, tag: &str) {
        self.tags.retain(|t| t != tag);
    }

    fn cycle_list(&mut self, forward: bool) {
        let mut options: Vec<Option<&str>> = vec![None];
        options.extend(self.list_choices.iter().map(|(id, _)| Some(id.as_str())));
        let next = cycle(&options, self.list_id.as_deref(), forward);
        self.list_id = next.map(str::to_string);
    }

    fn move_field(&mut self, forward: bool) {
        self.field = cycle(&TaskField::ORDER, self.field, forward);
    }

    /// Builds the patch, or records why it cannot.
    pub fn submit(&mut self) -> Option<TaskPatch> {
        if !self.can_submit() {
            self.error = Some("Title is required".to_string());
            return None;
        }
        let due_date = match parse_due_date(&self.due_date) {
            Ok(due) => due,
            Err(message) => {
                self.error = Some(message);
                self.field = TaskField::DueDate;
                return None;
            }
        };

        let mut title = self.title.trim().to_string();
        let mut priority = self.priority;
        let mut tags = self.tags.clone();
        if self.editing.is_none() {
            let parsed = parse_task_input(&title);
            if parsed.title.is_empty() {
                self.error = Some("Title is required".to_string());
                return None;
            }
            title = parsed.title;
            if let Some(p) = parsed.priority {
                priority = p;
            }
            for tag in parsed.tags {
                if !tags.contains(&tag) {
                    tags.push(tag);
                }
            }
        }

        let description = self.description.trim();
        self.error = None;
        Some(TaskPatch {
            id: self.editing.clone(),
            title,
            description: (!description.is_empty()).then(|| description.to_string()),
            priority,
            status: self.status,
            due_date,
            list_id: self.list_id.clone(),
            tags,
        })
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<FormAction<TaskPatch>> {
        if is_delete_chord(&key) {
            return self.editing.clone().map(FormAction::Delete);
        }
        match key.code {
            KeyCode::Esc => return Some(FormAction::Close),
            KeyCode::Tab | KeyCode::Down => self.move_field(true),
            KeyCode::BackTab | KeyCode::Up => self.move_field(false),
            KeyCode::Enter => {
                if self.field == TaskField::Tags && !self.new_tag.trim().is_empty() {
                    self.add_tag();
                } else {
                    return self.submit().map(FormAction::Save);
                }
            }
            code => self.edit_field(code),
        }
        None
    }

    fn edit_field(&mut self, code: KeyCode) {
        let forward = !matches!(code, KeyCode::Left);
        match self.field {
            TaskField::List if matches!(code, KeyCode::Left | KeyCode::Right | KeyCode::Char(' ')) => {
                self.cycle_list(forward)
            }
            TaskField::Priority
                if matches!(code, KeyCode::Left | KeyCode::Right | KeyCode::Char(' ')) =>
            {
                self.priority = cycle(&Priority::ALL, self.priority, forward)
            }
            TaskField::Status if matches!(code, KeyCode::Left | KeyCode::Right | KeyCode::Char(' ')) => {
                self.status = cycle(&Status::ALL, self.status, forward)
            }
            TaskField::Title => edit_text(&mut self.title, code),
            TaskField::Description => edit_text(&mut self.description, code),
            TaskField::DueDate => edit_text(&mut self.due_date, code),
            TaskField::Tags => {
                if code == KeyCode::Backspace && self.new_tag.is_empty() {
                    if let Some(last) = self.tags.last().cloned() {
                        self.remove_tag(&last);
                    }
                } else if code != KeyCode::Char(' ') {
                    edit_text(&mut self.new_tag, code);
                }
            }
            _ => {}
        }
    }
}

fn edit_text(buffer: &mut String, code: KeyCode) {
    match code {
        KeyCode::Char(c) => buffer.push(c),
        KeyCode::Backspace => {
            buffer.pop();
        }
        _ => {}
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ListField {
    Name,
    Icon,
    Color,
}

pub struct ListForm {
    pub editing: Option<String>,
    pub name: String,
    pub icon: ListIcon,
    pub color: ListColor,
    pub field: ListField,
}

impl ListForm {
    pub fn new() -> ListForm {
        ListForm {
            editing: None,
            name: String::new(),
            icon: ListIcon::Circle,
            color: ListColor::Blue,
            field: ListField::Name,
        }
    }

    pub fn edit(list: &TaskList) -> ListForm {
        ListForm {
            editing: Some(list.id.clone()),
            name: list.name.clone(),
            icon: list.icon,
            color: list.color,
            field: ListField::Name,
        }
    }

    pub fn heading(&self) -> &'static str {
        if self.editing.is_some() {
            "Edit List"
        } else {
            "New List"
        }
    }

    pub fn can_submit(&self) -> bool {
        !self.name.trim().is_empty()
    }

    pub fn submit(&self) -> Option<ListPatch> {
        if !self.can_submit() {
            return None;
        }
        Some(ListPatch {
            id: self.editing.clone(),
            name: self.name.trim().to_string(),
            color: self.color,
            icon: self.icon,
        })
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<FormAction<ListPatch>> {
        if is_delete_chord(&key) {
            return self.editing.clone().map(FormAction::Delete);
        }
        const FIELDS: [ListField; 3] = [ListField::Name, ListField::Icon, ListField::Color];
        match key.code {
            KeyCode::Esc => return Some(FormAction::Close),
            KeyCode::Tab | KeyCode::Down => self.field = cycle(&FIELDS, self.field, true),
            KeyCode::BackTab | KeyCode::Up => self.field = cycle(&FIELDS, self.field, false),
            KeyCode::Enter => return self.submit().map(FormAction::Save),
            code => {
                let forward = !matches!(code, KeyCode::Left);
                let cycles = matches!(code, KeyCode::Left | KeyCode::Right | KeyCode::Char(' '));
                match self.field {
                    ListField::Name => edit_text(&mut self.name, code),
                    ListField::Icon if cycles => self.icon = cycle(&ListIcon::ALL, self.icon, forward),
                    ListField::Color if cycles => {
                        self.color = cycle(&ListColor::ALL, self.color, forward)
                    }
                    _ => {}
                }
            }
        }
        None
    }
}

impl Default for ListForm {
    fn default() -> Self {
        ListForm::new()
    }
}
