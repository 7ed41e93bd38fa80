//! Derived views over the task collection.
//!
//! Everything here is a pure function of its arguments: the current instant
//! is passed in, nothing is cached between calls, and malformed data (absent
//! dates, unknown enum values, dangling list ids) simply fails to match.

use chrono::{DateTime, TimeZone, Utc};

use crate::models::{Priority, Task, TaskList};

/// Computed groupings that are not stored in the backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SmartList {
    All,
    Today,
    Overdue,
    Priority,
}

impl SmartList {
    pub const ALL: [SmartList; 4] = [
        SmartList::All,
        SmartList::Today,
        SmartList::Overdue,
        SmartList::Priority,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SmartList::All => "All Tasks",
            SmartList::Today => "Today",
            SmartList::Overdue => "Overdue",
            SmartList::Priority => "High Priority",
        }
    }
}

/// What the sidebar currently points at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Selection {
    Smart(SmartList),
    List(String),
}

impl Default for Selection {
    fn default() -> Self {
        Selection::Smart(SmartList::All)
    }
}

impl Selection {
    pub fn list_id(&self) -> Option<&str> {
        match self {
            Selection::List(id) => Some(id),
            Selection::Smart(_) => None,
        }
    }
}

/// Badge counts for the smart lists, always over the whole collection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SmartCounts {
    pub total: usize,
    pub today: usize,
    pub overdue: usize,
    pub priority: usize,
}

impl SmartCounts {
    pub fn compute<Tz: TimeZone>(tasks: &[Task], now: &DateTime<Tz>) -> SmartCounts {
        SmartCounts {
            total: tasks.len(),
            today: tasks.iter().filter(|t| is_due_today(t, now)).count(),
            overdue: tasks.iter().filter(|t| is_overdue(t, now)).count(),
            priority: tasks.iter().filter(|t| is_high_priority(t)).count(),
        }
    }

    pub fn for_smart_list(&self, list: SmartList) -> usize {
        match list {
            SmartList::All => self.total,
            SmartList::Today => self.today,
            SmartList::Overdue => self.overdue,
            SmartList::Priority => self.priority,
        }
    }
}

/// Due on `now`'s calendar day (in `now`'s time zone) and still open.
pub fn is_due_today<Tz: TimeZone>(task: &Task, now: &DateTime<Tz>) -> bool {
    match task.due_date {
        Some(due) => {
            task.status.is_open()
                && due.with_timezone(&now.timezone()).date_naive() == now.date_naive()
        }
        None => false,
    }
}

/// Due instant strictly before `now` and still open. This is a point in
/// time comparison, so a task due later today is not overdue yet.
pub fn is_overdue<Tz: TimeZone>(task: &Task, now: &DateTime<Tz>) -> bool {
    match task.due_date {
        Some(due) => task.status.is_open() && due < now.with_timezone(&Utc),
        None => false,
    }
}

pub fn is_high_priority(task: &Task) -> bool {
    task.priority == Priority::High && task.status.is_open()
}

fn matches_search(task: &Task, needle: &str) -> bool {
    needle.is_empty() || task.title.to_lowercase().contains(needle)
}

fn matches_selection<Tz: TimeZone>(task: &Task, selection: &Selection, now: &DateTime<Tz>) -> bool {
    match selection {
        Selection::Smart(SmartList::All) => true,
        Selection::Smart(SmartList::Today) => is_due_today(task, now),
        Selection::Smart(SmartList::Overdue) => is_overdue(task, now),
        Selection::Smart(SmartList::Priority) => is_high_priority(task),
        Selection::List(id) => task.list_id.as_deref() == Some(id.as_str()),
    }
}

/// Tasks to show for the given selection and search text, in input order.
pub fn visible_tasks<'a, Tz: TimeZone>(
    tasks: &'a [Task],
    selection: &Selection,
    search: &str,
    now: &DateTime<Tz>,
) -> Vec<&'a Task> {
    let needle = search.to_lowercase();
    tasks
        .iter()
        .filter(|task| matches_search(task, &needle) && matches_selection(task, selection, now))
        .collect()
}

/// Heading for the current selection. Unknown list ids get a fallback label.
pub fn view_title(selection: &Selection, lists: &[TaskList]) -> String {
    match selection {
        Selection::Smart(smart) => smart.label().to_string(),
        Selection::List(id) => lists
            .iter()
            .find(|list| &list.id == id)
            .map(|list| list.name.clone())
            .unwrap_or_else(|| "All".to_string()),
    }
}
