use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    /// Anything the backend sends that is not one of the three levels.
    #[serde(other)]
    Other,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    pub fn label(self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
            Priority::Other => "Unknown",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    #[serde(rename = "todo")]
    Todo,
    #[serde(rename = "in-progress")]
    InProgress,
    #[serde(rename = "done")]
    Done,
    #[serde(other)]
    Other,
}

impl Status {
    pub const ALL: [Status; 3] = [Status::Todo, Status::InProgress, Status::Done];

    /// Open means still actionable: `Todo` or `InProgress`. Unrecognized
    /// statuses are neither open nor done.
    pub fn is_open(self) -> bool {
        matches!(self, Status::Todo | Status::InProgress)
    }

    pub fn label(self) -> &'static str {
        match self {
            Status::Todo => "To Do",
            Status::InProgress => "In Progress",
            Status::Done => "Done",
            Status::Other => "Unknown",
        }
    }

    /// The status a checkbox toggle moves to.
    pub fn toggled(self) -> Status {
        if self == Status::Done {
            Status::Todo
        } else {
            Status::Done
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ListColor {
    #[default]
    Blue,
    Purple,
    Orange,
    Green,
    Red,
}

impl ListColor {
    pub const ALL: [ListColor; 5] = [
        ListColor::Blue,
        ListColor::Purple,
        ListColor::Orange,
        ListColor::Green,
        ListColor::Red,
    ];

    /// Unknown names fall back to the default color.
    pub fn from_name(name: &str) -> ListColor {
        match name {
            "purple" => ListColor::Purple,
            "orange" => ListColor::Orange,
            "green" => ListColor::Green,
            "red" => ListColor::Red,
            _ => ListColor::Blue,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ListColor::Blue => "Blue",
            ListColor::Purple => "Purple",
            ListColor::Orange => "Orange",
            ListColor::Green => "Green",
            ListColor::Red => "Red",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ListIcon {
    Users,
    Flask,
    Briefcase,
    #[default]
    Circle,
}

impl ListIcon {
    pub const ALL: [ListIcon; 4] = [
        ListIcon::Users,
        ListIcon::Flask,
        ListIcon::Briefcase,
        ListIcon::Circle,
    ];

    pub fn from_name(name: &str) -> ListIcon {
        match name {
            "users" => ListIcon::Users,
            "flask" => ListIcon::Flask,
            "briefcase" => ListIcon::Briefcase,
            _ => ListIcon::Circle,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ListIcon::Users => "People",
            ListIcon::Flask => "Research",
            ListIcon::Briefcase => "Work",
            ListIcon::Circle => "Default",
        }
    }

    /// Glyph shown next to the list name in the sidebar.
    pub fn glyph(self) -> &'static str {
        match self {
            ListIcon::Users => "👥",
            ListIcon::Flask => "⚗",
            ListIcon::Briefcase => "💼",
            ListIcon::Circle => "○",
        }
    }
}

// Task entity, as the rest of the app sees it
#[derive(Clone, Debug, PartialEq)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub status: Status,
    pub due_date: Option<DateTime<Utc>>,
    pub tags: Vec<String>,
    pub list_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TaskList {
    pub id: String,
    pub name: String,
    pub color: ListColor,
    pub icon: ListIcon,
    pub created_at: DateTime<Utc>,
}

/// Editable task fields emitted by the task form.
///
/// `id` is set when the form edited an existing task and empty when it
/// created a new one.
#[derive(Clone, Debug, PartialEq)]
pub struct TaskPatch {
    pub id: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub status: Status,
    pub due_date: Option<DateTime<Utc>>,
    pub list_id: Option<String>,
    pub tags: Vec<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ListPatch {
    pub id: Option<String>,
    pub name: String,
    pub color: ListColor,
    pub icon: ListIcon,
}
