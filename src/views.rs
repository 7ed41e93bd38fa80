//! List and kanban renderings of the visible task sequence.

use chrono::{DateTime, Local};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState},
    Frame,
};

use crate::filter::is_overdue;
use crate::models::{Priority, Status, Task};

const EMPTY_PLACEHOLDER: &str = "No tasks";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ViewMode {
    #[default]
    List,
    Kanban,
}

impl ViewMode {
    pub fn toggled(self) -> ViewMode {
        match self {
            ViewMode::List => ViewMode::Kanban,
            ViewMode::Kanban => ViewMode::List,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ViewMode::List => "List",
            ViewMode::Kanban => "Kanban",
        }
    }
}

pub struct KanbanColumn<'a> {
    pub status: Status,
    pub tasks: Vec<&'a Task>,
}

/// Splits the visible tasks into To Do, In Progress and Done columns, in
/// that order, keeping relative order inside each column.
pub fn kanban_columns<'a>(visible: &[&'a Task]) -> Vec<KanbanColumn<'a>> {
    Status::ALL
        .iter()
        .map(|&status| KanbanColumn {
            status,
            tasks: visible
                .iter()
                .copied()
                .filter(|task| task.status == status)
                .collect(),
        })
        .collect()
}

/// The order a cursor walks the tasks in: as given for the list view, column
/// by column for the kanban board.
pub fn display_order<'a>(visible: &[&'a Task], mode: ViewMode) -> Vec<&'a Task> {
    match mode {
        ViewMode::List => visible.to_vec(),
        ViewMode::Kanban => kanban_columns(visible)
            .into_iter()
            .flat_map(|column| column.tasks)
            .collect(),
    }
}

fn checkbox(status: Status) -> &'static str {
    match status {
        Status::Done => "[x] ",
        Status::InProgress => "[~] ",
        _ => "[ ] ",
    }
}

/// One row of the list view: checkbox, title, tags, priority flag and due
/// date, with the first description line underneath.
pub fn task_item(task: &Task, now: &DateTime<Local>) -> ListItem<'static> {
    let done = task.status == Status::Done;
    let title_style = if done {
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::CROSSED_OUT)
    } else {
        Style::default()
    };

    let mut spans = vec![
        Span::raw(checkbox(task.status)),
        Span::styled(task.title.clone(), title_style),
    ];
    for tag in &task.tags {
        spans.push(Span::styled(
            format!(" #{}", tag),
            Style::default().fg(Color::DarkGray),
        ));
    }
    if task.priority == Priority::High {
        spans.push(Span::styled(" !", Style::default().fg(Color::Yellow)));
    }
    if let Some(due) = task.due_date {
        let style = if is_overdue(task, now) {
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::styled(
            format!("  {}", due.with_timezone(&Local).format("%d/%m")),
            style,
        ));
    }

    let mut lines = vec![Line::from(spans)];
    if let Some(first) = task.description.as_deref().and_then(|d| d.lines().next()) {
        lines.push(Line::from(Span::styled(
            format!("    {}", first),
            Style::default().fg(Color::DarkGray),
        )));
    }
    ListItem::new(lines)
}

pub fn render_list_view(
    f: &mut Frame,
    area: Rect,
    tasks: &[&Task],
    state: &mut ListState,
    now: &DateTime<Local>,
) {
    let block = Block::default().borders(Borders::ALL);

    if tasks.is_empty() {
        let placeholder = List::new(vec![ListItem::new(EMPTY_PLACEHOLDER)]).block(block);
        f.render_widget(placeholder, area);
        return;
    }

    let items: Vec<ListItem> = tasks.iter().map(|task| task_item(task, now)).collect();
    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol(">> ");
    f.render_stateful_widget(list, area, state);
}

/// Kanban board. `selected` is the id of the highlighted task, if any.
pub fn render_kanban_view(
    f: &mut Frame,
    area: Rect,
    tasks: &[&Task],
    selected: Option<&str>,
    now: &DateTime<Local>,
) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            [
                Constraint::Ratio(1, 3),
                Constraint::Ratio(1, 3),
                Constraint::Ratio(1, 3),
            ]
            .as_ref(),
        )
        .split(area);

    for (column, chunk) in kanban_columns(tasks).into_iter().zip(chunks.iter()) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!("{} ({})", column.status.label(), column.tasks.len()));

        let items: Vec<ListItem> = if column.tasks.is_empty() {
            vec![ListItem::new(EMPTY_PLACEHOLDER)]
        } else {
            column
                .tasks
                .iter()
                .map(|task| {
                    let item = task_item(task, now);
                    if selected == Some(task.id.as_str()) {
                        item.style(
                            Style::default()
                                .fg(Color::Green)
                                .add_modifier(Modifier::BOLD),
                        )
                    } else {
                        item
                    }
                })
                .collect()
        };
        f.render_widget(List::new(items).block(block), *chunk);
    }
}
