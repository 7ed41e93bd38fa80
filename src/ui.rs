use crate::api::Gateway;
use crate::app::{App, InputMode, NoticeLevel, PendingDelete};
use crate::filter::{self, Selection, SmartCounts, SmartList};
use crate::forms::{ListField, ListForm, TaskField, TaskForm};
use crate::models::{ListColor, TaskList};
use crate::views::{display_order, render_kanban_view, render_list_view, ViewMode};
use chrono::Local;
use crossterm::event::{self, Event as CEvent, KeyEventKind};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame, Terminal,
};
use std::io;
use std::time::Duration;

const SIDEBAR_WIDTH: u16 = 30;

fn centered_rect_absolute(width: u16, height: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length((r.height.saturating_sub(height)) / 2),
                Constraint::Length(height),
                Constraint::Length((r.height.saturating_sub(height) + 1) / 2),
            ]
            .as_ref(),
        )
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            [
                Constraint::Length((r.width.saturating_sub(width)) / 2),
                Constraint::Length(width),
                Constraint::Length((r.width.saturating_sub(width) + 1) / 2),
            ]
            .as_ref(),
        )
        .split(popup_layout[1])[1]
}

fn key_hint(key: &'static str, action: &'static str) -> [Span<'static>; 2] {
    [
        Span::styled(key, Style::default().fg(Color::Red)),
        Span::raw(action),
    ]
}

fn get_legend(input_mode: &InputMode) -> Text<'static> {
    let hints: Vec<[Span<'static>; 2]> = match input_mode {
        InputMode::Normal => vec![
            key_hint(" q ", ": Quit "),
            key_hint(" j/k ", ": Move "),
            key_hint(" [/] ", ": Lists "),
            key_hint(" / ", ": Search "),
            key_hint(" v ", ": View "),
            key_hint(" a ", ": Add "),
            key_hint(" Enter ", ": Edit "),
            key_hint(" x ", ": Done "),
            key_hint(" d ", ": Delete "),
            key_hint(" L ", ": New List "),
            key_hint(" e/D ", ": Edit/Delete List "),
            key_hint(" r ", ": Reload "),
        ],
        InputMode::Search => vec![
            key_hint(" Enter ", ": Keep "),
            key_hint(" Esc ", ": Clear "),
        ],
        InputMode::TaskForm(_) | InputMode::ListForm(_) => vec![
            key_hint(" Tab ", ": Next Field "),
            key_hint(" ←/→ ", ": Change "),
            key_hint(" Enter ", ": Save "),
            key_hint(" Ctrl-d ", ": Delete "),
            key_hint(" Esc ", ": Cancel "),
        ],
        InputMode::Confirm(_) => vec![
            key_hint(" y ", ": Delete "),
            key_hint(" n ", ": Keep "),
        ],
    };
    Text::from(Line::from(hints.into_iter().flatten().collect::<Vec<_>>()))
}

fn list_color(color: ListColor) -> Color {
    match color {
        ListColor::Blue => Color::Blue,
        ListColor::Purple => Color::Magenta,
        ListColor::Orange => Color::Rgb(255, 165, 0),
        ListColor::Green => Color::Green,
        ListColor::Red => Color::Red,
    }
}

fn smart_glyph(smart: SmartList) -> (&'static str, Color) {
    match smart {
        SmartList::All => ("☰", Color::White),
        SmartList::Today => ("◷", Color::Blue),
        SmartList::Overdue => ("⚠", Color::Red),
        SmartList::Priority => ("★", Color::Yellow),
    }
}

fn sidebar_row(
    glyph: &'static str,
    glyph_style: Style,
    name: &str,
    count: Option<usize>,
    selected: bool,
) -> Line<'static> {
    let base = if selected {
        Style::default()
            .fg(Color::Green)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    let mut spans = vec![
        Span::raw(if selected { ">" } else { " " }),
        Span::styled(format!("{} ", glyph), glyph_style),
        Span::styled(name.to_string(), base),
    ];
    // Zero counts are hidden.
    if let Some(count) = count.filter(|c| *c > 0) {
        spans.push(Span::styled(
            format!(" {}", count),
            Style::default().fg(Color::DarkGray),
        ));
    }
    Line::from(spans)
}

fn render_sidebar(
    f: &mut Frame,
    area: Rect,
    selection: &Selection,
    lists: &[TaskList],
    counts: &SmartCounts,
) {
    let heading = Style::default()
        .fg(Color::DarkGray)
        .add_modifier(Modifier::BOLD);
    let mut lines = vec![Line::from(Span::styled("SMART LISTS", heading))];

    for smart in SmartList::ALL {
        let (glyph, color) = smart_glyph(smart);
        lines.push(sidebar_row(
            glyph,
            Style::default().fg(color),
            smart.label(),
            Some(counts.for_smart_list(smart)),
            *selection == Selection::Smart(smart),
        ));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("MY LISTS", heading)));
    for list in lists {
        lines.push(sidebar_row(
            list.icon.glyph(),
            Style::default().fg(list_color(list.color)),
            &list.name,
            None,
            selection.list_id() == Some(list.id.as_str()),
        ));
    }

    let sidebar = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("EduTask"))
        .wrap(Wrap { trim: true });
    f.render_widget(sidebar, area);
}

fn form_row(label: &'static str, value: String, active: bool) -> Line<'static> {
    let marker = if active { "> " } else { "  " };
    let value_style = if active {
        Style::default().fg(Color::Green)
    } else {
        Style::default().fg(Color::White)
    };
    Line::from(vec![
        Span::raw(marker),
        Span::styled(
            format!("{:<12}", label),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::styled(value, value_style),
    ])
}

fn render_task_form(f: &mut Frame, area: Rect, form: &TaskForm) {
    let tags = if form.tags.is_empty() {
        form.new_tag.clone()
    } else {
        let chips: Vec<String> = form.tags.iter().map(|t| format!("#{}", t)).collect();
        format!("{} {}", chips.join(" "), form.new_tag)
    };
    let due = if form.due_date.is_empty() && form.field != TaskField::DueDate {
        "None".to_string()
    } else {
        form.due_date.clone()
    };

    let mut lines = vec![
        form_row("Title", form.title.clone(), form.field == TaskField::Title),
        form_row(
            "Notes",
            form.description.clone(),
            form.field == TaskField::Description,
        ),
        form_row("List", form.list_name().to_string(), form.field == TaskField::List),
        form_row("Due", due, form.field == TaskField::DueDate),
        form_row(
            "Priority",
            form.priority.label().to_string(),
            form.field == TaskField::Priority,
        ),
        form_row(
            "Status",
            form.status.label().to_string(),
            form.field == TaskField::Status,
        ),
        form_row("Tags", tags, form.field == TaskField::Tags),
    ];
    if let Some(error) = &form.error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            error.clone(),
            Style::default().fg(Color::Red),
        )));
    }

    let border = if form.can_submit() {
        Color::Green
    } else {
        Color::DarkGray
    };
    let height = lines.len() as u16 + 2;
    let popup_area = centered_rect_absolute(area.width.min(70), height, area);
    let popup = Paragraph::new(lines).block(
        Block::default()
            .title(form.heading())
            .borders(Borders::ALL)
            .style(Style::default().fg(border)),
    );
    f.render_widget(Clear, popup_area);
    f.render_widget(popup, popup_area);
}

fn render_list_form(f: &mut Frame, area: Rect, form: &ListForm) {
    let lines = vec![
        form_row("Name", form.name.clone(), form.field == ListField::Name),
        form_row(
            "Icon",
            format!("{} {}", form.icon.glyph(), form.icon.label()),
            form.field == ListField::Icon,
        ),
        form_row(
            "Color",
            form.color.label().to_string(),
            form.field == ListField::Color,
        ),
    ];
    let popup_area = centered_rect_absolute(area.width.min(50), lines.len() as u16 + 2, area);
    let popup = Paragraph::new(lines).block(
        Block::default()
            .title(form.heading())
            .borders(Borders::ALL)
            .style(Style::default().fg(list_color(form.color))),
    );
    f.render_widget(Clear, popup_area);
    f.render_widget(popup, popup_area);
}

fn render_confirm(f: &mut Frame, area: Rect, pending: &PendingDelete) {
    let (title, message) = match pending {
        PendingDelete::Task { title, .. } => (
            "Delete Task",
            format!("Delete \"{}\"? This cannot be undone.", title),
        ),
        PendingDelete::List { name, .. } => (
            "Delete List",
            format!(
                "Delete the list \"{}\"? Its tasks are kept, just unassigned.",
                name
            ),
        ),
    };
    let popup_area = centered_rect_absolute(area.width.min(60), 5, area);
    let popup = Paragraph::new(message)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .style(Style::default().fg(Color::Red)),
        );
    f.render_widget(Clear, popup_area);
    f.render_widget(popup, popup_area);
}

/// Draws one full frame.
pub fn draw(f: &mut Frame, app: &mut App) {
    let now = Local::now();
    let size = f.area();

    // Split the main layout into body and footer
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(0)
        .constraints([Constraint::Min(0), Constraint::Length(2)].as_ref())
        .split(size);

    let body_chunk = chunks[0];
    let footer_chunk = chunks[1];

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(0)].as_ref())
        .split(body_chunk);

    let counts = app.counts(&now);
    render_sidebar(f, columns[0], &app.selection, &app.lists, &counts);

    let main = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Min(0),
            ]
            .as_ref(),
        )
        .split(columns[1]);

    // Header
    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            app.title(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("  [{}]", app.view_mode.label()),
            Style::default().fg(Color::DarkGray),
        ),
    ]))
    .block(Block::default().borders(Borders::ALL));
    f.render_widget(header, main[0]);

    // Search box
    let searching = matches!(app.input_mode, InputMode::Search);
    let search_text = if app.search_query.is_empty() && !searching {
        Span::styled("Search tasks... (/)", Style::default().fg(Color::DarkGray))
    } else {
        Span::raw(app.search_query.clone())
    };
    let search_style = if searching {
        Style::default().fg(Color::Green)
    } else {
        Style::default()
    };
    let search = Paragraph::new(Line::from(search_text)).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Search")
            .style(search_style),
    );
    f.render_widget(search, main[1]);

    // Tasks
    let visible = filter::visible_tasks(&app.tasks, &app.selection, &app.search_query, &now);
    match app.view_mode {
        ViewMode::List => render_list_view(f, main[2], &visible, &mut app.state, &now),
        ViewMode::Kanban => {
            let ordered = display_order(&visible, ViewMode::Kanban);
            let selected = app
                .state
                .selected()
                .and_then(|i| ordered.get(i))
                .map(|task| task.id.as_str());
            render_kanban_view(f, main[2], &visible, selected, &now)
        }
    }

    // Popups
    match &app.input_mode {
        InputMode::TaskForm(form) => render_task_form(f, body_chunk, form),
        InputMode::ListForm(form) => render_list_form(f, body_chunk, form),
        InputMode::Confirm(pending) => render_confirm(f, body_chunk, pending),
        InputMode::Normal | InputMode::Search => {}
    }

    // Footer: notice line, then the legend
    let footer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)].as_ref())
        .split(footer_chunk);

    if let Some(notice) = app.visible_notice() {
        let color = match notice.level {
            NoticeLevel::Info => Color::Green,
            NoticeLevel::Error => Color::Red,
        };
        let mut spans = vec![Span::styled(
            notice.title.clone(),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )];
        if let Some(detail) = &notice.detail {
            spans.push(Span::raw(format!(": {}", detail)));
        }
        f.render_widget(Paragraph::new(Line::from(spans)), footer[0]);
    }

    let legend = Paragraph::new(get_legend(&app.input_mode))
        .style(Style::default().fg(Color::White))
        .alignment(Alignment::Left);

    f.render_widget(legend, footer[1]);
}

pub async fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    mut app: App,
    gateway: &dyn Gateway,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| draw(f, &mut app))?;

        // Handle input
        if event::poll(Duration::from_millis(100))? {
            if let CEvent::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                let should_quit = app.handle_input(key, gateway).await;
                if should_quit {
                    return Ok(());
                }
            }
        }
    }
}
