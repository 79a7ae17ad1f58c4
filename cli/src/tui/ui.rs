use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Position, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Row, Table, Wrap},
    Frame,
};
use taskminder_core::{Notification, Priority};

use crate::tui::app::{App, InputMode};

pub fn draw(f: &mut Frame, app: &mut App) {
    let size = f.area();
    let banner = app.banner();

    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(0)
        .constraints([
            Constraint::Length(3),                                   // Header
            Constraint::Length(if banner.is_some() { 3 } else { 0 }), // Reminder banner
            Constraint::Min(1),                                      // Content
            Constraint::Length(3),                                   // Input
            Constraint::Length(1),                                   // Footer/Help
        ])
        .split(size);

    let header = Paragraph::new("TASKMINDER")
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).border_type(BorderType::Rounded));
    f.render_widget(header, main_chunks[0]);

    if let Some(notification) = &banner {
        draw_banner(f, notification, main_chunks[1]);
    }

    let content_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(main_chunks[2]);

    draw_task_list(f, app, content_chunks[0]);
    draw_detail_view(f, app, content_chunks[1]);
    draw_input(f, app, main_chunks[3]);

    let footer_text = match &app.status {
        Some(status) => status.clone(),
        None => "j/k: Navigate | space: Done | d: Delete | a: Add | /: Search | s: Sort | c: Completed | q: Quit"
            .to_string(),
    };
    let footer_style = if app.status.is_some() {
        Style::default().fg(Color::Red)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let footer = Paragraph::new(footer_text)
        .style(footer_style)
        .alignment(Alignment::Center);
    f.render_widget(footer, main_chunks[4]);
}

fn priority_style(priority: Priority) -> Style {
    match priority {
        Priority::High => Style::default().fg(Color::Red),
        Priority::Medium => Style::default().fg(Color::Yellow),
        Priority::Low => Style::default().fg(Color::Green),
    }
}

fn draw_banner(f: &mut Frame, notification: &Notification, area: Rect) {
    let line = Line::from(vec![
        Span::styled("⏰ ", Style::default()),
        Span::styled(
            notification.title.as_str(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(": "),
        Span::raw(notification.message.as_str()),
        Span::raw("  "),
        Span::styled(
            notification.priority.as_str(),
            priority_style(notification.priority),
        ),
    ]);
    let banner = Paragraph::new(line).block(
        Block::default()
            .title(" Reminder ")
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Magenta)),
    );
    f.render_widget(banner, area);
}

fn draw_task_list(f: &mut Frame, app: &mut App, area: Rect) {
    let rows: Vec<Row> = app
        .tasks
        .iter()
        .map(|task| {
            let status_icon = if task.completed { "✔" } else { "☐" };
            let pri_str = match task.priority {
                Priority::High => "H",
                Priority::Medium => "M",
                Priority::Low => "L",
            };
            let title_style = if task.completed {
                Style::default().add_modifier(Modifier::CROSSED_OUT)
            } else {
                Style::default().add_modifier(Modifier::BOLD)
            };

            Row::new(vec![
                Span::styled(status_icon, Style::default()),
                Span::styled(pri_str, priority_style(task.priority)),
                Span::raw(task.reminder_time.format("%m-%d %H:%M").to_string()),
                Span::styled(task.title.clone(), title_style),
            ])
        })
        .collect();

    let mut title = format!(" Tasks {}/{} · {} ", app.tasks.len(), app.total, app.query.sort_key);
    if app.query.completed_only {
        title.push_str("· completed ");
    }
    if !app.query.search_text.is_empty() {
        title.push_str(&format!("· \"{}\" ", app.query.search_text));
    }

    let table = Table::new(
        rows,
        [
            Constraint::Length(3),  // Status
            Constraint::Length(3),  // Priority
            Constraint::Length(12), // Reminder
            Constraint::Min(10),    // Title
        ],
    )
    .header(Row::new(vec!["St", "Pr", "Reminder", "Task"]).style(Style::default().fg(Color::Yellow)))
    .block(Block::default().title(title).borders(Borders::ALL).border_type(BorderType::Rounded))
    .row_highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol(">> ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn draw_detail_view(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Detail ")
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded);

    let Some(task) = app.state.selected().and_then(|i| app.tasks.get(i)) else {
        let hint = if app.total == 0 {
            "No tasks available. Add a task!"
        } else {
            ""
        };
        f.render_widget(Paragraph::new(hint).block(block), area);
        return;
    };

    let detail_text = vec![
        Line::from(vec![
            Span::styled("Title: ", Style::default().fg(Color::Blue)),
            Span::styled(&task.title, Style::default().add_modifier(Modifier::BOLD)),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("ID: ", Style::default().fg(Color::DarkGray)),
            Span::raw(task.id.to_string()),
        ]),
        Line::from(vec![
            Span::styled("Status: ", Style::default().fg(Color::Blue)),
            Span::raw(if task.completed { "Completed" } else { "Open" }),
        ]),
        Line::from(vec![
            Span::styled("Priority: ", Style::default().fg(Color::Blue)),
            Span::styled(task.priority.as_str(), priority_style(task.priority)),
        ]),
        Line::from(vec![
            Span::styled("Reminder: ", Style::default().fg(Color::Blue)),
            Span::raw(task.reminder_time.format("%Y-%m-%d %H:%M").to_string()),
        ]),
        Line::from(""),
        Line::from(Span::styled("Message:", Style::default().fg(Color::Blue))),
        Line::from(task.message.as_str()),
    ];

    let detail_block = Paragraph::new(detail_text)
        .block(block)
        .wrap(Wrap { trim: true });
    f.render_widget(detail_block, area);
}

fn draw_input(f: &mut Frame, app: &App, area: Rect) {
    let (title, style) = match app.input_mode {
        InputMode::Normal => (" a: add · /: search ", Style::default().fg(Color::DarkGray)),
        InputMode::Adding => (
            " Add: <title> m:<message> a:<time|+30m> p:<h|m|l> ",
            Style::default().fg(Color::Yellow),
        ),
        InputMode::Searching => (" Search ", Style::default().fg(Color::Yellow)),
    };

    let input = Paragraph::new(app.input.as_str()).style(style).block(
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded),
    );
    f.render_widget(input, area);

    if !matches!(app.input_mode, InputMode::Normal) {
        let before: String = app.input.chars().take(app.cursor_position).collect();
        let x = area.x + 1 + unicode_width::UnicodeWidthStr::width(before.as_str()) as u16;
        f.set_cursor_position(Position::new(x, area.y + 1));
    }
}
