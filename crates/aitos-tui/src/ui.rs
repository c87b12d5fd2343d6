use aitos_core::history::format_timestamp;
use aitos_core::task::Task;
use aitos_core::{MemberStatus, Module, Priority, Provider, TaskStatus, TaskStore};
use chrono::{Local, Utc};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, FocusPane, FormField, InputMode, Screen};

const SPINNER: [&str; 3] = [".  ", ".. ", "..."];

/// Render `**bold**` runs; everything else is literal
fn parse_markdown_line(text: &str) -> Line<'static> {
    let parts: Vec<&str> = text.split("**").collect();
    // An odd number of parts means every `**` was closed
    let balanced = parts.len() % 2 == 1;

    let spans: Vec<Span<'static>> = parts
        .iter()
        .enumerate()
        .filter(|(_, part)| !part.is_empty())
        .map(|(i, part)| {
            if balanced && i % 2 == 1 {
                Span::styled(part.to_string(), Style::default().add_modifier(Modifier::BOLD))
            } else if !balanced && i > 0 {
                Span::raw(format!("**{part}"))
            } else {
                Span::raw(part.to_string())
            }
        })
        .collect();

    Line::from(spans)
}

fn popup_area(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height.saturating_sub(2));
    Rect::new(
        area.x + (area.width.saturating_sub(width)) / 2,
        area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    )
}

fn priority_color(priority: Priority) -> Color {
    match priority {
        Priority::Low => Color::Green,
        Priority::Medium => Color::Yellow,
        Priority::High => Color::LightRed,
        Priority::Critical => Color::Red,
    }
}

fn status_color(status: MemberStatus) -> Color {
    match status {
        MemberStatus::Active => Color::Green,
        MemberStatus::Away => Color::Yellow,
        MemberStatus::Busy => Color::Red,
        MemberStatus::Unknown => Color::DarkGray,
    }
}

fn column_color(status: TaskStatus) -> Color {
    match status {
        TaskStatus::Todo => Color::Gray,
        TaskStatus::InProgress => Color::Cyan,
        TaskStatus::Review => Color::Magenta,
        TaskStatus::Completed => Color::Green,
        TaskStatus::Blocked => Color::Red,
    }
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    match app.screen {
        Screen::Dashboard => render_dashboard(app, frame, body_area),
        Screen::Board => render_board(app, frame, body_area),
    }

    render_footer(app, frame, footer_area);

    // Render popups (in order of priority)
    app.history_area = None;
    if app.show_api_key_input {
        render_api_key_input(app, frame, area);
    } else if app.show_provider_picker {
        render_provider_picker(app, frame, area);
    } else if app.show_model_picker {
        render_model_picker(app, frame, area);
    } else if app.show_task_form {
        render_task_form(app, frame, area);
    } else if app.show_history {
        render_history(app, frame, area);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" AIT-OS ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            format!("{} ", app.user.display_name()),
            Style::default().fg(Color::White),
        ),
        Span::styled(
            format!("[{}: {}] ", app.current_provider.display_name(), app.selected_model),
            Style::default().fg(Color::Gray),
        ),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };

    let mode_text = match app.screen {
        Screen::Dashboard => " DASHBOARD ",
        Screen::Board => " BOARD ",
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().fg(Color::White);

    let hints: &[(&str, &str)] = if app.show_api_key_input {
        &[("Enter", "save"), ("Esc", "cancel")]
    } else if app.show_provider_picker || app.show_model_picker {
        &[("j/k", "move"), ("Enter", "select"), ("Esc", "cancel")]
    } else if app.show_task_form {
        &[("Tab", "next field"), ("←/→", "change"), ("Enter", "create"), ("Esc", "cancel")]
    } else if app.show_history {
        &[("j/k", "move"), ("c", "copy response"), ("y", "copy command"), ("D", "clear"), ("Esc", "close")]
    } else {
        match (app.screen, app.input_mode) {
            (_, InputMode::Editing) => &[("Enter", "send"), ("Tab", "modules"), ("Esc", "normal")],
            (Screen::Dashboard, InputMode::Normal) => &[
                ("i", "ask"),
                ("1-7", "module"),
                ("s", "suggest"),
                ("t", "board"),
                ("H", "history"),
                ("P/M", "provider/model"),
                ("q", "quit"),
            ],
            (Screen::Board, InputMode::Normal) => &[
                ("h/l", "column"),
                ("j/k", "card"),
                ("1-5", "move to"),
                ("</>", "shift"),
                ("n", "new task"),
                ("Esc", "dashboard"),
            ],
        }
    };

    let mut spans = vec![Span::styled(mode_text, mode_style), Span::raw(" ")];
    for (key, label) in hints {
        spans.push(Span::styled(format!(" {key} "), key_style));
        spans.push(Span::styled(format!(" {label} "), label_style));
    }
    if let Some((message, _)) = &app.status_message {
        spans.push(Span::styled(format!("  {message}"), Style::default().fg(Color::Green)));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

// ----------------------------------------------------------------------
// Dashboard
// ----------------------------------------------------------------------

fn render_dashboard(app: &mut App, frame: &mut Frame, area: Rect) {
    let [command_area, modules_area, main_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Min(0),
    ])
    .areas(area);

    let [roster_area, response_area] =
        Layout::horizontal([Constraint::Length(34), Constraint::Min(0)]).areas(main_area);

    render_command_bar(app, frame, command_area);
    render_modules(app, frame, modules_area);
    render_roster(app, frame, roster_area);
    render_response(app, frame, response_area);
}

fn render_command_bar(app: &App, frame: &mut Frame, area: Rect) {
    let focused = app.focus == FocusPane::CommandBar;
    let border = if focused && app.input_mode == InputMode::Editing {
        Color::Yellow
    } else if focused {
        Color::Cyan
    } else {
        Color::DarkGray
    };

    let title = if app.command_in_flight() {
        format!(" @OSS BOT: thinking{} ", SPINNER[app.animation_frame as usize % SPINNER.len()])
    } else {
        " @OSS BOT: ".to_string()
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .title(title);

    let content = if app.command_input.is_empty() && app.input_mode != InputMode::Editing {
        Line::styled(
            "Ask about tasks, OKRs, the team... (press i, or s for a suggestion)",
            Style::default().fg(Color::DarkGray),
        )
    } else {
        Line::raw(app.command_input.as_str())
    };

    let inner = block.inner(area);
    frame.render_widget(Paragraph::new(content).block(block), area);

    if focused && app.input_mode == InputMode::Editing {
        let cursor_x = (app.command_cursor as u16).min(inner.width.saturating_sub(1));
        frame.set_cursor_position((inner.x + cursor_x, inner.y));
    }
}

fn render_modules(app: &App, frame: &mut Frame, area: Rect) {
    let focused = app.focus == FocusPane::Modules;
    let running = app.module_in_flight();

    let mut spans = Vec::new();
    for (i, module) in Module::ALL.iter().enumerate() {
        let mut style = Style::default().fg(Color::White);
        if focused && i == app.selected_module {
            style = style.bg(Color::Blue).add_modifier(Modifier::BOLD);
        }
        if running == Some(*module) {
            style = style.fg(Color::Yellow);
        }

        spans.push(Span::styled(format!("{}", i + 1), Style::default().fg(Color::DarkGray)));
        let suffix = if running == Some(*module) {
            SPINNER[app.animation_frame as usize % SPINNER.len()]
        } else {
            ""
        };
        spans.push(Span::styled(format!(" {}{} ", module.label(), suffix), style));
        spans.push(Span::raw(" "));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if focused { Color::Cyan } else { Color::DarkGray }))
        .title(" Modules ");

    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn render_roster(app: &App, frame: &mut Frame, area: Rect) {
    let [team_area, summary_area] =
        Layout::vertical([Constraint::Min(0), Constraint::Length(3)]).areas(area);

    let items: Vec<ListItem> = app
        .roster
        .members()
        .iter()
        .map(|member| {
            let is_me = member.user_id == app.user.id;
            ListItem::new(Line::from(vec![
                Span::styled("● ", Style::default().fg(status_color(member.status))),
                Span::styled(
                    format!("{:<3}", member.initials()),
                    Style::default().fg(Color::Cyan).bold(),
                ),
                Span::styled(
                    member.display_name.clone(),
                    if is_me {
                        Style::default().add_modifier(Modifier::BOLD)
                    } else {
                        Style::default()
                    },
                ),
                Span::styled(format!("  {}", member.role), Style::default().fg(Color::DarkGray)),
            ]))
        })
        .collect();

    let team = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(format!(" Team ({}) ", app.roster.len())),
    );
    frame.render_widget(team, team_area);

    let summary = Paragraph::new(app.board_summary())
        .style(Style::default().fg(Color::Gray))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray))
                .title(" Tasks "),
        );
    frame.render_widget(summary, summary_area);
}

fn render_response(app: &mut App, frame: &mut Frame, area: Rect) {
    app.response_area = Some(area);
    let focused = app.focus == FocusPane::Response;

    let (title, text) = match &app.latest_response {
        Some(entry) => {
            let when = format_timestamp(entry.timestamp, Utc::now(), &Local);
            let mut lines = vec![
                Line::from(vec![
                    Span::styled("> ", Style::default().fg(Color::Yellow)),
                    Span::styled(entry.command.clone(), Style::default().fg(Color::Yellow)),
                ]),
                Line::default(),
            ];
            lines.extend(entry.response.lines().map(parse_markdown_line));
            (format!(" OSS BOT · {when} "), Text::from(lines))
        }
        None => (
            " OSS BOT ".to_string(),
            Text::styled(
                "No responses yet. Ask something in the command bar or pick a module.",
                Style::default().fg(Color::DarkGray),
            ),
        ),
    };

    let paragraph = Paragraph::new(text)
        .wrap(Wrap { trim: false })
        .scroll((app.response_scroll, 0))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(if focused { Color::Cyan } else { Color::DarkGray }))
                .title(title),
        );
    frame.render_widget(paragraph, area);
}

// ----------------------------------------------------------------------
// Board
// ----------------------------------------------------------------------

/// Cut `text` to `width` columns, marking the cut with an ellipsis
fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    text.chars().take(width.saturating_sub(1)).collect::<String>() + "…"
}

fn task_card(task: &Task, app: &App, width: usize) -> ListItem<'static> {
    let title = truncate(&task.title, width);

    let assignee = app
        .tasks
        .resolve_assignee(task, &app.roster)
        .map(|m| m.initials())
        .unwrap_or_else(|| "--".to_string());

    let mut meta = vec![
        Span::styled(
            format!("[{}]", task.priority.as_str()),
            Style::default().fg(priority_color(task.priority)),
        ),
        Span::styled(format!(" {assignee}"), Style::default().fg(Color::Cyan)),
    ];
    if let Some(due) = task.due_date {
        meta.push(Span::styled(
            format!(" due {}", due.format("%b %-d")),
            Style::default().fg(Color::DarkGray),
        ));
    }

    let mut lines = vec![Line::styled(title, Style::default().bold())];
    if let Some(description) = task.description.as_deref().filter(|d| !d.trim().is_empty()) {
        // First line only; the card is a summary
        let first = description.lines().next().unwrap_or_default();
        lines.push(Line::styled(
            truncate(first, width),
            Style::default().fg(Color::DarkGray),
        ));
    }
    lines.push(Line::from(meta));
    lines.push(Line::default());

    ListItem::new(Text::from(lines))
}

fn render_board(app: &mut App, frame: &mut Frame, area: Rect) {
    let columns: [Rect; 5] = Layout::horizontal([Constraint::Ratio(1, 5); 5]).areas(area);

    for (i, (status, title)) in TaskStore::columns().into_iter().enumerate() {
        let col_area = columns[i];
        let selected = i == app.selected_column;
        let card_width = col_area.width.saturating_sub(4) as usize;

        let items: Vec<ListItem> = app
            .tasks
            .list_by_status(status)
            .into_iter()
            .map(|task| task_card(task, app, card_width))
            .collect();
        let count = items.len();

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(if selected { Color::Cyan } else { Color::DarkGray }))
            .title(Span::styled(
                format!(" {} ({}) ", title, count),
                Style::default().fg(column_color(status)).bold(),
            ));

        let highlight = if selected {
            Style::default().bg(Color::Blue).fg(Color::White)
        } else {
            Style::default()
        };
        let list = List::new(items).block(block).highlight_style(highlight);

        frame.render_stateful_widget(list, col_area, &mut app.column_states[i]);
    }
}

// ----------------------------------------------------------------------
// Popups
// ----------------------------------------------------------------------

fn render_history(app: &mut App, frame: &mut Frame, area: Rect) {
    let popup = popup_area(area, 90, area.height.saturating_sub(4));
    frame.render_widget(Clear, popup);
    app.history_area = Some(popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(format!(
            " Command History ({}/{}) ",
            app.history_entries.len(),
            app.history.capacity()
        ));
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    if app.history_entries.is_empty() {
        let empty = Paragraph::new("No commands yet.").style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, inner);
        return;
    }

    let [list_area, detail_area] =
        Layout::vertical([Constraint::Percentage(50), Constraint::Percentage(50)]).areas(inner);

    let now = Utc::now();
    let items: Vec<ListItem> = app
        .history_entries
        .iter()
        .map(|entry| {
            let mut spans = vec![
                Span::styled(
                    format!("{:>16}  ", format_timestamp(entry.timestamp, now, &Local)),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::raw(entry.command.clone()),
            ];
            if let Some(module_type) = &entry.module_type {
                spans.push(Span::styled(
                    format!("  [{module_type}]"),
                    Style::default().fg(Color::Magenta),
                ));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    let list = List::new(items)
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");
    frame.render_stateful_widget(list, list_area, &mut app.history_state);

    if let Some(entry) = app.selected_history_entry() {
        let lines: Vec<Line> = entry.response.lines().map(parse_markdown_line).collect();
        let detail = Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::TOP).title(" Response "));
        frame.render_widget(detail, detail_area);
    }
}

fn render_task_form(app: &App, frame: &mut Frame, area: Rect) {
    let popup = popup_area(area, 64, 16);
    frame.render_widget(Clear, popup);

    let form = &app.task_form;
    let assignee = form
        .assignee
        .and_then(|i| app.roster.members().get(i))
        .map(|m| format!("{} ({})", m.display_name, m.role))
        .unwrap_or_else(|| "Unassigned".to_string());

    let fields = [
        (FormField::Title, "Title", form.title.clone()),
        (FormField::Description, "Description", form.description.clone()),
        (FormField::Priority, "Priority", format!("< {} >", form.priority.as_str())),
        (FormField::Assignee, "Assignee", format!("< {assignee} >")),
        (FormField::DueDate, "Due (YYYY-MM-DD)", form.due_date.clone()),
        (FormField::Hours, "Estimated hours", form.estimated_hours.clone()),
    ];

    let mut lines = Vec::new();
    for (field, label, value) in fields {
        let active = field == form.field;
        let label_style = if active {
            Style::default().fg(Color::Yellow).bold()
        } else {
            Style::default().fg(Color::Gray)
        };
        let cursor = if active && field.is_text() { "_" } else { "" };
        lines.push(Line::from(vec![
            Span::styled(format!("{label:>18}: "), label_style),
            Span::raw(format!("{value}{cursor}")),
        ]));
        lines.push(Line::default());
    }

    if form.title.trim().is_empty() {
        lines.push(Line::styled(
            "A title is required.",
            Style::default().fg(Color::DarkGray),
        ));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" New Task ");
    frame.render_widget(Paragraph::new(lines).block(block), popup);
}

fn render_model_picker(app: &mut App, frame: &mut Frame, area: Rect) {
    let height = (app.available_models.len() as u16).max(1) + 2;
    let popup = popup_area(area, 44, height);
    frame.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Select Model (Enter to select, Esc to cancel) ");

    if app.available_models.is_empty() {
        let empty = Paragraph::new(" No models found")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(empty, popup);
        return;
    }

    let items: Vec<ListItem> = app
        .available_models
        .iter()
        .map(|model| {
            let style = if model == &app.selected_model {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(format!(" {model} ")).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, popup, &mut app.model_picker_state);
}

fn render_provider_picker(app: &mut App, frame: &mut Frame, area: Rect) {
    let providers = Provider::all();
    let popup = popup_area(area, 45, providers.len() as u16 + 2);
    frame.render_widget(Clear, popup);

    let items: Vec<ListItem> = providers
        .iter()
        .map(|provider| {
            let key_source = app.get_key_source(*provider);
            let is_current = *provider == app.current_provider;

            let status = match key_source {
                Some("env") => "(env var)",
                Some("config") => "(configured)",
                Some("local") => "(local)",
                _ => "(needs key)",
            };
            let prefix = if is_current { "* " } else { "  " };

            let style = if is_current {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else if key_source.is_some() {
                Style::default()
            } else {
                Style::default().fg(Color::DarkGray)
            };

            ListItem::new(format!("{}{} {}", prefix, provider.display_name(), status)).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(" Select Provider "),
        )
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, popup, &mut app.provider_picker_state);
}

fn render_api_key_input(app: &App, frame: &mut Frame, area: Rect) {
    let provider_name = app
        .api_key_target_provider
        .map(|p| p.display_name())
        .unwrap_or("Provider");

    let popup = popup_area(area, 60, 7);
    frame.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(format!(" Enter API Key for {provider_name} "));
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let [help_area, _, input_area, _, status_area] = Layout::vertical([Constraint::Length(1); 5]).areas(inner);

    frame.render_widget(
        Paragraph::new("Paste your API key below. Press Enter to save, Esc to cancel.")
            .style(Style::default().fg(Color::DarkGray)),
        help_area,
    );

    // Mask all but the last four characters
    let char_count = app.api_key_input.chars().count();
    let display_text = if char_count <= 4 {
        "*".repeat(char_count)
    } else {
        let masked_len = char_count - 4;
        let last_four: String = app.api_key_input.chars().skip(masked_len).collect();
        format!("{}...{}", "*".repeat(masked_len.min(20)), last_four)
    };
    frame.render_widget(
        Paragraph::new(display_text).style(Style::default().fg(Color::Cyan)),
        input_area,
    );

    let cursor_x = app.api_key_input_cursor.min(input_area.width as usize) as u16;
    frame.set_cursor_position((input_area.x + cursor_x, input_area.y));

    frame.render_widget(
        Paragraph::new(format!("{char_count} characters")).style(Style::default().fg(Color::DarkGray)),
        status_area,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_of(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_markdown_bold_runs() {
        let line = parse_markdown_line("Focus on **blocked** tasks");
        assert_eq!(line.spans.len(), 3);
        assert!(line.spans[1].style.add_modifier.contains(Modifier::BOLD));
        assert_eq!(text_of(&line), "Focus on blocked tasks");
    }

    #[test]
    fn test_markdown_unclosed_is_literal() {
        let line = parse_markdown_line("a **b");
        assert_eq!(text_of(&line), "a **b");
        assert!(line.spans.iter().all(|s| !s.style.add_modifier.contains(Modifier::BOLD)));
    }

    #[test]
    fn test_truncate_marks_cut() {
        assert_eq!(truncate("Draft Q3 roadmap", 40), "Draft Q3 roadmap");
        assert_eq!(truncate("Draft Q3 roadmap", 8), "Draft Q…");
        assert_eq!(truncate("Draft Q3 roadmap", 8).chars().count(), 8);
    }

    #[test]
    fn test_task_card_shows_description() {
        let store: std::sync::Arc<dyn aitos_core::KeyValueStore> =
            std::sync::Arc::new(aitos_core::MemoryStore::new());
        let config = aitos_core::Config {
            seed_demo_data: false,
            ..aitos_core::Config::new()
        };
        let mut app = App::new(config, store, aitos_core::CurrentUser::new("me", None));
        let mut draft = aitos_core::TaskDraft::new("Write report", Priority::Medium);
        draft.description = "Summarise sprint outcomes for the board\nsecond line".to_string();
        let task = app.tasks.create_task("me", draft).unwrap();

        assert_eq!(task_card(&task, &app, 20).height(), 4);

        let bare = app
            .tasks
            .create_task("me", aitos_core::TaskDraft::new("No notes", Priority::Low))
            .unwrap();
        assert_eq!(task_card(&bare, &app, 20).height(), 3);
    }

    #[test]
    fn test_popup_stays_inside_area() {
        let area = Rect::new(0, 0, 20, 10);
        let popup = popup_area(area, 60, 30);
        assert!(popup.x + popup.width <= area.width);
        assert!(popup.y + popup.height <= area.height);
    }
}
