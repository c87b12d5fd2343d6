use anyhow::Result;
use aitos_core::{Module, Provider, TaskStatus};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;

use crate::app::{App, FocusPane, FormField, InputMode, Screen};
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

/// Single-line text editing shared by the command bar and the API key prompt.
/// Returns false when the key is not an editing key.
fn edit_line(input: &mut String, cursor: &mut usize, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(input, *cursor);
            input.insert(byte_pos, c);
            *cursor += 1;
        }
        KeyCode::Backspace => {
            if *cursor > 0 {
                *cursor -= 1;
                let byte_pos = char_to_byte_index(input, *cursor);
                input.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            if *cursor < input.chars().count() {
                let byte_pos = char_to_byte_index(input, *cursor);
                input.remove(byte_pos);
            }
        }
        KeyCode::Left => *cursor = cursor.saturating_sub(1),
        KeyCode::Right => *cursor = (*cursor + 1).min(input.chars().count()),
        KeyCode::Home => *cursor = 0,
        KeyCode::End => *cursor = input.chars().count(),
        _ => return false,
    }
    true
}

pub async fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key).await?,
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize => {}
        AppEvent::Tick => app.tick_animation(),
    }
    Ok(())
}

async fn handle_key(app: &mut App, key: KeyEvent) -> Result<()> {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return Ok(());
    }

    // Overlays take input before the screen underneath
    if app.show_api_key_input {
        handle_api_key_input(app, key);
    } else if app.show_provider_picker {
        handle_provider_picker(app, key);
    } else if app.show_model_picker {
        handle_model_picker(app, key);
    } else if app.show_task_form {
        handle_task_form(app, key);
    } else if app.show_history {
        handle_history(app, key);
    } else {
        match (app.input_mode, app.screen) {
            (InputMode::Editing, _) => handle_command_editing(app, key),
            (InputMode::Normal, Screen::Dashboard) => handle_dashboard_normal(app, key).await,
            (InputMode::Normal, Screen::Board) => handle_board_normal(app, key),
        }
    }

    Ok(())
}

fn handle_command_editing(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.input_mode = InputMode::Normal,
        KeyCode::Enter => {
            app.submit_command();
        }
        KeyCode::Tab => {
            app.input_mode = InputMode::Normal;
            app.focus = FocusPane::Modules;
        }
        _ => {
            edit_line(&mut app.command_input, &mut app.command_cursor, key);
        }
    }
}

async fn handle_dashboard_normal(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        KeyCode::Char('i') | KeyCode::Char('/') => {
            app.focus = FocusPane::CommandBar;
            app.input_mode = InputMode::Editing;
        }

        KeyCode::Tab => {
            app.focus = match app.focus {
                FocusPane::CommandBar => FocusPane::Modules,
                FocusPane::Modules => FocusPane::Response,
                FocusPane::Response => FocusPane::CommandBar,
            };
            if app.focus == FocusPane::CommandBar {
                app.input_mode = InputMode::Editing;
            }
        }

        // Modules
        KeyCode::Char('h') | KeyCode::Left if app.focus == FocusPane::Modules => app.module_prev(),
        KeyCode::Char('l') | KeyCode::Right if app.focus == FocusPane::Modules => app.module_next(),
        KeyCode::Enter if app.focus == FocusPane::Modules => {
            let module = app.selected_module();
            app.activate_module(module);
        }
        KeyCode::Char(c @ '1'..='7') => {
            let index = c as usize - '1' as usize;
            if let Some(module) = Module::from_index(index) {
                app.selected_module = index;
                app.activate_module(module);
            }
        }

        // Response panel
        KeyCode::Char('j') | KeyCode::Down => {
            app.response_scroll = app.response_scroll.saturating_add(1);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.response_scroll = app.response_scroll.saturating_sub(1);
        }
        KeyCode::Char('c') => {
            if let Some(text) = app.latest_response.as_ref().map(|r| r.response.clone()) {
                copy_and_flash(app, &text);
            }
        }

        KeyCode::Char('s') => app.fill_suggestion(),
        KeyCode::Char('t') => app.screen = Screen::Board,
        KeyCode::Char('H') => app.open_history(),
        KeyCode::Char('P') => open_provider_picker(app),
        KeyCode::Char('M') => open_model_picker(app).await,

        _ => {}
    }
}

fn handle_board_normal(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Esc | KeyCode::Char('b') => app.screen = Screen::Dashboard,

        KeyCode::Char('h') | KeyCode::Left => app.column_prev(),
        KeyCode::Char('l') | KeyCode::Right => app.column_next(),
        KeyCode::Char('j') | KeyCode::Down => app.card_down(),
        KeyCode::Char('k') | KeyCode::Up => app.card_up(),

        // Move the selected card
        KeyCode::Char(c @ '1'..='5') => {
            if let Some(status) = TaskStatus::from_index(c as usize - '1' as usize) {
                app.move_selected_task(status);
            }
        }
        KeyCode::Char('<') | KeyCode::Char('H') => {
            app.shift_selected_task(-1);
        }
        KeyCode::Char('>') | KeyCode::Char('L') => {
            app.shift_selected_task(1);
        }

        KeyCode::Char('n') => app.open_task_form(),
        KeyCode::Char('?') => app.open_history(),
        KeyCode::Char('i') | KeyCode::Char('/') => {
            app.screen = Screen::Dashboard;
            app.focus = FocusPane::CommandBar;
            app.input_mode = InputMode::Editing;
        }

        _ => {}
    }
}

fn handle_task_form(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.close_task_form(),
        KeyCode::Enter => {
            if !app.submit_task_form() {
                app.task_form.field = FormField::Title;
            }
        }
        KeyCode::Tab | KeyCode::Down => app.task_form.field = app.task_form.field.next(),
        KeyCode::BackTab | KeyCode::Up => app.task_form.field = app.task_form.field.prev(),
        KeyCode::Left if !app.task_form.field.is_text() => app.cycle_form_choice(false),
        KeyCode::Right | KeyCode::Char(' ') if !app.task_form.field.is_text() => {
            app.cycle_form_choice(true)
        }
        KeyCode::Backspace => {
            if let Some(text) = app.task_form.active_text_mut() {
                text.pop();
            }
        }
        KeyCode::Char(c) => {
            if let Some(text) = app.task_form.active_text_mut() {
                text.push(c);
            }
        }
        _ => {}
    }
}

fn handle_history(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('H') => app.show_history = false,
        KeyCode::Char('j') | KeyCode::Down => app.history_nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.history_nav_up(),
        KeyCode::Char('c') | KeyCode::Enter => {
            if let Some(text) = app.selected_history_entry().map(|e| e.response.clone()) {
                copy_and_flash(app, &text);
            }
        }
        KeyCode::Char('y') => {
            if let Some(text) = app.selected_history_entry().map(|e| e.command.clone()) {
                copy_and_flash(app, &text);
            }
        }
        KeyCode::Char('D') => {
            app.clear_history();
            app.flash("History cleared");
        }
        _ => {}
    }
}

fn handle_api_key_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.cancel_api_key_input(),
        KeyCode::Enter => app.submit_api_key(),
        _ => {
            edit_line(&mut app.api_key_input, &mut app.api_key_input_cursor, key);
        }
    }
}

fn open_provider_picker(app: &mut App) {
    let current = Provider::all()
        .iter()
        .position(|p| *p == app.current_provider)
        .unwrap_or(0);
    app.provider_picker_state.select(Some(current));
    app.show_provider_picker = true;
}

fn handle_provider_picker(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => app.show_provider_picker = false,
        KeyCode::Char('j') | KeyCode::Down => app.provider_picker_nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.provider_picker_nav_up(),
        KeyCode::Enter => {
            if let Some(provider) = app
                .provider_picker_state
                .selected()
                .and_then(|i| Provider::all().get(i).copied())
            {
                app.choose_provider(provider);
            }
        }
        _ => {}
    }
}

async fn open_model_picker(app: &mut App) {
    app.load_models().await;
    let current = app
        .available_models
        .iter()
        .position(|m| *m == app.selected_model)
        .unwrap_or(0);
    app.model_picker_state.select(if app.available_models.is_empty() {
        None
    } else {
        Some(current)
    });
    app.show_model_picker = true;
}

fn handle_model_picker(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => app.show_model_picker = false,
        KeyCode::Char('j') | KeyCode::Down => app.model_picker_nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.model_picker_nav_up(),
        KeyCode::Enter => app.select_model(),
        _ => {}
    }
}

fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let (x, y) = (mouse.column, mouse.row);
    let over = |area: Option<Rect>| area.is_some_and(|a| point_in_rect(x, y, a));

    match mouse.kind {
        MouseEventKind::ScrollDown => {
            if app.show_history && over(app.history_area) {
                app.history_nav_down();
            } else if over(app.response_area) {
                app.response_scroll = app.response_scroll.saturating_add(1);
            }
        }
        MouseEventKind::ScrollUp => {
            if app.show_history && over(app.history_area) {
                app.history_nav_up();
            } else if over(app.response_area) {
                app.response_scroll = app.response_scroll.saturating_sub(1);
            }
        }
        _ => {}
    }
}

fn copy_and_flash(app: &mut App, text: &str) {
    if copy_to_clipboard(text) {
        app.flash("Copied to clipboard");
    } else {
        app.flash("No clipboard tool found");
    }
}

/// Pipe `text` into the first clipboard tool that starts
fn copy_to_clipboard(text: &str) -> bool {
    use std::io::Write;
    use std::process::{Command, Stdio};

    const TOOLS: [(&str, &[&str]); 3] = [
        ("pbcopy", &[]),
        ("wl-copy", &[]),
        ("xclip", &["-selection", "clipboard"]),
    ];

    for (program, args) in TOOLS {
        let Ok(mut child) = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .spawn()
        else {
            continue;
        };
        if let Some(mut stdin) = child.stdin.take() {
            let _ = stdin.write_all(text.as_bytes());
        }
        return child.wait().map(|s| s.success()).unwrap_or(false);
    }
    tracing::debug!("no clipboard tool available");
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_char_to_byte_index_multibyte() {
        assert_eq!(char_to_byte_index("héllo", 2), 3);
        assert_eq!(char_to_byte_index("abc", 10), 3);
    }

    #[test]
    fn test_edit_line_inserts_at_cursor() {
        let mut input = "hllo".to_string();
        let mut cursor = 1;
        assert!(edit_line(&mut input, &mut cursor, key(KeyCode::Char('e'))));
        assert_eq!(input, "hello");
        assert_eq!(cursor, 2);

        edit_line(&mut input, &mut cursor, key(KeyCode::End));
        edit_line(&mut input, &mut cursor, key(KeyCode::Backspace));
        assert_eq!(input, "hell");
        assert!(!edit_line(&mut input, &mut cursor, key(KeyCode::Enter)));
    }

    #[test]
    fn test_point_in_rect_edges() {
        let rect = Rect::new(2, 2, 3, 3);
        assert!(point_in_rect(2, 2, rect));
        assert!(point_in_rect(4, 4, rect));
        assert!(!point_in_rect(5, 4, rect));
    }
}
