use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use aura_core::{Reply, Screen};

use crate::app::{App, InputMode, FREE_TEXT_SECTION};
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

/// Line-editing keys shared by the free-text inputs
fn edit_text(text: &mut String, cursor: &mut usize, key: KeyEvent) {
    match key.code {
        KeyCode::Backspace => {
            if *cursor > 0 {
                *cursor -= 1;
                let byte_pos = char_to_byte_index(text, *cursor);
                text.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            if *cursor < text.chars().count() {
                let byte_pos = char_to_byte_index(text, *cursor);
                text.remove(byte_pos);
            }
        }
        KeyCode::Left => *cursor = cursor.saturating_sub(1),
        KeyCode::Right => *cursor = (*cursor + 1).min(text.chars().count()),
        KeyCode::Home => *cursor = 0,
        KeyCode::End => *cursor = text.chars().count(),
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(text, *cursor);
            text.insert(byte_pos, c);
            *cursor += 1;
        }
        _ => {}
    }
}

pub async fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => {
            app.tick();
            app.poll_tasks().await;
        }
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    // The overlay captures input until dismissed
    if app.overlay.is_some() {
        handle_overlay(app, key);
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Char('q') {
        app.should_quit = true;
        return;
    }

    match app.screen() {
        Screen::Initial => handle_form_normal(app, key),
        Screen::Chatting => handle_chat_normal(app, key),
        Screen::Processing => {}
        Screen::Results => handle_results_normal(app, key),
        Screen::Error => {
            if matches!(key.code, KeyCode::Enter | KeyCode::Char('r')) {
                app.reset();
            }
        }
    }
}

fn handle_form_normal(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Tab => app.form_next_section(),
        KeyCode::BackTab => app.form_prev_section(),
        KeyCode::Char('j') | KeyCode::Down => app.form_nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.form_nav_up(),
        KeyCode::Char(' ') => app.form_toggle(),
        KeyCode::Char('i') => {
            app.form_section = FREE_TEXT_SECTION;
            app.free_text_cursor = app.form.free_text.chars().count();
            app.input_mode = InputMode::Editing;
        }
        KeyCode::Enter => {
            if app.form_section == FREE_TEXT_SECTION {
                app.free_text_cursor = app.form.free_text.chars().count();
                app.input_mode = InputMode::Editing;
            } else {
                app.submit_form();
            }
        }
        KeyCode::Char('s') => app.submit_form(),
        _ => {}
    }
}

fn handle_chat_normal(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('b') => app.go_back(),
        KeyCode::Char('j') | KeyCode::Down => app.chat_nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.chat_nav_up(),
        KeyCode::Enter => app.chat_select(),
        KeyCode::Char('i') => app.start_free_text(),
        KeyCode::Char(c @ '1'..='9') => {
            let index = c as usize - '1' as usize;
            if app.can_reply() && index + 1 < app.chat_choice_count() {
                app.reply(Reply::Choice(index));
            }
        }
        _ => {}
    }
}

fn handle_results_normal(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => app.items_nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.items_nav_up(),
        KeyCode::Enter => app.run_selected_action(),
        KeyCode::Char('m') => app.save_moodboard(),
        KeyCode::Char('r') => app.reset(),
        _ => {}
    }
}

fn handle_overlay(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') => app.close_overlay(),
        KeyCode::Char('j') | KeyCode::Down => app.overlay_scroll = app.overlay_scroll.saturating_add(1),
        KeyCode::Char('k') | KeyCode::Up => app.overlay_scroll = app.overlay_scroll.saturating_sub(1),
        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match app.screen() {
        Screen::Initial => handle_free_text_editing(app, key),
        Screen::Chatting => handle_chat_editing(app, key),
        _ => app.input_mode = InputMode::Normal,
    }
}

fn handle_free_text_editing(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Enter | KeyCode::Tab => {
            app.input_mode = InputMode::Normal;
        }
        _ => edit_text(&mut app.form.free_text, &mut app.free_text_cursor, key),
    }
}

fn handle_chat_editing(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Enter => {
            if !app.chat_input.trim().is_empty() && app.can_reply() {
                app.send_chat_text();
            }
        }
        _ => edit_text(&mut app.chat_input, &mut app.chat_cursor, key),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_char_to_byte_index_multibyte() {
        assert_eq!(char_to_byte_index("あいう", 0), 0);
        assert_eq!(char_to_byte_index("あいう", 1), 3);
        assert_eq!(char_to_byte_index("あいう", 5), 9);
    }

    #[test]
    fn test_edit_text_inserts_and_deletes_at_cursor() {
        let mut text = String::from("あう");
        let mut cursor = 1;
        edit_text(&mut text, &mut cursor, key(KeyCode::Char('い')));
        assert_eq!(text, "あいう");
        assert_eq!(cursor, 2);

        edit_text(&mut text, &mut cursor, key(KeyCode::Backspace));
        assert_eq!(text, "あう");
        edit_text(&mut text, &mut cursor, key(KeyCode::End));
        assert_eq!(cursor, 2);
        edit_text(&mut text, &mut cursor, key(KeyCode::Delete));
        assert_eq!(text, "あう");
    }
}
