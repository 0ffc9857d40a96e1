use crate::application::{App, AppMode, FormField};
use crate::infrastructure::CsvExporter;
use crossterm::event::{KeyCode, KeyModifiers};

pub struct InputHandler;

impl InputHandler {
    pub fn handle_key_event(app: &mut App, key: KeyCode, modifiers: KeyModifiers) {
        match app.mode {
            AppMode::Browse => Self::handle_browse_mode(app, key),
            AppMode::Booking => Self::handle_booking_mode(app, key, modifiers),
            AppMode::ConfirmDelete => Self::handle_confirm_delete_mode(app, key),
            AppMode::ExportCsv => Self::handle_filename_input_mode(app, key),
            AppMode::Help => Self::handle_help_mode(app, key),
        }
    }

    fn handle_browse_mode(app: &mut App, key: KeyCode) {
        app.status_message = None;

        match key {
            KeyCode::Up | KeyCode::Char('k') => app.select_previous(),
            KeyCode::Down | KeyCode::Char('j') => app.select_next(),
            KeyCode::Home | KeyCode::Char('g') => app.select_first(),
            KeyCode::End | KeyCode::Char('G') => app.select_last(),
            KeyCode::Char('n') | KeyCode::Char('a') | KeyCode::Enter => app.start_booking(),
            KeyCode::Char('d') | KeyCode::Delete => app.request_delete(),
            KeyCode::Char('e') => app.start_csv_export(),
            KeyCode::Char('r') => {
                app.refresh();
                if app.status_message.is_none() {
                    app.status_message = Some(format!("{} appointments loaded", app.appointments.len()));
                }
            }
            KeyCode::F(1) | KeyCode::Char('?') => app.toggle_help(),
            KeyCode::Char('q') => {
                // Will be handled by main loop
            }
            _ => {}
        }
    }

    fn handle_booking_mode(app: &mut App, key: KeyCode, modifiers: KeyModifiers) {
        if modifiers.contains(KeyModifiers::CONTROL) {
            if let KeyCode::Char('s') = key {
                app.submit_booking();
            }
            return;
        }

        match key {
            KeyCode::Esc => app.cancel_booking(),
            KeyCode::Enter => app.submit_booking(),
            KeyCode::Tab | KeyCode::Down => app.focus_next_field(),
            KeyCode::BackTab | KeyCode::Up => app.focus_previous_field(),
            _ if app.form.focus == FormField::Time => match key {
                KeyCode::Right | KeyCode::Char('l') | KeyCode::Char(' ') | KeyCode::Char('+') => {
                    app.next_time()
                }
                KeyCode::Left | KeyCode::Char('h') | KeyCode::Char('-') => app.previous_time(),
                _ => {}
            },
            KeyCode::Backspace => app.form.backspace(),
            KeyCode::Delete => app.form.delete(),
            KeyCode::Left => app.form.move_left(),
            KeyCode::Right => app.form.move_right(),
            KeyCode::Home => app.form.move_home(),
            KeyCode::End => app.form.move_end(),
            KeyCode::Char(c) => app.form.insert_char(c),
            _ => {}
        }
    }

    fn handle_confirm_delete_mode(app: &mut App, key: KeyCode) {
        match key {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => app.confirm_delete(),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => app.cancel_delete(),
            _ => {}
        }
    }

    fn handle_help_mode(app: &mut App, key: KeyCode) {
        match key {
            KeyCode::Esc | KeyCode::F(1) | KeyCode::Char('?') | KeyCode::Char('q') => {
                app.mode = AppMode::Browse;
            }
            KeyCode::Up | KeyCode::Char('k') => {
                if app.help_scroll > 0 {
                    app.help_scroll -= 1;
                }
            }
            KeyCode::Down | KeyCode::Char('j') => {
                app.help_scroll += 1;
            }
            KeyCode::PageUp => {
                app.help_scroll = app.help_scroll.saturating_sub(5);
            }
            KeyCode::PageDown => {
                app.help_scroll += 5;
            }
            KeyCode::Home => {
                app.help_scroll = 0;
            }
            _ => {}
        }
    }

    fn handle_filename_input_mode(app: &mut App, key: KeyCode) {
        match key {
            KeyCode::Enter => {
                let filename = app.get_csv_export_filename();
                let result = CsvExporter::export_appointments(&app.appointments, &filename);
                app.set_csv_export_result(result);
            }
            KeyCode::Esc => {
                app.cancel_filename_input();
            }
            KeyCode::Backspace => app.filename_backspace(),
            KeyCode::Delete => app.filename_delete(),
            KeyCode::Left => {
                if app.cursor_position > 0 {
                    app.cursor_position -= 1;
                }
            }
            KeyCode::Right => {
                if app.cursor_position < app.filename_input.chars().count() {
                    app.cursor_position += 1;
                }
            }
            KeyCode::Home => {
                app.cursor_position = 0;
            }
            KeyCode::End => {
                app.cursor_position = app.filename_input.chars().count();
            }
            KeyCode::Char(c) => app.filename_insert_char(c),
            _ => {}
        }
    }
}
