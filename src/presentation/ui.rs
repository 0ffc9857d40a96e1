use crate::application::{App, AppMode, FormField};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};

pub fn render_ui(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(f.area());

    render_header(f, app, chunks[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(chunks[1]);

    render_form(f, app, body[0]);
    render_appointments(f, app, body[1]);
    render_status_bar(f, app, chunks[2]);

    match app.mode {
        AppMode::Help => render_help_popup(f, app.help_scroll),
        AppMode::ConfirmDelete => render_confirm_popup(f, app),
        _ => {}
    }
}

fn render_header(f: &mut Frame, app: &App, area: Rect) {
    let header = Paragraph::new(format!(
        "agenda - Appointment Book | Store: {} | {} appointments",
        app.booking.store().backend_name(),
        app.appointments.len()
    ))
    .style(Style::default().fg(Color::Cyan));
    f.render_widget(header, area);
}

fn render_form(f: &mut Frame, app: &App, area: Rect) {
    let editing = app.mode == AppMode::Booking;
    let label_width = FormField::ALL
        .iter()
        .map(|field| field.label().len())
        .max()
        .unwrap_or(0)
        + 2;

    let mut lines = Vec::new();
    let mut cursor = None;

    for (row, field) in FormField::ALL.iter().copied().enumerate() {
        let focused = editing && app.form.focus == field;
        let label_style = if focused {
            Style::default().fg(Color::Black).bg(Color::LightBlue)
        } else {
            Style::default().fg(Color::Yellow)
        };
        let label = Span::styled(format!("{:<width$}", field.label(), width = label_width), label_style);

        let value = match app.form.text(field) {
            Some(text) => {
                if focused {
                    let x = area.x + 1 + label_width as u16 + app.form.cursor_position as u16;
                    let y = area.y + 1 + (row as u16) * 2;
                    cursor = Some((x, y));
                }
                Span::raw(text.to_string())
            }
            None => {
                let time = app.form.time;
                let (availability, color) = if app.is_time_free(time) {
                    ("free", Color::Green)
                } else {
                    ("taken", Color::Red)
                };
                Span::styled(
                    format!("< {} > ({})", time, availability),
                    Style::default().fg(color),
                )
            }
        };

        lines.push(Line::from(vec![label, value]));
        lines.push(Line::from(""));
    }

    let free: Vec<String> = app.free_slots.iter().map(|slot| slot.to_string()).collect();
    lines.push(Line::from(Span::styled(
        if free.is_empty() {
            "No free hours on this date".to_string()
        } else {
            format!("Free: {}", free.join(" "))
        },
        Style::default().fg(Color::DarkGray),
    )));

    if let Some((first, last)) = app.booking.window(app.today()) {
        lines.push(Line::from(Span::styled(
            format!("Bookable: {} to {}", first, last),
            Style::default().fg(Color::DarkGray),
        )));
    }

    let title = if editing {
        "New appointment (Enter: book, Tab: next field, Esc: close)"
    } else {
        "New appointment (n)"
    };
    let border_style = if editing {
        Style::default().fg(Color::Green)
    } else {
        Style::default()
    };

    let form = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(title).border_style(border_style))
        .wrap(Wrap { trim: false });
    f.render_widget(form, area);

    if let Some(position) = cursor {
        f.set_cursor_position(position);
    }
}

fn render_appointments(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title("Scheduled appointments");

    if app.appointments.is_empty() {
        let empty = Paragraph::new("No appointments scheduled.")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        f.render_widget(empty, area);
        return;
    }

    let header = Row::new(["Date", "Time", "Name", "Email", "Phone", "Description"]
        .into_iter()
        .map(|title| Cell::from(title).style(Style::default().fg(Color::Yellow))))
    .height(1);

    let rows = app.appointments.iter().map(|appointment| {
        let [name, email, phone, date, time, description] = appointment.to_row();
        Row::new(vec![
            Cell::from(date),
            Cell::from(time),
            Cell::from(name),
            Cell::from(email),
            Cell::from(phone),
            Cell::from(description),
        ])
        .height(1)
    });

    let widths = [
        Constraint::Length(10),
        Constraint::Length(5),
        Constraint::Min(10),
        Constraint::Min(12),
        Constraint::Length(12),
        Constraint::Min(10),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .column_spacing(1)
        .row_highlight_style(Style::default().bg(Color::Blue).fg(Color::White));

    let mut state = TableState::default().with_selected(Some(app.selected));
    f.render_stateful_widget(table, area, &mut state);
}

fn render_status_bar(f: &mut Frame, app: &App, area: Rect) {
    let input_text = match app.mode {
        AppMode::Browse => {
            if let Some(ref status) = app.status_message {
                status.clone()
            } else {
                "n: new | d: delete | e: export CSV | r: reload | F1/?: help | q: quit".to_string()
            }
        }
        AppMode::Booking => app
            .status_message
            .clone()
            .unwrap_or_else(|| "Fill in the form. On Time, use Left/Right to pick the hour.".to_string()),
        AppMode::ConfirmDelete => "y: delete | n/Esc: keep".to_string(),
        AppMode::ExportCsv => format!("Export CSV as: {} (Enter to export, Esc to cancel)", app.filename_input),
        AppMode::Help => "↑↓/jk: scroll | PgUp/PgDn: fast scroll | Home: top | Esc/q: close help".to_string(),
    };

    let input = Paragraph::new(input_text)
        .block(Block::default().borders(Borders::ALL).title("Status"))
        .style(match app.mode {
            AppMode::Browse => Style::default(),
            AppMode::Booking => Style::default().fg(Color::Green),
            AppMode::ConfirmDelete => Style::default().fg(Color::Red),
            AppMode::ExportCsv => Style::default().fg(Color::Magenta),
            AppMode::Help => Style::default().fg(Color::Cyan),
        });
    f.render_widget(input, area);

    if app.mode == AppMode::ExportCsv {
        let prefix = "Export CSV as: ".chars().count() as u16;
        f.set_cursor_position((area.x + 1 + prefix + app.cursor_position as u16, area.y + 1));
    }
}

fn centered(area: Rect, width_pct: u16, height: u16) -> Rect {
    let width = area.width * width_pct / 100;
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn render_confirm_popup(f: &mut Frame, app: &App) {
    let Some(appointment) = app.selected_appointment() else {
        return;
    };
    let popup_area = centered(f.area(), 60, 5);
    f.render_widget(Clear, popup_area);

    let text = vec![
        Line::from(format!("Delete {}?", appointment.label())),
        Line::from(Span::styled(
            "y: delete   n: keep",
            Style::default().add_modifier(Modifier::BOLD),
        )),
    ];
    let popup = Paragraph::new(text).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Delete appointment")
            .style(Style::default().fg(Color::Red)),
    );
    f.render_widget(popup, popup_area);
}

fn render_help_popup(f: &mut Frame, scroll: usize) {
    let area = f.area();
    let popup_area = Rect {
        x: area.width / 10,
        y: area.height / 10,
        width: area.width * 4 / 5,
        height: area.height * 4 / 5,
    };

    f.render_widget(Clear, popup_area);

    let help_text = get_help_text();
    let help_lines: Vec<&str> = help_text.lines().collect();
    let visible_height = popup_area.height.saturating_sub(2) as usize;

    let start_line = scroll.min(help_lines.len().saturating_sub(visible_height));
    let end_line = (start_line + visible_height).min(help_lines.len());

    let visible_text = help_lines[start_line..end_line].join("\n");

    let help_widget = Paragraph::new(visible_text)
        .block(Block::default()
            .borders(Borders::ALL)
            .title(format!("agenda Help (Line {}/{})", start_line + 1, help_lines.len()))
            .style(Style::default().fg(Color::Cyan)))
        .style(Style::default().fg(Color::White));

    f.render_widget(help_widget, popup_area);
}

fn get_help_text() -> &'static str {
    r#"AGENDA - APPOINTMENT BOOK

=== BOOKING ===
n / a / Enter   Open the booking form
Tab / Down      Next field
Shift+Tab / Up  Previous field
Left / Right    On the Time field: pick the hour (09:00 - 17:00)
Enter / Ctrl+S  Book the appointment
Esc             Close the form (typed input is kept)

Name, email and phone are required.
Each date and hour can be booked only once.
Dates are written as YYYY-MM-DD.

=== APPOINTMENTS ===
Up / Down (k/j) Move the selection
Home / End      First / last appointment
d / Delete      Delete the selected appointment (asks to confirm)
r               Reload appointments from the store
e               Export the list to a CSV file

The list is always sorted by date and time and is reloaded
after every booking or deletion.

=== HELP NAVIGATION ===
↑↓ or j/k       Scroll help text up/down one line
Page Up/Down    Scroll help text up/down 5 lines
Home            Jump to top of help text
Esc/F1/?/q      Close this help window

q               Quit (from the appointment list)"#
}
