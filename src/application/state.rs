//! Application state management for the terminal appointment book.
//!
//! This module contains the main application state, the booking form and
//! mode management for the terminal user interface.

use crate::domain::{
    Appointment, AppointmentStore, BookingRequest, BookingService, DATE_FORMAT, TimeSlot,
};
use crate::infrastructure::MemoryStore;
use chrono::{Local, NaiveDate};

/// Represents the current mode of the application.
///
/// The mode determines how keyboard input is interpreted and which
/// overlays are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    /// Browsing the appointment list
    Browse,
    /// Filling in the booking form
    Booking,
    /// Waiting for the user to confirm a deletion
    ConfirmDelete,
    /// CSV export dialog is open
    ExportCsv,
    /// Help screen is displayed
    Help,
}

/// Input fields of the booking form, in tab order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Name,
    Email,
    Phone,
    Date,
    Time,
    Description,
}

impl FormField {
    pub const ALL: [FormField; 6] = [
        FormField::Name,
        FormField::Email,
        FormField::Phone,
        FormField::Date,
        FormField::Time,
        FormField::Description,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FormField::Name => "Full name",
            FormField::Email => "Email",
            FormField::Phone => "Phone",
            FormField::Date => "Date (YYYY-MM-DD)",
            FormField::Time => "Time",
            FormField::Description => "Description",
        }
    }

    fn position(self) -> usize {
        Self::ALL.iter().position(|f| *f == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.position() + 1) % Self::ALL.len()]
    }

    pub fn previous(self) -> Self {
        Self::ALL[(self.position() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Byte offset of the `char_index`-th character of `text`.
fn byte_offset(text: &str, char_index: usize) -> usize {
    text.char_indices()
        .nth(char_index)
        .map(|(offset, _)| offset)
        .unwrap_or(text.len())
}

/// Contents of the booking form.
///
/// The cursor counts characters, not bytes, so names with accents edit
/// correctly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub date: String,
    pub time: TimeSlot,
    pub description: String,
    /// Field that receives keystrokes
    pub focus: FormField,
    /// Cursor position within the focused text field
    pub cursor_position: usize,
}

impl BookingForm {
    /// Creates an empty form with the date preset to `today`.
    pub fn new(today: NaiveDate) -> Self {
        Self {
            name: String::new(),
            email: String::new(),
            phone: String::new(),
            date: today.format(DATE_FORMAT).to_string(),
            time: TimeSlot::default(),
            description: String::new(),
            focus: FormField::Name,
            cursor_position: 0,
        }
    }

    pub fn text(&self, field: FormField) -> Option<&str> {
        match field {
            FormField::Name => Some(&self.name),
            FormField::Email => Some(&self.email),
            FormField::Phone => Some(&self.phone),
            FormField::Date => Some(&self.date),
            FormField::Description => Some(&self.description),
            FormField::Time => None,
        }
    }

    fn focused_text_mut(&mut self) -> Option<&mut String> {
        match self.focus {
            FormField::Name => Some(&mut self.name),
            FormField::Email => Some(&mut self.email),
            FormField::Phone => Some(&mut self.phone),
            FormField::Date => Some(&mut self.date),
            FormField::Description => Some(&mut self.description),
            FormField::Time => None,
        }
    }

    fn focused_len(&self) -> usize {
        self.text(self.focus).map(|t| t.chars().count()).unwrap_or(0)
    }

    /// Moves focus to `field` and places the cursor at the end of its text.
    pub fn focus(&mut self, field: FormField) {
        self.focus = field;
        self.cursor_position = self.focused_len();
    }

    pub fn focus_next(&mut self) {
        self.focus(self.focus.next());
    }

    pub fn focus_previous(&mut self) {
        self.focus(self.focus.previous());
    }

    pub fn insert_char(&mut self, c: char) {
        let cursor = self.cursor_position;
        if let Some(text) = self.focused_text_mut() {
            let offset = byte_offset(text, cursor);
            text.insert(offset, c);
            self.cursor_position += 1;
        }
    }

    pub fn backspace(&mut self) {
        if self.cursor_position == 0 {
            return;
        }
        let cursor = self.cursor_position;
        if let Some(text) = self.focused_text_mut() {
            let offset = byte_offset(text, cursor - 1);
            text.remove(offset);
            self.cursor_position -= 1;
        }
    }

    pub fn delete(&mut self) {
        let cursor = self.cursor_position;
        if let Some(text) = self.focused_text_mut() {
            if cursor < text.chars().count() {
                let offset = byte_offset(text, cursor);
                text.remove(offset);
            }
        }
    }

    pub fn move_left(&mut self) {
        self.cursor_position = self.cursor_position.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        if self.cursor_position < self.focused_len() {
            self.cursor_position += 1;
        }
    }

    pub fn move_home(&mut self) {
        self.cursor_position = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor_position = self.focused_len();
    }

    /// Snapshot of the form as an unvalidated booking request.
    pub fn to_request(&self) -> BookingRequest {
        BookingRequest {
            name: self.name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            date: self.date.clone(),
            time: self.time,
            description: self.description.clone(),
        }
    }

    /// The form's date, if it currently parses.
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.date.trim(), DATE_FORMAT).ok()
    }
}

/// Main application state containing the booking service and UI state.
///
/// The appointment list held here is only the current display copy. It is
/// re-read from the store after every mutation and never written back.
///
/// # Examples
///
/// ```
/// use agenda::application::{App, AppMode};
///
/// let app = App::default();
/// assert_eq!(app.mode, AppMode::Browse);
/// assert!(app.appointments.is_empty());
/// ```
pub struct App {
    /// Booking workflows over the configured store
    pub booking: BookingService<Box<dyn AppointmentStore>>,
    /// Appointments in display order, as of the last refresh
    pub appointments: Vec<Appointment>,
    /// Index of the highlighted appointment in `appointments`
    pub selected: usize,
    /// Current application mode
    pub mode: AppMode,
    /// Booking form contents
    pub form: BookingForm,
    /// Hours still free on the form's date
    pub free_slots: Vec<TimeSlot>,
    /// Temporary status message to display
    pub status_message: Option<String>,
    /// Input buffer for filename entry
    pub filename_input: String,
    /// Cursor position within the filename input
    pub cursor_position: usize,
    /// Scroll position in help text
    pub help_scroll: usize,
    /// Date the form's date field was preset to
    form_day: NaiveDate,
    /// Source of the current date, read on every booking
    clock: Box<dyn Fn() -> NaiveDate>,
}

impl Default for App {
    fn default() -> Self {
        Self::new(BookingService::new(Box::new(MemoryStore::default())))
    }
}

impl App {
    /// Creates the application state and loads the current agenda.
    pub fn new(booking: BookingService<Box<dyn AppointmentStore>>) -> Self {
        let today = Local::now().date_naive();
        let mut app = Self {
            booking,
            appointments: Vec::new(),
            selected: 0,
            mode: AppMode::Browse,
            form: BookingForm::new(today),
            free_slots: TimeSlot::ALL.to_vec(),
            status_message: None,
            filename_input: String::new(),
            cursor_position: 0,
            help_scroll: 0,
            form_day: today,
            clock: Box::new(|| Local::now().date_naive()),
        };
        app.refresh();
        app
    }

    /// Replaces the local clock, resetting the form to the clock's date.
    pub fn with_clock(mut self, clock: impl Fn() -> NaiveDate + 'static) -> Self {
        self.clock = Box::new(clock);
        self.reset_form();
        self
    }

    /// The current date, used for the form default and the booking window.
    pub fn today(&self) -> NaiveDate {
        (self.clock)()
    }

    fn reset_form(&mut self) {
        self.form_day = self.today();
        self.form = BookingForm::new(self.form_day);
    }

    /// Re-reads the agenda from the store.
    ///
    /// A read failure leaves an empty list and reports the error in the
    /// status bar.
    pub fn refresh(&mut self) {
        let agenda = self.booking.agenda();
        if let Some(err) = agenda.error {
            self.status_message = Some(format!("Could not load appointments: {}", err));
        }
        self.appointments = agenda.appointments;
        if self.selected >= self.appointments.len() {
            self.selected = self.appointments.len().saturating_sub(1);
        }
    }

    pub fn selected_appointment(&self) -> Option<&Appointment> {
        self.appointments.get(self.selected)
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.appointments.len() {
            self.selected += 1;
        }
    }

    pub fn select_previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn select_first(&mut self) {
        self.selected = 0;
    }

    pub fn select_last(&mut self) {
        self.selected = self.appointments.len().saturating_sub(1);
    }

    /// Opens the booking form, keeping any half-typed input.
    ///
    /// An untouched form whose date was preset on an earlier day is reset
    /// to today.
    pub fn start_booking(&mut self) {
        if self.today() != self.form_day
            && self.form.to_request() == BookingForm::new(self.form_day).to_request()
        {
            self.reset_form();
        }
        self.mode = AppMode::Booking;
        self.form.focus(self.form.focus);
        self.status_message = None;
        self.refresh_free_slots();
    }

    /// Leaves the form without submitting.
    pub fn cancel_booking(&mut self) {
        self.mode = AppMode::Browse;
    }

    /// Recomputes which hours are free on the form's date.
    ///
    /// An unparsable date or unreachable store shows every hour; the
    /// submission itself still checks the slot.
    pub fn refresh_free_slots(&mut self) {
        self.free_slots = match self.form.parsed_date() {
            Some(date) => self
                .booking
                .free_slots(date)
                .unwrap_or_else(|_| TimeSlot::ALL.to_vec()),
            None => TimeSlot::ALL.to_vec(),
        };
    }

    pub fn is_time_free(&self, time: TimeSlot) -> bool {
        self.free_slots.contains(&time)
    }

    pub fn next_time(&mut self) {
        self.form.time = self.form.time.next();
    }

    pub fn previous_time(&mut self) {
        self.form.time = self.form.time.previous();
    }

    /// Moves form focus and refreshes availability when leaving the date.
    pub fn focus_next_field(&mut self) {
        let leaving_date = self.form.focus == FormField::Date;
        self.form.focus_next();
        if leaving_date {
            self.refresh_free_slots();
        }
    }

    pub fn focus_previous_field(&mut self) {
        let leaving_date = self.form.focus == FormField::Date;
        self.form.focus_previous();
        if leaving_date {
            self.refresh_free_slots();
        }
    }

    /// Submits the form.
    ///
    /// On success the form is cleared, the agenda is reloaded and the new
    /// appointment is highlighted. On failure the form stays open with the
    /// reason in the status bar.
    pub fn submit_booking(&mut self) {
        match self.booking.submit_on(&self.form.to_request(), self.today()) {
            Ok(appointment) => {
                self.status_message = Some(format!("Booked {}", appointment.label()));
                self.reset_form();
                self.mode = AppMode::Browse;
                self.refresh();
                if let Some(index) = self.appointments.iter().position(|a| *a == appointment) {
                    self.selected = index;
                }
            }
            Err(err) => {
                self.status_message = Some(format!("Booking failed: {}", err));
                self.refresh_free_slots();
            }
        }
    }

    /// Asks for confirmation before deleting the highlighted appointment.
    pub fn request_delete(&mut self) {
        if self.selected_appointment().is_some() {
            self.mode = AppMode::ConfirmDelete;
            self.status_message = None;
        } else {
            self.status_message = Some("No appointment selected".to_string());
        }
    }

    pub fn cancel_delete(&mut self) {
        self.mode = AppMode::Browse;
    }

    /// Deletes the highlighted appointment and reloads the agenda.
    pub fn confirm_delete(&mut self) {
        if let Some(appointment) = self.selected_appointment().cloned() {
            self.status_message = Some(match self.booking.cancel(&appointment) {
                Ok(true) => format!("Deleted {}", appointment.label()),
                Ok(false) => format!("{} was already removed", appointment.label()),
                Err(err) => format!("Delete failed: {}", err),
            });
        }
        self.mode = AppMode::Browse;
        self.refresh();
    }

    /// Switches to CSV export mode to prompt for a filename.
    pub fn start_csv_export(&mut self) {
        self.mode = AppMode::ExportCsv;
        self.filename_input = "appointments.csv".to_string();
        self.cursor_position = self.filename_input.chars().count();
        self.status_message = None;
    }

    /// Gets the filename to use for CSV export.
    ///
    /// Returns the filename input if not empty, otherwise a default name.
    pub fn get_csv_export_filename(&self) -> String {
        if self.filename_input.trim().is_empty() {
            "appointments.csv".to_string()
        } else {
            self.filename_input.trim().to_string()
        }
    }

    /// Processes the result of a CSV export operation.
    ///
    /// # Arguments
    ///
    /// * `result` - Result of the export (filename or error message)
    pub fn set_csv_export_result(&mut self, result: Result<String, String>) {
        self.status_message = Some(match result {
            Ok(filename) => format!("Exported {} appointments to {}", self.appointments.len(), filename),
            Err(error) => format!("Export failed: {}", error),
        });
        self.mode = AppMode::Browse;
        self.filename_input.clear();
        self.cursor_position = 0;
    }

    /// Cancels filename input and returns to browse mode.
    pub fn cancel_filename_input(&mut self) {
        self.mode = AppMode::Browse;
        self.filename_input.clear();
        self.cursor_position = 0;
    }

    pub fn filename_insert_char(&mut self, c: char) {
        let offset = byte_offset(&self.filename_input, self.cursor_position);
        self.filename_input.insert(offset, c);
        self.cursor_position += 1;
    }

    pub fn filename_backspace(&mut self) {
        if self.cursor_position > 0 {
            let offset = byte_offset(&self.filename_input, self.cursor_position - 1);
            self.filename_input.remove(offset);
            self.cursor_position -= 1;
        }
    }

    pub fn filename_delete(&mut self) {
        if self.cursor_position < self.filename_input.chars().count() {
            let offset = byte_offset(&self.filename_input, self.cursor_position);
            self.filename_input.remove(offset);
        }
    }

    pub fn toggle_help(&mut self) {
        self.mode = if self.mode == AppMode::Help {
            AppMode::Browse
        } else {
            self.help_scroll = 0;
            AppMode::Help
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    fn fill_form(app: &mut App, name: &str, day: &str, time: TimeSlot) {
        app.form.name = name.to_string();
        app.form.email = "a@x.com".to_string();
        app.form.phone = "555".to_string();
        app.form.date = day.to_string();
        app.form.time = time;
    }

    fn app_on(day: &str) -> App {
        let today = date(day);
        App::default().with_clock(move || today)
    }

    #[test]
    fn test_app_default() {
        let app = App::default();
        assert_eq!(app.mode, AppMode::Browse);
        assert!(app.appointments.is_empty());
        assert_eq!(app.selected, 0);
        assert!(app.status_message.is_none());
        assert_eq!(app.form.date, app.today().format(DATE_FORMAT).to_string());
        assert_eq!(app.free_slots.len(), 9);
    }

    #[test]
    fn test_form_editing_handles_multibyte_text() {
        let mut form = BookingForm::new(date("2024-06-10"));
        for c in "José".chars() {
            form.insert_char(c);
        }
        assert_eq!(form.name, "José");
        assert_eq!(form.cursor_position, 4);

        form.move_left();
        form.backspace();
        assert_eq!(form.name, "Joé");
        form.move_home();
        form.delete();
        assert_eq!(form.name, "oé");
        form.move_end();
        form.insert_char('!');
        assert_eq!(form.name, "oé!");
    }

    #[test]
    fn test_form_focus_cycles_and_time_takes_no_text() {
        let mut form = BookingForm::new(date("2024-06-10"));
        form.focus(FormField::Time);
        form.insert_char('x');
        assert_eq!(form.to_request().time, TimeSlot::H09);
        assert_eq!(form.cursor_position, 0);

        form.focus_next();
        assert_eq!(form.focus, FormField::Description);
        form.focus_next();
        assert_eq!(form.focus, FormField::Name);
        form.focus_previous();
        assert_eq!(form.focus, FormField::Description);

        form.focus(FormField::Date);
        assert_eq!(form.cursor_position, 10);
    }

    #[test]
    fn test_submit_booking_success() {
        let mut app = app_on("2024-06-01");
        app.start_booking();
        fill_form(&mut app, "Ana", "2024-06-10", TimeSlot::H09);

        app.submit_booking();

        assert_eq!(app.mode, AppMode::Browse);
        assert_eq!(app.appointments.len(), 1);
        assert_eq!(app.selected_appointment().unwrap().name, "Ana");
        assert!(app.form.name.is_empty());
        assert!(app.status_message.as_ref().unwrap().starts_with("Booked"));
    }

    #[test]
    fn test_submit_booking_with_missing_field_keeps_form() {
        let mut app = app_on("2024-06-01");
        app.start_booking();
        fill_form(&mut app, "Ana", "2024-06-10", TimeSlot::H09);
        app.form.phone.clear();

        app.submit_booking();

        assert_eq!(app.mode, AppMode::Booking);
        assert!(app.appointments.is_empty());
        assert_eq!(app.form.name, "Ana");
        assert!(app.status_message.as_ref().unwrap().contains("phone"));
    }

    #[test]
    fn test_taken_slot_is_reported() {
        let mut app = app_on("2024-06-01");
        fill_form(&mut app, "Ana", "2024-06-10", TimeSlot::H09);
        app.submit_booking();

        app.start_booking();
        fill_form(&mut app, "Bea", "2024-06-10", TimeSlot::H09);
        app.submit_booking();

        assert_eq!(app.mode, AppMode::Booking);
        assert_eq!(app.appointments.len(), 1);
        assert!(app.status_message.as_ref().unwrap().contains("already booked"));
        assert!(!app.is_time_free(TimeSlot::H09));
        assert!(app.is_time_free(TimeSlot::H10));
    }

    #[test]
    fn test_free_slots_refresh_when_leaving_date() {
        let mut app = app_on("2024-06-01");
        fill_form(&mut app, "Ana", "2024-06-10", TimeSlot::H12);
        app.submit_booking();

        app.start_booking();
        app.form.focus(FormField::Date);
        app.form.date = "2024-06-10".to_string();
        app.focus_next_field();

        assert_eq!(app.form.focus, FormField::Time);
        assert!(!app.is_time_free(TimeSlot::H12));
        assert_eq!(app.free_slots.len(), 8);
    }

    #[test]
    fn test_delete_uses_displayed_record() {
        let mut app = app_on("2024-06-01");
        fill_form(&mut app, "Late", "2024-06-20", TimeSlot::H09);
        app.submit_booking();
        fill_form(&mut app, "Early", "2024-06-05", TimeSlot::H09);
        app.submit_booking();

        app.select_first();
        assert_eq!(app.selected_appointment().unwrap().name, "Early");

        app.request_delete();
        assert_eq!(app.mode, AppMode::ConfirmDelete);
        app.confirm_delete();

        assert_eq!(app.mode, AppMode::Browse);
        let names: Vec<_> = app.appointments.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["Late"]);
    }

    #[test]
    fn test_delete_with_nothing_selected() {
        let mut app = App::default();
        app.request_delete();
        assert_eq!(app.mode, AppMode::Browse);
        assert_eq!(app.status_message.as_deref(), Some("No appointment selected"));
    }

    #[test]
    fn test_selection_is_clamped() {
        let mut app = app_on("2024-06-01");
        fill_form(&mut app, "Ana", "2024-06-10", TimeSlot::H09);
        app.submit_booking();
        fill_form(&mut app, "Bea", "2024-06-11", TimeSlot::H09);
        app.submit_booking();

        app.select_last();
        assert_eq!(app.selected, 1);
        app.select_next();
        assert_eq!(app.selected, 1);

        app.request_delete();
        app.confirm_delete();
        assert_eq!(app.selected, 0);
        app.select_previous();
        assert_eq!(app.selected, 0);
    }

    #[test]
    fn test_csv_export_filename() {
        let mut app = App::default();
        app.start_csv_export();
        assert_eq!(app.mode, AppMode::ExportCsv);
        assert_eq!(app.get_csv_export_filename(), "appointments.csv");

        app.filename_input.clear();
        assert_eq!(app.get_csv_export_filename(), "appointments.csv");

        app.set_csv_export_result(Err("disk full".to_string()));
        assert_eq!(app.mode, AppMode::Browse);
        assert_eq!(app.status_message.as_deref(), Some("Export failed: disk full"));
    }

    #[test]
    fn test_toggle_help() {
        let mut app = App::default();
        app.help_scroll = 4;
        app.toggle_help();
        assert_eq!(app.mode, AppMode::Help);
        assert_eq!(app.help_scroll, 0);
        app.toggle_help();
        assert_eq!(app.mode, AppMode::Browse);
    }

    #[test]
    fn test_session_follows_the_clock_past_midnight() {
        use std::cell::Cell;
        use std::rc::Rc;

        let day = Rc::new(Cell::new(date("2024-06-01")));
        let clock = Rc::clone(&day);
        let booking = BookingService::new(Box::new(MemoryStore::default()) as Box<dyn AppointmentStore>)
            .with_booking_window(30);
        let mut app = App::new(booking).with_clock(move || clock.get());
        assert_eq!(app.form.date, "2024-06-01");

        fill_form(&mut app, "Ana", "2024-07-02", TimeSlot::H09);
        app.submit_booking();
        assert!(app.appointments.is_empty());
        assert!(app.status_message.as_ref().unwrap().starts_with("Booking failed"));

        day.set(date("2024-06-02"));
        app.submit_booking();
        assert_eq!(app.appointments.len(), 1);
        assert_eq!(app.form.date, "2024-06-02");

        day.set(date("2024-06-03"));
        app.start_booking();
        assert_eq!(app.form.date, "2024-06-03");
    }

    #[test]
    fn test_typed_form_is_kept_across_midnight() {
        use std::cell::Cell;
        use std::rc::Rc;

        let day = Rc::new(Cell::new(date("2024-06-01")));
        let clock = Rc::clone(&day);
        let mut app = App::default().with_clock(move || clock.get());
        app.start_booking();
        app.form.name = "Ana".to_string();
        app.cancel_booking();

        day.set(date("2024-06-02"));
        app.start_booking();
        assert_eq!(app.form.name, "Ana");
        assert_eq!(app.form.date, "2024-06-01");
    }
}
