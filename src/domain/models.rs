use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Date format used everywhere a date crosses a text boundary.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// One of the bookable hours of the day, 09:00 through 17:00.
///
/// # Examples
///
/// ```
/// use agenda::domain::TimeSlot;
///
/// let slot: TimeSlot = "09:00".parse().unwrap();
/// assert_eq!(slot, TimeSlot::H09);
/// assert_eq!(slot.to_string(), "09:00");
/// assert_eq!(TimeSlot::ALL.len(), 9);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TimeSlot {
    #[default]
    H09,
    H10,
    H11,
    H12,
    H13,
    H14,
    H15,
    H16,
    H17,
}

impl TimeSlot {
    pub const ALL: [TimeSlot; 9] = [
        TimeSlot::H09,
        TimeSlot::H10,
        TimeSlot::H11,
        TimeSlot::H12,
        TimeSlot::H13,
        TimeSlot::H14,
        TimeSlot::H15,
        TimeSlot::H16,
        TimeSlot::H17,
    ];

    pub fn hour(self) -> u32 {
        match self {
            TimeSlot::H09 => 9,
            TimeSlot::H10 => 10,
            TimeSlot::H11 => 11,
            TimeSlot::H12 => 12,
            TimeSlot::H13 => 13,
            TimeSlot::H14 => 14,
            TimeSlot::H15 => 15,
            TimeSlot::H16 => 16,
            TimeSlot::H17 => 17,
        }
    }

    pub fn from_hour(hour: u32) -> Option<Self> {
        Self::ALL.iter().copied().find(|slot| slot.hour() == hour)
    }

    pub fn index(self) -> usize {
        (self.hour() - 9) as usize
    }

    /// Next slot, wrapping from 17:00 back to 09:00.
    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    /// Previous slot, wrapping from 09:00 to 17:00.
    pub fn previous(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:00", self.hour())
    }
}

impl FromStr for TimeSlot {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (hour, minutes) = trimmed
            .split_once(':')
            .ok_or_else(|| format!("expected HH:00, got '{}'", trimmed))?;
        if minutes != "00" {
            return Err(format!("slots start on the hour, got '{}'", trimmed));
        }
        let hour: u32 = hour
            .parse()
            .map_err(|_| format!("invalid hour in '{}'", trimmed))?;
        Self::from_hour(hour).ok_or_else(|| format!("{} is outside 09:00-17:00", trimmed))
    }
}

impl TryFrom<String> for TimeSlot {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeSlot> for String {
    fn from(slot: TimeSlot) -> Self {
        slot.to_string()
    }
}

/// A bookable unit: one hour on one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Slot {
    pub date: NaiveDate,
    pub time: TimeSlot,
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.date.format(DATE_FORMAT), self.time)
    }
}

/// A booked appointment. Field order matches the six storage columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub date: NaiveDate,
    pub time: TimeSlot,
    #[serde(default)]
    pub description: String,
}

impl Appointment {
    pub fn slot(&self) -> Slot {
        Slot {
            date: self.date,
            time: self.time,
        }
    }

    pub fn occupies(&self, date: NaiveDate, time: TimeSlot) -> bool {
        self.date == date && self.time == time
    }

    /// Label shown when picking an appointment from a list.
    pub fn label(&self) -> String {
        format!("{} - {}", self.slot(), self.name)
    }

    /// The six column values in storage order.
    pub fn to_row(&self) -> [String; 6] {
        [
            self.name.clone(),
            self.email.clone(),
            self.phone.clone(),
            self.date.format(DATE_FORMAT).to_string(),
            self.time.to_string(),
            self.description.clone(),
        ]
    }

    /// Rebuilds an appointment from six column values.
    pub fn from_row(row: &[String]) -> Result<Self, String> {
        let [name, email, phone, date, time, description] = row else {
            return Err(format!("expected 6 columns, got {}", row.len()));
        };
        let date = NaiveDate::parse_from_str(date.trim(), DATE_FORMAT)
            .map_err(|e| format!("invalid date '{}': {}", date, e))?;
        Ok(Self {
            name: name.clone(),
            email: email.clone(),
            phone: phone.clone(),
            date,
            time: time.parse()?,
            description: description.clone(),
        })
    }

    /// Orders by (date, time), the order appointments are displayed in.
    pub fn chronological(a: &Appointment, b: &Appointment) -> Ordering {
        a.slot().cmp(&b.slot())
    }
}

/// Unvalidated input collected by a booking form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookingRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub date: String,
    pub time: TimeSlot,
    pub description: String,
}

/// Appointments sorted for display, plus the error that cut the listing
/// short if the backend could not be read.
#[derive(Debug, Default)]
pub struct Agenda {
    pub appointments: Vec<Appointment>,
    pub error: Option<super::errors::StoreError>,
}

impl Agenda {
    pub fn is_empty(&self) -> bool {
        self.appointments.is_empty()
    }

    pub fn labels(&self) -> Vec<String> {
        self.appointments.iter().map(Appointment::label).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn appointment(date: &str, time: TimeSlot, name: &str) -> Appointment {
        Appointment {
            name: name.to_string(),
            email: "a@x.com".to_string(),
            phone: "555".to_string(),
            date: NaiveDate::parse_from_str(date, DATE_FORMAT).unwrap(),
            time,
            description: String::new(),
        }
    }

    #[test]
    fn test_time_slot_parsing() {
        assert_eq!("17:00".parse::<TimeSlot>(), Ok(TimeSlot::H17));
        assert_eq!(" 10:00 ".parse::<TimeSlot>(), Ok(TimeSlot::H10));
        assert!("08:00".parse::<TimeSlot>().is_err());
        assert!("18:00".parse::<TimeSlot>().is_err());
        assert!("09:30".parse::<TimeSlot>().is_err());
        assert!("nine".parse::<TimeSlot>().is_err());
    }

    #[test]
    fn test_time_slot_wraps() {
        assert_eq!(TimeSlot::H17.next(), TimeSlot::H09);
        assert_eq!(TimeSlot::H09.previous(), TimeSlot::H17);
        assert_eq!(TimeSlot::H12.next(), TimeSlot::H13);
    }

    #[test]
    fn test_label_format() {
        let a = appointment("2024-06-10", TimeSlot::H09, "Ana");
        assert_eq!(a.label(), "2024-06-10 09:00 - Ana");
    }

    #[test]
    fn test_serializes_as_six_text_fields() {
        let a = appointment("2024-06-10", TimeSlot::H14, "Ana");
        let json = serde_json::to_value(&a).unwrap();
        assert_eq!(json["date"], "2024-06-10");
        assert_eq!(json["time"], "14:00");

        let back: Appointment = serde_json::from_value(json).unwrap();
        assert_eq!(back, a);
    }

    #[test]
    fn test_rejects_unknown_slot_in_json() {
        let json = r#"{"name":"A","email":"e","phone":"p","date":"2024-06-10","time":"20:00","description":""}"#;
        assert!(serde_json::from_str::<Appointment>(json).is_err());
    }

    #[test]
    fn test_from_row_requires_six_columns() {
        let row: Vec<String> = vec!["Ana".into(), "a@x.com".into()];
        assert!(Appointment::from_row(&row).is_err());

        let a = appointment("2024-06-10", TimeSlot::H11, "Ana");
        assert_eq!(Appointment::from_row(&a.to_row()), Ok(a));
    }

    #[test]
    fn test_chronological_order() {
        let mut list = vec![
            appointment("2024-06-11", TimeSlot::H09, "C"),
            appointment("2024-06-10", TimeSlot::H15, "B"),
            appointment("2024-06-10", TimeSlot::H10, "A"),
        ];
        list.sort_by(Appointment::chronological);
        let names: Vec<_> = list.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["A", "B", "C"]);
    }
}
