//! Booking workflows over an appointment store.
//!
//! This module provides the orchestration between user input and the
//! store: validating a booking request, guarding the slot, listing the
//! agenda in display order and cancelling a chosen appointment.

use chrono::{Days, Local, NaiveDate};
use tracing::{debug, info, warn};

use super::errors::{BookingError, Field, StoreResult, ValidationError};
use super::models::{Agenda, Appointment, BookingRequest, DATE_FORMAT, TimeSlot};
use super::store::AppointmentStore;

/// Orchestrates bookings against a single store.
///
/// The service keeps no copy of the appointment list; every call reads
/// the store again.
///
/// # Examples
///
/// ```
/// use agenda::domain::{BookingRequest, BookingService, TimeSlot};
/// use agenda::infrastructure::MemoryStore;
///
/// let mut service = BookingService::new(MemoryStore::default());
/// let request = BookingRequest {
///     name: "Ana".into(),
///     email: "a@x.com".into(),
///     phone: "555".into(),
///     date: "2024-06-10".into(),
///     time: TimeSlot::H09,
///     description: "checkup".into(),
/// };
///
/// service.submit(&request).unwrap();
/// assert!(service.submit(&request).is_err());
/// assert_eq!(service.agenda().labels(), ["2024-06-10 09:00 - Ana"]);
/// ```
pub struct BookingService<S> {
    store: S,
    window_days: Option<u32>,
}

impl<S: AppointmentStore> BookingService<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            window_days: None,
        }
    }

    /// Only accept dates from today up to `days` days ahead.
    pub fn with_booking_window(mut self, days: u32) -> Self {
        self.window_days = Some(days);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn window_days(&self) -> Option<u32> {
        self.window_days
    }

    /// Validates and books a request, using the local date as "today".
    pub fn submit(&mut self, request: &BookingRequest) -> Result<Appointment, BookingError> {
        self.submit_on(request, Local::now().date_naive())
    }

    /// Validates and books a request as of `today`.
    ///
    /// Blank required fields, bad dates and taken slots are rejected before
    /// anything is written.
    pub fn submit_on(
        &mut self,
        request: &BookingRequest,
        today: NaiveDate,
    ) -> Result<Appointment, BookingError> {
        let appointment = self.validate(request, today)?;

        if !self.store.append_if_free(&appointment)? {
            debug!(slot = %appointment.slot(), "slot already booked");
            return Err(ValidationError::SlotTaken {
                date: appointment.date,
                time: appointment.time,
            }
            .into());
        }

        info!(
            backend = self.store.backend_name(),
            slot = %appointment.slot(),
            "appointment booked"
        );
        Ok(appointment)
    }

    fn validate(
        &self,
        request: &BookingRequest,
        today: NaiveDate,
    ) -> Result<Appointment, ValidationError> {
        for (field, value) in [
            (Field::Name, &request.name),
            (Field::Email, &request.email),
            (Field::Phone, &request.phone),
        ] {
            if value.trim().is_empty() {
                return Err(ValidationError::MissingField(field));
            }
        }

        let date = NaiveDate::parse_from_str(request.date.trim(), DATE_FORMAT)
            .map_err(|_| ValidationError::InvalidDate(request.date.clone()))?;

        if let Some((first, last)) = self.window(today) {
            if date < first || date > last {
                return Err(ValidationError::DateOutOfRange { date, first, last });
            }
        }

        Ok(Appointment {
            name: request.name.trim().to_string(),
            email: request.email.trim().to_string(),
            phone: request.phone.trim().to_string(),
            date,
            time: request.time,
            description: request.description.clone(),
        })
    }

    /// First and last bookable date as of `today`, if a window is set.
    ///
    /// A window reaching past the last representable date is open-ended.
    pub fn window(&self, today: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
        self.window_days.map(|days| {
            let last = today
                .checked_add_days(Days::new(u64::from(days)))
                .unwrap_or(NaiveDate::MAX);
            (today, last)
        })
    }

    /// All appointments sorted by (date, time).
    ///
    /// A backend failure degrades to an empty agenda carrying the error.
    pub fn agenda(&self) -> Agenda {
        match self.store.list_all() {
            Ok(mut appointments) => {
                appointments.sort_by(Appointment::chronological);
                debug!(count = appointments.len(), "agenda loaded");
                Agenda {
                    appointments,
                    error: None,
                }
            }
            Err(err) => {
                warn!(error = %err, "could not read appointments");
                Agenda {
                    appointments: Vec::new(),
                    error: Some(err),
                }
            }
        }
    }

    /// Hours on `date` that nobody has booked yet.
    pub fn free_slots(&self, date: NaiveDate) -> StoreResult<Vec<TimeSlot>> {
        let booked: Vec<TimeSlot> = self
            .store
            .list_all()?
            .into_iter()
            .filter(|a| a.date == date)
            .map(|a| a.time)
            .collect();
        Ok(TimeSlot::ALL
            .into_iter()
            .filter(|slot| !booked.contains(slot))
            .collect())
    }

    /// Removes `appointment` from the store, wherever it sits in storage.
    ///
    /// Returns `Ok(false)` if it was already gone.
    pub fn cancel(&mut self, appointment: &Appointment) -> StoreResult<bool> {
        let removed = self.store.delete_matching(appointment)?;
        if removed {
            info!(
                backend = self.store.backend_name(),
                slot = %appointment.slot(),
                "appointment cancelled"
            );
        } else {
            debug!(slot = %appointment.slot(), "nothing to cancel");
        }
        Ok(removed)
    }

    /// The appointment occupying `date`/`time`, if any.
    pub fn find(&self, date: NaiveDate, time: TimeSlot) -> StoreResult<Option<Appointment>> {
        Ok(self
            .store
            .list_all()?
            .into_iter()
            .find(|a| a.occupies(date, time)))
    }
}
