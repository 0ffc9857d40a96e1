//! The appointment store contract.
//!
//! Backends implement the four primitive operations. Slot checks, guarded
//! appends and deletion by record are provided on top of them and may be
//! overridden when a backend can do better.

use chrono::NaiveDate;

use super::errors::StoreResult;
use super::models::{Appointment, TimeSlot};

/// Durable collection of appointments.
///
/// Implementations are stateless beyond the backend's persisted content:
/// every call is one request against the backend and nothing is cached.
pub trait AppointmentStore {
    /// Short backend name used in logs and error messages.
    fn backend_name(&self) -> &'static str;

    /// Every stored appointment, in storage order.
    fn list_all(&self) -> StoreResult<Vec<Appointment>>;

    /// Writes a new record. Performs no validation of its own.
    fn append(&mut self, appointment: &Appointment) -> StoreResult<()>;

    /// Removes the record at `position` in storage order.
    ///
    /// Returns `Ok(false)` without touching the backend's content when
    /// `position` is out of range.
    fn delete_at(&mut self, position: usize) -> StoreResult<bool>;

    fn is_slot_free(&self, date: NaiveDate, time: TimeSlot) -> StoreResult<bool> {
        Ok(!self.list_all()?.iter().any(|a| a.occupies(date, time)))
    }

    /// Appends only when the appointment's slot is still free.
    ///
    /// The default composition is check-then-act and assumes a single
    /// writer. Returns `Ok(false)` when the slot is taken; `append` is not
    /// called in that case.
    fn append_if_free(&mut self, appointment: &Appointment) -> StoreResult<bool> {
        if !self.is_slot_free(appointment.date, appointment.time)? {
            return Ok(false);
        }
        self.append(appointment)?;
        Ok(true)
    }

    /// Deletes the first stored record equal to `appointment`.
    ///
    /// The position is resolved against storage order at call time, so the
    /// caller may hold the record from any sorted or filtered view.
    fn delete_matching(&mut self, appointment: &Appointment) -> StoreResult<bool> {
        match self.list_all()?.iter().position(|a| a == appointment) {
            Some(position) => self.delete_at(position),
            None => Ok(false),
        }
    }
}

impl<S: AppointmentStore + ?Sized> AppointmentStore for Box<S> {
    fn backend_name(&self) -> &'static str {
        (**self).backend_name()
    }

    fn list_all(&self) -> StoreResult<Vec<Appointment>> {
        (**self).list_all()
    }

    fn append(&mut self, appointment: &Appointment) -> StoreResult<()> {
        (**self).append(appointment)
    }

    fn delete_at(&mut self, position: usize) -> StoreResult<bool> {
        (**self).delete_at(position)
    }

    fn is_slot_free(&self, date: NaiveDate, time: TimeSlot) -> StoreResult<bool> {
        (**self).is_slot_free(date, time)
    }

    fn append_if_free(&mut self, appointment: &Appointment) -> StoreResult<bool> {
        (**self).append_if_free(appointment)
    }

    fn delete_matching(&mut self, appointment: &Appointment) -> StoreResult<bool> {
        (**self).delete_matching(appointment)
    }
}
