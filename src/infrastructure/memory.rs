use crate::domain::{Appointment, AppointmentStore, StoreResult};

/// Process-local store. Contents vanish on exit.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    appointments: Vec<Appointment>,
}

impl MemoryStore {
    pub fn with_appointments(appointments: Vec<Appointment>) -> Self {
        Self { appointments }
    }
}

impl AppointmentStore for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    fn list_all(&self) -> StoreResult<Vec<Appointment>> {
        Ok(self.appointments.clone())
    }

    fn append(&mut self, appointment: &Appointment) -> StoreResult<()> {
        self.appointments.push(appointment.clone());
        Ok(())
    }

    fn delete_at(&mut self, position: usize) -> StoreResult<bool> {
        if position >= self.appointments.len() {
            return Ok(false);
        }
        self.appointments.remove(position);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DATE_FORMAT, TimeSlot};
    use chrono::NaiveDate;

    fn ana() -> Appointment {
        Appointment {
            name: "Ana".to_string(),
            email: "a@x.com".to_string(),
            phone: "555".to_string(),
            date: NaiveDate::parse_from_str("2024-06-10", DATE_FORMAT).unwrap(),
            time: TimeSlot::H09,
            description: "checkup".to_string(),
        }
    }

    #[test]
    fn test_empty_store_scenario() {
        let mut store = MemoryStore::default();
        let date = NaiveDate::parse_from_str("2024-06-10", DATE_FORMAT).unwrap();
        assert!(store.is_slot_free(date, TimeSlot::H09).unwrap());

        store.append(&ana()).unwrap();

        assert_eq!(store.list_all().unwrap(), vec![ana()]);
        assert!(!store.is_slot_free(date, TimeSlot::H09).unwrap());
        assert!(store.is_slot_free(date, TimeSlot::H10).unwrap());
    }

    #[test]
    fn test_delete_out_of_range_is_noop() {
        let mut store = MemoryStore::with_appointments(vec![ana()]);
        assert!(!store.delete_at(1).unwrap());
        assert!(!store.delete_at(usize::MAX).unwrap());
        assert_eq!(store.list_all().unwrap().len(), 1);
    }

    #[test]
    fn test_delete_at_removes_record() {
        let mut other = ana();
        other.time = TimeSlot::H11;
        let mut store = MemoryStore::with_appointments(vec![ana(), other.clone()]);

        assert!(store.delete_at(0).unwrap());
        let remaining = store.list_all().unwrap();
        assert_eq!(remaining, vec![other]);
        assert!(!remaining.contains(&ana()));
    }

    #[test]
    fn test_append_if_free_refuses_taken_slot() {
        let mut store = MemoryStore::default();
        assert!(store.append_if_free(&ana()).unwrap());

        let mut clash = ana();
        clash.name = "Bea".to_string();
        assert!(!store.append_if_free(&clash).unwrap());
        assert_eq!(store.list_all().unwrap().len(), 1);
    }
}
