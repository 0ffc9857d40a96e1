use agenda::domain::{
    Appointment, AppointmentStore, BookingError, BookingRequest, BookingService, DATE_FORMAT,
    TimeSlot, ValidationError,
};
use agenda::infrastructure::{JsonFileStore, MemoryStore};
use chrono::NaiveDate;
use tempfile::tempdir;

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
}

fn ana() -> Appointment {
    Appointment {
        name: "Ana".to_string(),
        email: "a@x.com".to_string(),
        phone: "555".to_string(),
        date: date("2024-06-10"),
        time: TimeSlot::H09,
        description: "checkup".to_string(),
    }
}

fn request(name: &str, day: &str, time: TimeSlot) -> BookingRequest {
    BookingRequest {
        name: name.to_string(),
        email: "x@x.com".to_string(),
        phone: "1".to_string(),
        date: day.to_string(),
        time,
        description: String::new(),
    }
}

/// Runs the single-record scenario against any backend.
fn empty_store_scenario(store: &mut dyn AppointmentStore) {
    assert!(store.list_all().unwrap().is_empty());
    assert!(store.is_slot_free(date("2024-06-10"), TimeSlot::H09).unwrap());

    store.append(&ana()).unwrap();

    assert_eq!(store.list_all().unwrap(), vec![ana()]);
    assert!(!store.is_slot_free(date("2024-06-10"), TimeSlot::H09).unwrap());
    assert!(store.is_slot_free(date("2024-06-10"), TimeSlot::H10).unwrap());
}

#[test]
fn memory_store_scenario() {
    empty_store_scenario(&mut MemoryStore::default());
}

#[test]
fn file_store_scenario() {
    let dir = tempdir().unwrap();
    empty_store_scenario(&mut JsonFileStore::new(dir.path().join("appointments.json")));
}

#[test]
fn delete_beyond_size_is_a_noop() {
    let dir = tempdir().unwrap();
    let mut store = JsonFileStore::new(dir.path().join("appointments.json"));
    store.append(&ana()).unwrap();

    assert_eq!(store.delete_at(1), Ok(false));
    assert_eq!(store.delete_at(100), Ok(false));
    assert_eq!(store.list_all().unwrap(), vec![ana()]);
}

#[test]
fn delete_at_removes_exactly_one_record() {
    let mut store = MemoryStore::default();
    let mut bea = ana();
    bea.name = "Bea".to_string();
    bea.time = TimeSlot::H10;
    store.append(&ana()).unwrap();
    store.append(&bea).unwrap();

    assert_eq!(store.delete_at(0), Ok(true));
    let remaining = store.list_all().unwrap();
    assert_eq!(remaining.len(), 1);
    assert!(!remaining.contains(&ana()));
}

#[test]
fn slot_uniqueness_holds_across_submissions() {
    let dir = tempdir().unwrap();
    let mut service = BookingService::new(JsonFileStore::new(dir.path().join("a.json")));

    let attempts = [
        ("Ana", "2024-06-10", TimeSlot::H09),
        ("Bea", "2024-06-10", TimeSlot::H09),
        ("Cid", "2024-06-10", TimeSlot::H10),
        ("Dan", "2024-06-11", TimeSlot::H09),
        ("Eva", "2024-06-11", TimeSlot::H09),
        ("Fer", "2024-06-10", TimeSlot::H10),
    ];
    let mut rejected = 0;
    for (name, day, time) in attempts {
        match service.submit(&request(name, day, time)) {
            Ok(_) => {}
            Err(BookingError::Validation(ValidationError::SlotTaken { .. })) => rejected += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!(rejected, 3);

    let stored = service.store().list_all().unwrap();
    assert_eq!(stored.len(), 3);
    for (i, a) in stored.iter().enumerate() {
        for b in &stored[i + 1..] {
            assert_ne!(a.slot(), b.slot());
        }
    }
}

#[test]
fn cancel_from_sorted_view_survives_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("a.json");
    let mut service = BookingService::new(JsonFileStore::new(&path));
    service
        .submit(&request("Late", "2024-06-20", TimeSlot::H16))
        .unwrap();
    service
        .submit(&request("Early", "2024-06-03", TimeSlot::H09))
        .unwrap();
    service
        .submit(&request("Middle", "2024-06-10", TimeSlot::H12))
        .unwrap();

    let displayed = service.agenda().appointments;
    assert_eq!(displayed[0].name, "Early");
    assert!(service.cancel(&displayed[0]).unwrap());

    let reopened = BookingService::new(JsonFileStore::new(&path));
    assert_eq!(
        reopened.agenda().labels(),
        ["2024-06-10 12:00 - Middle", "2024-06-20 16:00 - Late"]
    );
}
