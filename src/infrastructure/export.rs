use crate::domain::Appointment;
use std::io::Write;

pub const CSV_HEADER: [&str; 6] = ["name", "email", "phone", "date", "time", "description"];

pub struct CsvExporter;

impl CsvExporter {
    /// Writes the appointments, in the given order, to `filename`.
    pub fn export_appointments(appointments: &[Appointment], filename: &str) -> Result<String, String> {
        let writer = csv::Writer::from_path(filename).map_err(|e| e.to_string())?;
        Self::write_appointments(writer, appointments)?;
        Ok(filename.to_string())
    }

    pub fn write_appointments<W: Write>(
        mut writer: csv::Writer<W>,
        appointments: &[Appointment],
    ) -> Result<(), String> {
        writer.write_record(CSV_HEADER).map_err(|e| e.to_string())?;
        for appointment in appointments {
            writer
                .write_record(appointment.to_row())
                .map_err(|e| e.to_string())?;
        }
        writer.flush().map_err(|e| e.to_string())
    }
}
