use crate::domain::{Appointment, AppointmentStore, StoreError, StoreResult};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

const BACKEND: &str = "file";

/// Stores the whole appointment list as a pretty-printed JSON array.
///
/// Every mutation rewrites the file through a temporary sibling that is
/// renamed over the target, and runs under an exclusive lock on
/// `<file>.lock` so that two local processes cannot double-book a slot.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

/// Holds the advisory lock until dropped.
struct StoreLock {
    file: File,
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn directory(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".lock");
        PathBuf::from(name)
    }

    fn lock(&self) -> StoreResult<StoreLock> {
        fs::create_dir_all(self.directory()).map_err(|e| StoreError::unavailable(BACKEND, e))?;
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.lock_path())
            .map_err(|e| StoreError::unavailable(BACKEND, e))?;
        file.lock_exclusive()
            .map_err(|e| StoreError::unavailable(BACKEND, e))?;
        Ok(StoreLock { file })
    }

    fn read(&self) -> StoreResult<Vec<Appointment>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.path)
            .map_err(|e| StoreError::unavailable(BACKEND, format!("{}: {}", self.path.display(), e)))?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str::<Vec<Appointment>>(&content)
            .map_err(|e| StoreError::corrupt(BACKEND, format!("{}: {}", self.path.display(), e)))
    }

    fn write(&self, appointments: &[Appointment]) -> StoreResult<()> {
        let json = serde_json::to_string_pretty(appointments)
            .map_err(|e| StoreError::unavailable(BACKEND, format!("serialization failed: {}", e)))?;

        let mut tmp = NamedTempFile::new_in(self.directory())
            .map_err(|e| StoreError::unavailable(BACKEND, e))?;
        tmp.write_all(json.as_bytes())
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| StoreError::unavailable(BACKEND, e))?;
        tmp.persist(&self.path)
            .map_err(|e| StoreError::unavailable(BACKEND, e.error))?;

        debug!(path = %self.path.display(), count = appointments.len(), "wrote appointments");
        Ok(())
    }
}

impl AppointmentStore for JsonFileStore {
    fn backend_name(&self) -> &'static str {
        BACKEND
    }

    fn list_all(&self) -> StoreResult<Vec<Appointment>> {
        self.read()
    }

    fn append(&mut self, appointment: &Appointment) -> StoreResult<()> {
        let _lock = self.lock()?;
        let mut appointments = self.read()?;
        appointments.push(appointment.clone());
        self.write(&appointments)
    }

    fn delete_at(&mut self, position: usize) -> StoreResult<bool> {
        let _lock = self.lock()?;
        let mut appointments = self.read()?;
        if position >= appointments.len() {
            return Ok(false);
        }
        let removed = appointments.remove(position);
        self.write(&appointments)?;
        info!(slot = %removed.slot(), position, "deleted appointment from file");
        Ok(true)
    }

    fn append_if_free(&mut self, appointment: &Appointment) -> StoreResult<bool> {
        let _lock = self.lock()?;
        let mut appointments = self.read()?;
        if appointments
            .iter()
            .any(|a| a.occupies(appointment.date, appointment.time))
        {
            return Ok(false);
        }
        appointments.push(appointment.clone());
        self.write(&appointments)?;
        Ok(true)
    }

    fn delete_matching(&mut self, appointment: &Appointment) -> StoreResult<bool> {
        let _lock = self.lock()?;
        let mut appointments = self.read()?;
        let Some(position) = appointments.iter().position(|a| a == appointment) else {
            return Ok(false);
        };
        appointments.remove(position);
        self.write(&appointments)?;
        info!(slot = %appointment.slot(), position, "deleted appointment from file");
        Ok(true)
    }
}
