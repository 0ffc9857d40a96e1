//! Remote spreadsheet backend.
//!
//! Appointments live in six columns (A..F) of one sheet, below a header
//! row. Reads fetch `A2:F`, appends insert a row, deletes remove a row
//! through a `deleteDimension` batch update.

use crate::domain::{Appointment, AppointmentStore, StoreError, StoreResult};
use reqwest::Url;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::config::SheetsConfig;

const BACKEND: &str = "sheets";

/// Raw row access to the sheet holding the appointments.
///
/// Row indices are zero-based over the data rows, i.e. index 0 is the
/// first row after the header.
pub trait SheetTransport {
    fn fetch_rows(&self) -> Result<Vec<Vec<String>>, String>;
    fn append_row(&mut self, row: &[String; 6]) -> Result<(), String>;
    fn delete_row(&mut self, row_index: usize) -> Result<(), String>;
}

/// Talks to the Google Sheets v4 REST API with a bearer token.
pub struct HttpSheetTransport {
    client: Client,
    endpoint: Url,
    spreadsheet_id: String,
    sheet_name: String,
    sheet_id: u32,
    token: String,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

impl HttpSheetTransport {
    pub fn new(config: &SheetsConfig, token: String) -> Result<Self, String> {
        let endpoint = Url::parse(&config.endpoint)
            .map_err(|e| format!("invalid endpoint '{}': {}", config.endpoint, e))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| e.to_string())?;
        Ok(Self {
            client,
            endpoint,
            spreadsheet_id: config.spreadsheet_id.clone(),
            sheet_name: config.sheet_name.clone(),
            sheet_id: config.sheet_id,
            token,
        })
    }

    fn range(&self) -> String {
        format!("{}!A2:F", self.sheet_name)
    }

    fn url(&self, segments: &[&str]) -> Result<Url, String> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| format!("{} cannot be used as a base URL", self.endpoint))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn values_url(&self) -> Result<Url, String> {
        self.url(&["v4", "spreadsheets", &self.spreadsheet_id, "values", &self.range()])
    }

    fn append_url(&self) -> Result<Url, String> {
        let mut url = self.url(&[
            "v4",
            "spreadsheets",
            &self.spreadsheet_id,
            "values",
            &format!("{}:append", self.range()),
        ])?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "RAW")
            .append_pair("insertDataOption", "INSERT_ROWS");
        Ok(url)
    }

    fn batch_update_url(&self) -> Result<Url, String> {
        self.url(&[
            "v4",
            "spreadsheets",
            &format!("{}:batchUpdate", self.spreadsheet_id),
        ])
    }
}

/// Body of a batch update removing one data row. The sheet row is offset
/// by one to skip the header.
pub fn delete_row_request(sheet_id: u32, row_index: usize) -> Value {
    json!({
        "requests": [{
            "deleteDimension": {
                "range": {
                    "sheetId": sheet_id,
                    "dimension": "ROWS",
                    "startIndex": row_index + 1,
                    "endIndex": row_index + 2,
                }
            }
        }]
    })
}

impl SheetTransport for HttpSheetTransport {
    fn fetch_rows(&self) -> Result<Vec<Vec<String>>, String> {
        let range: ValueRange = self
            .client
            .get(self.values_url()?)
            .bearer_auth(&self.token)
            .send()
            .and_then(|response| response.error_for_status())
            .and_then(|response| response.json())
            .map_err(|e| e.to_string())?;
        Ok(range.values)
    }

    fn append_row(&mut self, row: &[String; 6]) -> Result<(), String> {
        self.client
            .post(self.append_url()?)
            .bearer_auth(&self.token)
            .json(&json!({ "values": [row] }))
            .send()
            .and_then(|response| response.error_for_status())
            .map(|_| ())
            .map_err(|e| e.to_string())
    }

    fn delete_row(&mut self, row_index: usize) -> Result<(), String> {
        self.client
            .post(self.batch_update_url()?)
            .bearer_auth(&self.token)
            .json(&delete_row_request(self.sheet_id, row_index))
            .send()
            .and_then(|response| response.error_for_status())
            .map(|_| ())
            .map_err(|e| e.to_string())
    }
}

/// Appointment store over a spreadsheet.
///
/// Rows missing any cell before the description, or whose date or hour
/// cannot be parsed, are skipped when listing. Positions passed to `delete_at`
/// count only the rows that were listed, and are mapped back to the raw
/// row before deleting.
///
/// There is no conditional write on the remote side, so slot checks
/// assume a single writer.
pub struct SheetsStore<T> {
    transport: T,
}

impl<T: SheetTransport> SheetsStore<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Parsed appointments paired with their raw row index.
    fn indexed_rows(&self) -> StoreResult<Vec<(usize, Appointment)>> {
        let rows = self
            .transport
            .fetch_rows()
            .map_err(|e| StoreError::unavailable(BACKEND, e))?;
        debug!(rows = rows.len(), "fetched sheet rows");

        Ok(rows
            .into_iter()
            .enumerate()
            .filter_map(|(index, row)| complete_row(row).map(|row| (index, row)))
            .filter_map(|(index, row)| match Appointment::from_row(&row) {
                Ok(appointment) => Some((index, appointment)),
                Err(reason) => {
                    warn!(row = index + 2, %reason, "skipping unreadable sheet row");
                    None
                }
            })
            .collect())
    }

    fn delete_raw(&mut self, row_index: usize) -> StoreResult<()> {
        self.transport
            .delete_row(row_index)
            .map_err(|e| StoreError::unavailable(BACKEND, e))?;
        info!(row = row_index + 2, "deleted sheet row");
        Ok(())
    }
}

/// The API omits trailing empty cells, so a row with a blank description
/// comes back with five cells. Anything shorter is not an appointment.
fn complete_row(mut row: Vec<String>) -> Option<Vec<String>> {
    match row.len() {
        6 => Some(row),
        5 => {
            row.push(String::new());
            Some(row)
        }
        _ => None,
    }
}

impl<T: SheetTransport> AppointmentStore for SheetsStore<T> {
    fn backend_name(&self) -> &'static str {
        BACKEND
    }

    fn list_all(&self) -> StoreResult<Vec<Appointment>> {
        Ok(self
            .indexed_rows()?
            .into_iter()
            .map(|(_, appointment)| appointment)
            .collect())
    }

    fn append(&mut self, appointment: &Appointment) -> StoreResult<()> {
        self.transport
            .append_row(&appointment.to_row())
            .map_err(|e| StoreError::unavailable(BACKEND, e))
    }

    fn delete_at(&mut self, position: usize) -> StoreResult<bool> {
        let Some((row_index, _)) = self.indexed_rows()?.into_iter().nth(position) else {
            return Ok(false);
        };
        self.delete_raw(row_index)?;
        Ok(true)
    }

    fn delete_matching(&mut self, appointment: &Appointment) -> StoreResult<bool> {
        let found = self
            .indexed_rows()?
            .into_iter()
            .find(|(_, stored)| stored == appointment);
        match found {
            Some((row_index, _)) => {
                self.delete_raw(row_index)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
