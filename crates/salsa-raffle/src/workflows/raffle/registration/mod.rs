mod history;
mod members;
mod normalizer;
mod parser;

pub use history::PreviousCycle;
pub use members::MemberRegistry;

use crate::workflows::raffle::domain::{LevelCatalog, Registrant, ValidationError};
use chrono::NaiveDateTime;
use parser::NormalizeContext;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug)]
pub enum RegistrationImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    Validation(ValidationError),
}

impl std::fmt::Display for RegistrationImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistrationImportError::Io(err) => {
                write!(f, "failed to read registration export: {}", err)
            }
            RegistrationImportError::Csv(err) => write!(f, "invalid registration CSV data: {}", err),
            RegistrationImportError::Validation(err) => {
                write!(f, "invalid registration: {}", err)
            }
        }
    }
}

impl std::error::Error for RegistrationImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RegistrationImportError::Io(err) => Some(err),
            RegistrationImportError::Csv(err) => Some(err),
            RegistrationImportError::Validation(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for RegistrationImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for RegistrationImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

impl From<ValidationError> for RegistrationImportError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err)
    }
}

/// Parse a raffle cutoff given on the command line, in config or over HTTP.
pub fn parse_cutoff(raw: &str) -> Result<NaiveDateTime, String> {
    normalizer::parse_timestamp(raw).ok_or_else(|| {
        format!("failed to parse '{raw}' as a cutoff (expected YYYY-MM-DD HH:MM:SS or RFC 3339)")
    })
}

/// Turns a sign-up form export into validated registrants, in row order.
///
/// When a handle registers more than once only the last submission is kept,
/// at the position of that last row.
pub struct RegistrationImporter<'a> {
    catalog: &'a LevelCatalog,
    cutoff: Option<NaiveDateTime>,
    previous: Option<PreviousCycle>,
    members: Option<MemberRegistry>,
}

impl<'a> RegistrationImporter<'a> {
    pub fn new(catalog: &'a LevelCatalog) -> Self {
        Self {
            catalog,
            cutoff: None,
            previous: None,
            members: None,
        }
    }

    /// Rows submitted after `cutoff` are marked as late registrations.
    pub fn with_cutoff(mut self, cutoff: Option<NaiveDateTime>) -> Self {
        self.cutoff = cutoff;
        self
    }

    pub fn with_previous_cycle(mut self, previous: PreviousCycle) -> Self {
        self.previous = Some(previous);
        self
    }

    /// Marks registrants found on the members list as members and as paid.
    pub fn with_members(mut self, members: MemberRegistry) -> Self {
        self.members = Some(members);
        self
    }

    pub fn from_path<P: AsRef<Path>>(
        &self,
        path: P,
    ) -> Result<Vec<Registrant>, RegistrationImportError> {
        let file = std::fs::File::open(path)?;
        self.from_reader(file)
    }

    pub fn from_reader<R: Read>(
        &self,
        reader: R,
    ) -> Result<Vec<Registrant>, RegistrationImportError> {
        let rows = parser::parse_rows(reader)?;

        let mut last_row_for: HashMap<String, usize> = HashMap::new();
        for (index, row) in rows.iter().enumerate() {
            if let Some(handle) = row.data.normalized_handle() {
                last_row_for.insert(handle, index);
            }
        }

        let context = NormalizeContext {
            catalog: self.catalog,
            cutoff: self.cutoff,
            previous: self.previous.as_ref(),
            members: self.members.as_ref(),
        };

        let mut registrants = Vec::with_capacity(last_row_for.len());
        let mut superseded = 0usize;
        for (index, row) in rows.into_iter().enumerate() {
            if let Some(handle) = row.data.normalized_handle() {
                if last_row_for.get(&handle) != Some(&index) {
                    warn!(row = row.row, %handle, "superseded by a later registration");
                    superseded += 1;
                    continue;
                }
            }

            let number = row.row;
            let registrant = row
                .data
                .into_registrant(&context)
                .map_err(|err| err.at_row(number))?;
            registrants.push(registrant);
        }

        info!(
            registrants = registrants.len(),
            superseded,
            late = registrants
                .iter()
                .filter(|registrant| registrant.is_late_registration())
                .count(),
            previous_waiting_list = registrants
                .iter()
                .filter(|registrant| registrant.was_on_previous_waiting_list())
                .count(),
            "registrations imported"
        );

        Ok(registrants)
    }
}
