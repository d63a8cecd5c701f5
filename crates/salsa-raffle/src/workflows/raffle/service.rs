use std::io::Read;
use std::path::Path;

use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::info;

use super::allocation::{AllocationEngine, AllocationResult};
use super::domain::{LevelCatalog, Registrant};
use super::registration::{
    MemberRegistry, PreviousCycle, RegistrationImportError, RegistrationImporter,
};
use super::report::RaffleSummary;

/// Per-run inputs that are not part of the registration export itself.
#[derive(Debug, Clone, Default)]
pub struct RaffleRunOptions {
    pub cutoff: Option<NaiveDateTime>,
    pub previous: Option<PreviousCycle>,
    pub members: Option<MemberRegistry>,
}

/// Everything a single raffle produces. Nothing survives between runs.
#[derive(Debug, Clone, Serialize)]
pub struct RaffleRun {
    #[serde(skip)]
    pub registrants: Vec<Registrant>,
    pub result: AllocationResult,
    pub summary: RaffleSummary,
}

/// Service composing the registration importer, the allocation engine and
/// the summary report.
#[derive(Debug, Clone)]
pub struct RaffleService {
    engine: AllocationEngine,
}

impl RaffleService {
    pub fn new(catalog: LevelCatalog) -> Self {
        Self {
            engine: AllocationEngine::new(catalog),
        }
    }

    pub fn engine(&self) -> &AllocationEngine {
        &self.engine
    }

    pub fn catalog(&self) -> &LevelCatalog {
        self.engine.catalog()
    }

    pub fn run_path<P: AsRef<Path>>(
        &self,
        registrations: P,
        options: RaffleRunOptions,
    ) -> Result<RaffleRun, RegistrationImportError> {
        let file = std::fs::File::open(registrations)?;
        self.run(file, options)
    }

    /// Import, validate and allocate. Validation failures abort before any
    /// allocation happens.
    pub fn run<R: Read>(
        &self,
        registrations: R,
        options: RaffleRunOptions,
    ) -> Result<RaffleRun, RegistrationImportError> {
        let RaffleRunOptions {
            cutoff,
            previous,
            members,
        } = options;

        let mut importer = RegistrationImporter::new(self.catalog()).with_cutoff(cutoff);
        if let Some(previous) = previous {
            importer = importer.with_previous_cycle(previous);
        }
        if let Some(members) = members {
            importer = importer.with_members(members);
        }
        let registrants = importer.from_reader(registrations)?;

        Ok(self.allocate(registrants))
    }

    pub fn allocate(&self, registrants: Vec<Registrant>) -> RaffleRun {
        let result = self.engine.allocate(&registrants);
        let summary = RaffleSummary::from_result(&result);

        info!(
            total = summary.total,
            seated = summary.seated,
            waitlisted = summary.waitlisted,
            "raffle allocated"
        );

        RaffleRun {
            registrants,
            result,
            summary,
        }
    }
}
