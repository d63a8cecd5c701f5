//! Dance-class raffle: registration import, priority allocation and reporting.
//!
//! Registrants are validated once at the boundary into immutable
//! [`Registrant`] values; the [`AllocationEngine`] is a pure function of those
//! values and the [`LevelCatalog`].

pub mod allocation;
pub mod domain;
pub mod registration;
pub mod report;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use allocation::{
    AllocationEngine, AllocationResult, LevelCapacity, LevelRoster, Placement, PlacementReason,
    PriorityBand, RequestSlot, Seat, WaitingList, WaitingListEntry,
};
pub use domain::{
    ConfigurationError, Identity, Level, LevelCatalog, LevelId, Membership, PriorityFlags,
    Registrant, Role, ValidationError, DEFAULT_CAPACITY_PER_ROLE,
};
pub use registration::{
    parse_cutoff, MemberRegistry, PreviousCycle, RegistrationImportError, RegistrationImporter,
};
pub use report::{write_attendance_csv, write_groups_csv, write_rosters_csv, RaffleSummary};
pub use router::{raffle_router, AllocationRequest};
pub use service::{RaffleRun, RaffleRunOptions, RaffleService};
