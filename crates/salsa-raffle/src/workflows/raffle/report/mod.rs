pub mod summary;
pub mod writer;

pub use summary::{LevelFillEntry, RaffleSummary, WaitingListCount};
pub use writer::{write_attendance_csv, write_groups_csv, write_rosters_csv};
