use super::priority::{PriorityBand, RequestSlot};
use crate::workflows::raffle::domain::{Identity, LevelId, Role};
use serde::Serialize;

/// Placement label used for wait-listed registrants in exports.
pub const WAITING_LIST_LABEL: &str = "waiting_list";

/// Why a registrant holds a seat: the band they were ranked in and which of
/// their requests matched the level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlacementReason {
    pub band: PriorityBand,
    pub request: RequestSlot,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Seat {
    /// 1-based seat number within the role's roster.
    pub seat: usize,
    /// 0-based row position in the input.
    pub position: usize,
    pub identity: Identity,
    pub reason: PlacementReason,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LevelRoster {
    pub level: LevelId,
    pub name: String,
    pub capacity: usize,
    /// Seats per role actually filled once both roles are balanced.
    pub effective_capacity: usize,
    pub leaders: Vec<Seat>,
    pub followers: Vec<Seat>,
}

impl LevelRoster {
    pub fn seats(&self, role: Role) -> &[Seat] {
        match role {
            Role::Leader => &self.leaders,
            Role::Follower => &self.followers,
        }
    }
}

/// Configured and balanced capacity of one level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LevelCapacity {
    pub level: LevelId,
    pub capacity: usize,
    pub effective_capacity: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WaitingListEntry {
    /// 1-based rank on the role's waiting list.
    pub rank: usize,
    pub position: usize,
    pub identity: Identity,
    pub band: PriorityBand,
    pub requested: Vec<LevelId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WaitingList {
    pub role: Role,
    pub entries: Vec<WaitingListEntry>,
}

/// Where a single registrant ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Placement {
    Seated { level: LevelId, role: Role, seat: usize },
    WaitingList { role: Role, rank: usize },
}

impl Placement {
    pub fn label(&self) -> String {
        match self {
            Placement::Seated { level, .. } => level.to_string(),
            Placement::WaitingList { .. } => WAITING_LIST_LABEL.to_string(),
        }
    }

    pub fn number(&self) -> usize {
        match self {
            Placement::Seated { seat, .. } => *seat,
            Placement::WaitingList { rank, .. } => *rank,
        }
    }
}

/// Outcome of one allocation run: per-level rosters in catalog order and one
/// waiting list per role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AllocationResult {
    pub registrant_count: usize,
    pub levels: Vec<LevelRoster>,
    pub waiting_lists: Vec<WaitingList>,
}

impl AllocationResult {
    pub fn roster(&self, level: &LevelId) -> Option<&LevelRoster> {
        self.levels.iter().find(|roster| &roster.level == level)
    }

    pub fn capacity_per_level(&self) -> Vec<LevelCapacity> {
        self.levels
            .iter()
            .map(|roster| LevelCapacity {
                level: roster.level.clone(),
                capacity: roster.capacity,
                effective_capacity: roster.effective_capacity,
            })
            .collect()
    }

    pub fn waiting_list(&self, role: Role) -> &[WaitingListEntry] {
        self.waiting_lists
            .iter()
            .find(|list| list.role == role)
            .map(|list| list.entries.as_slice())
            .unwrap_or(&[])
    }

    pub fn seated_count(&self) -> usize {
        self.levels
            .iter()
            .map(|roster| roster.leaders.len() + roster.followers.len())
            .sum()
    }

    pub fn waitlisted_count(&self) -> usize {
        self.waiting_lists.iter().map(|list| list.entries.len()).sum()
    }

    /// Placement of every input row, indexed by position.
    pub fn placements(&self) -> Vec<Option<Placement>> {
        let mut placements = vec![None; self.registrant_count];

        for roster in &self.levels {
            for role in Role::ordered() {
                for seat in roster.seats(role) {
                    if let Some(slot) = placements.get_mut(seat.position) {
                        *slot = Some(Placement::Seated {
                            level: roster.level.clone(),
                            role,
                            seat: seat.seat,
                        });
                    }
                }
            }
        }

        for list in &self.waiting_lists {
            for entry in &list.entries {
                if let Some(slot) = placements.get_mut(entry.position) {
                    *slot = Some(Placement::WaitingList {
                        role: list.role,
                        rank: entry.rank,
                    });
                }
            }
        }

        placements
    }

    pub fn placement_of(&self, position: usize) -> Option<Placement> {
        self.placements().into_iter().nth(position).flatten()
    }
}
