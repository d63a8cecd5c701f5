mod balance;
mod priority;
mod result;
mod rounds;

pub use priority::{PriorityBand, RequestSlot};
pub use result::{
    AllocationResult, LevelCapacity, LevelRoster, Placement, PlacementReason, Seat, WaitingList,
    WaitingListEntry, WAITING_LIST_LABEL,
};

use super::domain::{LevelCatalog, Registrant, Role};
use priority::{PriorityKey, Request};
use tracing::debug;

/// Stateless engine that partitions registrants into level rosters and
/// waiting lists according to the raffle priority policy.
///
/// Each role runs proposal rounds: registrants try their requests from most to
/// least wanted and every level keeps its best keys up to a quota. Once the
/// rounds settle, levels whose roles came out uneven have their quota lowered
/// to the scarcer role and the rounds are replayed. Quotas only shrink, so the
/// replays end with every level balanced. Anyone without a seat is
/// wait-listed.
#[derive(Debug, Clone)]
pub struct AllocationEngine {
    catalog: LevelCatalog,
}

impl AllocationEngine {
    pub fn new(catalog: LevelCatalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &LevelCatalog {
        &self.catalog
    }

    pub fn allocate(&self, registrants: &[Registrant]) -> AllocationResult {
        let levels = self.catalog.levels();
        let requests: Vec<Vec<Request>> = registrants
            .iter()
            .enumerate()
            .map(|(position, registrant)| priority::requests(registrant, position, &self.catalog))
            .collect();
        let applicants: [Vec<&[Request]>; 2] = Role::ordered().map(|role| {
            registrants
                .iter()
                .zip(&requests)
                .filter(|(registrant, _)| registrant.role() == role)
                .map(|(_, list)| list.as_slice())
                .collect()
        });

        let mut quotas: Vec<usize> = levels
            .iter()
            .map(|level| usize::try_from(level.capacity).unwrap_or(0))
            .collect();
        let mut replays = 0usize;
        let held = loop {
            let held = Role::ordered()
                .map(|role| rounds::settle(role, &applicants[role.index()], &quotas));
            if !balance::rebalance(&mut quotas, &held, &requests) {
                break held;
            }
            replays += 1;
            debug!(replays, ?quotas, "replaying rounds with balanced quotas");
        };

        let mut placed = vec![false; registrants.len()];
        let rosters: Vec<LevelRoster> = levels
            .iter()
            .enumerate()
            .map(|(index, level)| {
                let [leaders, followers] = Role::ordered().map(|role| {
                    held[role.index()][index]
                        .iter()
                        .enumerate()
                        .map(|(offset, key)| Seat {
                            seat: offset + 1,
                            position: key.position,
                            identity: registrants[key.position].identity().clone(),
                            reason: PlacementReason {
                                band: key.band,
                                request: key.slot,
                            },
                        })
                        .collect::<Vec<_>>()
                });
                LevelRoster {
                    level: level.id.clone(),
                    name: level.name.clone(),
                    capacity: usize::try_from(level.capacity).unwrap_or(0),
                    effective_capacity: leaders.len().min(followers.len()),
                    leaders,
                    followers,
                }
            })
            .collect();

        for roster in &rosters {
            for role in Role::ordered() {
                for seat in roster.seats(role) {
                    placed[seat.position] = true;
                }
            }
            debug!(
                level = %roster.level,
                leaders = roster.leaders.len(),
                followers = roster.followers.len(),
                "level settled"
            );
        }

        let waiting_lists = Role::ordered()
            .into_iter()
            .map(|role| {
                let mut keys: Vec<PriorityKey> = registrants
                    .iter()
                    .enumerate()
                    .filter(|(position, registrant)| !placed[*position] && registrant.role() == role)
                    .map(|(position, registrant)| priority::best_key(registrant, position))
                    .collect();
                keys.sort();

                let entries = keys
                    .into_iter()
                    .enumerate()
                    .map(|(index, key)| {
                        let registrant = &registrants[key.position];
                        WaitingListEntry {
                            rank: index + 1,
                            position: key.position,
                            identity: registrant.identity().clone(),
                            band: key.band,
                            requested: registrant.preferences().to_vec(),
                        }
                    })
                    .collect();

                WaitingList { role, entries }
            })
            .collect();

        AllocationResult {
            registrant_count: registrants.len(),
            levels: rosters,
            waiting_lists,
        }
    }
}
