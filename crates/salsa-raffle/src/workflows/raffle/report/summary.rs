use crate::workflows::raffle::allocation::{AllocationResult, PriorityBand};
use crate::workflows::raffle::domain::{LevelId, Role};
use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LevelFillEntry {
    pub level: LevelId,
    pub name: String,
    pub capacity: usize,
    pub leaders: usize,
    pub followers: usize,
}

impl LevelFillEntry {
    pub fn open_seats(&self) -> usize {
        self.capacity.saturating_sub(self.leaders.max(self.followers))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WaitingListCount {
    pub role: Role,
    pub role_label: String,
    pub waiting: usize,
    pub from_previous_waiting_list: usize,
}

/// Headline numbers and contact lists organisers send out after a raffle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RaffleSummary {
    pub total: usize,
    pub seated: usize,
    pub waitlisted: usize,
    pub levels: Vec<LevelFillEntry>,
    pub waiting_lists: Vec<WaitingListCount>,
    pub accepted_emails: Vec<String>,
    pub waitlisted_emails: Vec<String>,
}

impl RaffleSummary {
    pub fn from_result(result: &AllocationResult) -> Self {
        let levels = result
            .levels
            .iter()
            .map(|roster| LevelFillEntry {
                level: roster.level.clone(),
                name: roster.name.clone(),
                capacity: roster.capacity,
                leaders: roster.leaders.len(),
                followers: roster.followers.len(),
            })
            .collect();

        let waiting_lists = Role::ordered()
            .into_iter()
            .map(|role| {
                let entries = result.waiting_list(role);
                WaitingListCount {
                    role,
                    role_label: role.label().to_string(),
                    waiting: entries.len(),
                    from_previous_waiting_list: entries
                        .iter()
                        .filter(|entry| entry.band == PriorityBand::PreviousWaitingList)
                        .count(),
                }
            })
            .collect();

        let accepted = result.levels.iter().flat_map(|roster| {
            roster
                .leaders
                .iter()
                .chain(roster.followers.iter())
                .map(|seat| seat.identity.email.as_str())
        });
        let waiting = result
            .waiting_lists
            .iter()
            .flat_map(|list| list.entries.iter().map(|entry| entry.identity.email.as_str()));

        Self {
            total: result.registrant_count,
            seated: result.seated_count(),
            waitlisted: result.waitlisted_count(),
            levels,
            waiting_lists,
            accepted_emails: unique_emails(accepted),
            waitlisted_emails: unique_emails(waiting),
        }
    }
}

fn unique_emails<'a>(emails: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    emails
        .filter(|email| !email.is_empty())
        .filter(|email| seen.insert(*email))
        .map(str::to_string)
        .collect()
}
