use super::super::domain::Role;
use super::priority::{PriorityKey, Request};
use tracing::debug;

/// Runs proposal rounds for one role until nobody has a request left to try.
///
/// In each round every registrant without a seat tries their next request.
/// A level keeps the `quota` best keys among its holders and the newcomers;
/// whoever falls outside moves on to their next request in the following
/// round. Seats are tentative until the rounds settle, so a better request
/// always displaces a worse holder no matter which level it reached first.
///
/// Returns the held keys per level, best first.
pub(crate) fn settle(role: Role, applicants: &[&[Request]], quotas: &[usize]) -> Vec<Vec<PriorityKey>> {
    let mut held: Vec<Vec<(PriorityKey, usize)>> = vec![Vec::new(); quotas.len()];
    let mut next = vec![0usize; applicants.len()];
    let mut free: Vec<usize> = (0..applicants.len()).collect();
    let mut round = 0usize;

    loop {
        let mut touched = Vec::new();
        for &applicant in &free {
            if let Some(request) = applicants[applicant].get(next[applicant]) {
                next[applicant] += 1;
                held[request.level].push((request.key, applicant));
                touched.push(request.level);
            }
        }
        if touched.is_empty() {
            break;
        }
        round += 1;

        touched.sort_unstable();
        touched.dedup();
        free.clear();
        for level in touched {
            let holders = &mut held[level];
            holders.sort();
            if holders.len() > quotas[level] {
                free.extend(holders.drain(quotas[level]..).map(|(_, applicant)| applicant));
            }
        }
        free.sort_unstable();

        debug!(role = role.label(), round, displaced = free.len(), "proposal round settled");
    }

    held.into_iter()
        .map(|holders| holders.into_iter().map(|(key, _)| key).collect())
        .collect()
}
