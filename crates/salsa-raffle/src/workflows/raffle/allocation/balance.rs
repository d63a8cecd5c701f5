use super::priority::{PriorityKey, Request};

/// Lowers quotas of levels whose roles came out uneven, down to the scarcer
/// role's count. Returns whether any quota moved, in which case the proposal
/// rounds have to be replayed.
///
/// `held` is indexed by [`Role::index`](crate::workflows::raffle::domain::Role::index),
/// then by level; `requests` by input position.
///
/// A level is lowered only once nobody could still come to fill its scarce
/// role: a holder of that role who would be bumped from another uneven level
/// and also asked for this one keeps it open for another replay. When every
/// uneven level is waiting on someone, all of them are lowered.
pub(crate) fn rebalance(
    quotas: &mut [usize],
    held: &[Vec<Vec<PriorityKey>>; 2],
    requests: &[Vec<Request>],
) -> bool {
    let counts: Vec<[usize; 2]> = (0..quotas.len())
        .map(|level| [held[0][level].len(), held[1][level].len()])
        .collect();
    for (quota, counts) in quotas.iter().zip(&counts) {
        assert!(
            counts.iter().all(|count| count <= quota),
            "level above its quota: held {counts:?}, quota {quota}"
        );
    }

    let unbalanced: Vec<usize> = (0..quotas.len())
        .filter(|level| counts[*level][0] != counts[*level][1])
        .collect();
    if unbalanced.is_empty() {
        return false;
    }

    let mut bumpable: [Vec<usize>; 2] = [Vec::new(), Vec::new()];
    for &level in &unbalanced {
        let [leaders, followers] = counts[level];
        let surplus = usize::from(followers > leaders);
        bumpable[surplus].extend(
            held[surplus][level][leaders.min(followers)..]
                .iter()
                .map(|key| key.position),
        );
    }

    let settled: Vec<usize> = unbalanced
        .iter()
        .copied()
        .filter(|level| {
            let [leaders, followers] = counts[*level];
            let scarce = usize::from(followers < leaders);
            !bumpable[scarce].iter().any(|position| {
                requests[*position]
                    .iter()
                    .any(|request| request.level == *level)
            })
        })
        .collect();

    let lowered = if settled.is_empty() { unbalanced } else { settled };
    for level in lowered {
        quotas[level] = counts[level][0].min(counts[level][1]);
    }
    true
}
