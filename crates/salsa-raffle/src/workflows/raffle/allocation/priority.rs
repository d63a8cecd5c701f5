use super::super::domain::{LevelCatalog, LevelId, Registrant};
use serde::{Deserialize, Serialize};

/// Coarse priority tier. Earlier variants are always served first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriorityBand {
    /// Left out last cycle despite registering on time.
    PreviousWaitingList,
    /// On time this cycle with at least one stated preference.
    Current,
    /// Late this cycle, or no stated preference.
    Unranked,
}

impl PriorityBand {
    pub const fn label(self) -> &'static str {
        match self {
            Self::PreviousWaitingList => "Previous waiting list",
            Self::Current => "Current cycle",
            Self::Unranked => "Late / unranked",
        }
    }

    pub(crate) fn of(registrant: &Registrant) -> Self {
        if registrant.was_on_previous_waiting_list() {
            Self::PreviousWaitingList
        } else if registrant.is_late_registration() || registrant.preferences().is_empty() {
            Self::Unranked
        } else {
            Self::Current
        }
    }
}

/// Which of a registrant's requests a level corresponds to.
///
/// `AnyLevel` sorts after every stated preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestSlot {
    Preference(usize),
    AnyLevel,
}

impl RequestSlot {
    pub fn label(self) -> String {
        match self {
            Self::Preference(0) => "first preference".to_string(),
            Self::Preference(1) => "second preference".to_string(),
            Self::Preference(index) => format!("preference #{}", index + 1),
            Self::AnyLevel => "any level".to_string(),
        }
    }
}

/// Sortable priority of a single (registrant, level) request. Lower wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct PriorityKey {
    pub(crate) band: PriorityBand,
    pub(crate) slot: RequestSlot,
    pub(crate) position: usize,
}

pub(crate) fn request_slot(registrant: &Registrant, level: &LevelId) -> Option<RequestSlot> {
    let preferences = registrant.preferences();
    if preferences.is_empty() {
        return Some(RequestSlot::AnyLevel);
    }
    preferences
        .iter()
        .position(|preferred| preferred == level)
        .map(RequestSlot::Preference)
}

pub(crate) fn key_for_level(
    registrant: &Registrant,
    position: usize,
    level: &LevelId,
) -> Option<PriorityKey> {
    request_slot(registrant, level).map(|slot| PriorityKey {
        band: PriorityBand::of(registrant),
        slot,
        position,
    })
}

/// Key of the registrant's most wanted request, used to order waiting lists.
pub(crate) fn best_key(registrant: &Registrant, position: usize) -> PriorityKey {
    let slot = if registrant.preferences().is_empty() {
        RequestSlot::AnyLevel
    } else {
        RequestSlot::Preference(0)
    };
    PriorityKey {
        band: PriorityBand::of(registrant),
        slot,
        position,
    }
}

/// One level a registrant is willing to take, with its key there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Request {
    /// Index into the catalog.
    pub(crate) level: usize,
    pub(crate) key: PriorityKey,
}

/// The registrant's requests in the order they try them: stated preferences
/// first to last, or every level in catalog order when none were stated.
pub(crate) fn requests(registrant: &Registrant, position: usize, catalog: &LevelCatalog) -> Vec<Request> {
    let order: Vec<usize> = if registrant.preferences().is_empty() {
        (0..catalog.len()).collect()
    } else {
        registrant
            .preferences()
            .iter()
            .filter_map(|id| catalog.position(id))
            .collect()
    };

    order
        .into_iter()
        .filter_map(|level| {
            key_for_level(registrant, position, &catalog.levels()[level].id)
                .map(|key| Request { level, key })
        })
        .collect()
}
