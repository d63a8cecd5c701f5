use std::collections::BTreeMap;

use axum::response::Response;
use serde_json::Value;

use crate::workflows::raffle::{
    AllocationResult, Identity, Level, LevelCatalog, LevelId, Membership, Placement,
    PriorityFlags, Registrant, Role,
};

pub(super) const FORM_HEADER: &str = "Timestamp,Telegram handle,Full name (first and last name),Email address,Dance role,First preference,I have a second preference,Second preference\n";

pub(super) fn standard_catalog() -> LevelCatalog {
    LevelCatalog::standard(15).expect("standard catalog")
}

pub(super) fn catalog_of(levels: &[(&str, i64)]) -> LevelCatalog {
    LevelCatalog::new(
        levels
            .iter()
            .map(|(id, capacity)| Level::new(*id, format!("Level {id}"), *capacity))
            .collect(),
    )
    .expect("valid catalog")
}

/// Builder for registrants used across the allocation tests.
pub(super) struct Signup {
    handle: String,
    role: Role,
    preferences: Vec<&'static str>,
    flags: PriorityFlags,
    membership: Membership,
}

pub(super) fn leader(handle: &str) -> Signup {
    Signup::new(handle, Role::Leader)
}

pub(super) fn follower(handle: &str) -> Signup {
    Signup::new(handle, Role::Follower)
}

impl Signup {
    fn new(handle: &str, role: Role) -> Self {
        Self {
            handle: handle.to_string(),
            role,
            preferences: Vec::new(),
            flags: PriorityFlags::default(),
            membership: Membership::default(),
        }
    }

    pub(super) fn wants(mut self, levels: &[&'static str]) -> Self {
        self.preferences = levels.to_vec();
        self
    }

    pub(super) fn late(mut self) -> Self {
        self.flags.is_late_registration = true;
        self
    }

    pub(super) fn previous(mut self) -> Self {
        self.flags.was_on_previous_waiting_list = true;
        self
    }

    pub(super) fn member(mut self, paid: bool) -> Self {
        self.membership = Membership { member: true, paid };
        self
    }

    pub(super) fn build(self, catalog: &LevelCatalog) -> Registrant {
        let name = self.handle.trim_start_matches('@').to_string();
        Registrant::new(
            Identity::new(
                self.handle.clone(),
                name.clone(),
                format!("{name}@example.com"),
            )
            .with_membership(self.membership),
            self.role,
            self.preferences.into_iter().map(LevelId::new).collect(),
            self.flags,
            catalog,
        )
        .expect("valid registrant")
    }
}

pub(super) fn build_all(catalog: &LevelCatalog, signups: Vec<Signup>) -> Vec<Registrant> {
    signups
        .into_iter()
        .map(|signup| signup.build(catalog))
        .collect()
}

/// `handle -> placement label` for compact assertions.
pub(super) fn placements_by_handle(
    registrants: &[Registrant],
    result: &AllocationResult,
) -> BTreeMap<String, String> {
    result
        .placements()
        .into_iter()
        .zip(registrants)
        .map(|(placement, registrant)| {
            (
                registrant.identity().handle.clone(),
                placement.map(|placement| placement.label()).unwrap_or_default(),
            )
        })
        .collect()
}

pub(super) fn seated_handles(result: &AllocationResult, level: &str, role: Role) -> Vec<String> {
    result
        .roster(&LevelId::new(level))
        .expect("level exists")
        .seats(role)
        .iter()
        .map(|seat| seat.identity.handle.clone())
        .collect()
}

pub(super) fn waiting_handles(result: &AllocationResult, role: Role) -> Vec<String> {
    result
        .waiting_list(role)
        .iter()
        .map(|entry| entry.identity.handle.clone())
        .collect()
}

pub(super) fn assert_placed_exactly_once(result: &AllocationResult) {
    let mut seen = vec![0usize; result.registrant_count];
    for roster in &result.levels {
        for role in Role::ordered() {
            for seat in roster.seats(role) {
                seen[seat.position] += 1;
            }
        }
    }
    for list in &result.waiting_lists {
        for entry in &list.entries {
            seen[entry.position] += 1;
        }
    }
    assert!(
        seen.iter().all(|count| *count == 1),
        "every registrant appears once: {seen:?}"
    );
    assert!(result
        .placements()
        .iter()
        .all(|placement| matches!(
            placement,
            Some(Placement::Seated { .. }) | Some(Placement::WaitingList { .. })
        )));
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
