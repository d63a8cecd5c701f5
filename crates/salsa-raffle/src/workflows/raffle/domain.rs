use serde::{Deserialize, Serialize};
use std::fmt;

/// Seats per role and level unless the catalog says otherwise.
pub const DEFAULT_CAPACITY_PER_ROLE: i64 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Leader,
    Follower,
}

impl Role {
    pub const fn ordered() -> [Self; 2] {
        [Self::Leader, Self::Follower]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Leader => "Leader",
            Self::Follower => "Follower",
        }
    }

    pub const fn short_label(self) -> &'static str {
        match self {
            Self::Leader => "L",
            Self::Follower => "F",
        }
    }

    pub const fn index(self) -> usize {
        match self {
            Self::Leader => 0,
            Self::Follower => 1,
        }
    }

    pub(crate) fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "leader" | "lead" | "l" => Some(Self::Leader),
            "follower" | "follow" | "f" => Some(Self::Follower),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Short class label such as `S1` or `B2`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LevelId(pub String);

impl LevelId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LevelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A class tier with its own per-role capacity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    pub id: LevelId,
    pub name: String,
    pub capacity: i64,
}

impl Level {
    pub fn new(id: impl Into<String>, name: impl Into<String>, capacity: i64) -> Self {
        Self {
            id: LevelId::new(id),
            name: name.into(),
            capacity,
        }
    }
}

/// Ordered set of levels offered in a cycle.
///
/// Catalog order is the order in which registrants without a preference try
/// levels, and the order of rosters in every output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LevelCatalog {
    levels: Vec<Level>,
}

impl LevelCatalog {
    pub fn new(levels: Vec<Level>) -> Result<Self, ConfigurationError> {
        if levels.is_empty() {
            return Err(ConfigurationError::EmptyCatalog);
        }

        for (index, level) in levels.iter().enumerate() {
            if level.capacity < 0 {
                return Err(ConfigurationError::NegativeCapacity {
                    level: level.id.clone(),
                    capacity: level.capacity,
                });
            }
            if levels[..index].iter().any(|other| other.id == level.id) {
                return Err(ConfigurationError::DuplicateLevel(level.id.clone()));
            }
        }

        let total = levels
            .iter()
            .try_fold(0i64, |total, level| total.checked_add(level.capacity))
            .ok_or(ConfigurationError::CapacityOverflow)?;
        if total <= 0 {
            return Err(ConfigurationError::NoCapacity { total });
        }

        Ok(Self { levels })
    }

    /// The six classes taught each cycle, every one at `capacity` per role.
    pub fn standard(capacity: i64) -> Result<Self, ConfigurationError> {
        const CLASSES: [(&str, &str); 6] = [
            ("S1", "Salsa Level 1"),
            ("S2", "Salsa Level 2"),
            ("S3", "Salsa Level 3"),
            ("S4", "Salsa Level 4"),
            ("B1", "Bachata Level 1"),
            ("B2", "Bachata Level 2"),
        ];

        Self::new(
            CLASSES
                .iter()
                .map(|(id, name)| Level::new(*id, *name, capacity))
                .collect(),
        )
    }

    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn get(&self, id: &LevelId) -> Option<&Level> {
        self.levels.iter().find(|level| &level.id == id)
    }

    pub fn position(&self, id: &LevelId) -> Option<usize> {
        self.levels.iter().position(|level| &level.id == id)
    }

    /// Resolve a form label, accepting either the short id or the display name.
    pub fn resolve(&self, label: &str) -> Option<&Level> {
        let wanted = collapse(label);
        if wanted.is_empty() {
            return None;
        }
        self.levels
            .iter()
            .find(|level| collapse(level.id.as_str()) == wanted || collapse(&level.name) == wanted)
    }
}

fn collapse(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_lowercase()
}

/// Contact details reported back to organisers. Never inspected by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    pub handle: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub membership: Membership,
}

impl Identity {
    pub fn new(handle: impl Into<String>, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            handle: handle.into().trim().to_lowercase(),
            name: name.into().trim().to_string(),
            email: email.into().trim().to_lowercase(),
            membership: Membership::default(),
        }
    }

    pub fn with_membership(mut self, membership: Membership) -> Self {
        self.membership = membership;
        self
    }
}

/// Standing with the association, shown on attendance sheets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Membership {
    /// Approved member.
    pub member: bool,
    /// Membership fee received.
    pub paid: bool,
}

/// Priority flags taken from two different cycles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityFlags {
    /// Wait-listed last cycle after registering before that cycle's cutoff.
    pub was_on_previous_waiting_list: bool,
    /// Registered after this cycle's raffle cutoff.
    pub is_late_registration: bool,
}

/// Validated registration. Only obtainable through [`Registrant::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Registrant {
    identity: Identity,
    role: Role,
    preferences: Vec<LevelId>,
    flags: PriorityFlags,
}

impl Registrant {
    pub fn new(
        identity: Identity,
        role: Role,
        preferences: Vec<LevelId>,
        flags: PriorityFlags,
        catalog: &LevelCatalog,
    ) -> Result<Self, ValidationError> {
        let mut unique: Vec<LevelId> = Vec::with_capacity(preferences.len());
        for level in preferences {
            if catalog.get(&level).is_none() {
                return Err(ValidationError::UnknownLevel {
                    row: None,
                    value: level.0,
                });
            }
            if !unique.contains(&level) {
                unique.push(level);
            }
        }

        Ok(Self {
            identity,
            role,
            preferences: unique,
            flags,
        })
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn preferences(&self) -> &[LevelId] {
        &self.preferences
    }

    pub fn flags(&self) -> PriorityFlags {
        self.flags
    }

    pub fn was_on_previous_waiting_list(&self) -> bool {
        self.flags.was_on_previous_waiting_list
    }

    pub fn is_late_registration(&self) -> bool {
        self.flags.is_late_registration
    }
}

/// A registration row that cannot be turned into a [`Registrant`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{}missing Telegram handle", row_prefix(.row))]
    MissingHandle { row: Option<usize> },
    #[error("{}missing dance role", row_prefix(.row))]
    MissingRole { row: Option<usize> },
    #[error("{}unknown dance role '{value}'", row_prefix(.row))]
    UnknownRole { row: Option<usize>, value: String },
    #[error("{}unknown level '{value}'", row_prefix(.row))]
    UnknownLevel { row: Option<usize>, value: String },
    #[error("{}malformed {field} flag '{value}'", row_prefix(.row))]
    MalformedFlag {
        row: Option<usize>,
        field: &'static str,
        value: String,
    },
    #[error("{}malformed timestamp '{value}'", row_prefix(.row))]
    MalformedTimestamp { row: Option<usize>, value: String },
}

impl ValidationError {
    pub fn row(&self) -> Option<usize> {
        match self {
            Self::MissingHandle { row }
            | Self::MissingRole { row }
            | Self::UnknownRole { row, .. }
            | Self::UnknownLevel { row, .. }
            | Self::MalformedFlag { row, .. }
            | Self::MalformedTimestamp { row, .. } => *row,
        }
    }

    pub(crate) fn at_row(mut self, number: usize) -> Self {
        match &mut self {
            Self::MissingHandle { row }
            | Self::MissingRole { row }
            | Self::UnknownRole { row, .. }
            | Self::UnknownLevel { row, .. }
            | Self::MalformedFlag { row, .. }
            | Self::MalformedTimestamp { row, .. } => *row = Some(number),
        }
        self
    }
}

fn row_prefix(row: &Option<usize>) -> String {
    match row {
        Some(row) => format!("row {row}: "),
        None => String::new(),
    }
}

/// Invalid level or capacity setup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("no levels configured")]
    EmptyCatalog,
    #[error("level {0} is configured twice")]
    DuplicateLevel(LevelId),
    #[error("level {level} has negative capacity {capacity}")]
    NegativeCapacity { level: LevelId, capacity: i64 },
    #[error("total configured capacity must be positive (got {total})")]
    NoCapacity { total: i64 },
    #[error("total configured capacity does not fit in 64 bits")]
    CapacityOverflow,
    #[error("invalid level entry '{0}', expected ID=Name")]
    MalformedLevel(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parses_form_labels() {
        assert_eq!(Role::parse(" Leader "), Some(Role::Leader));
        assert_eq!(Role::parse("follow"), Some(Role::Follower));
        assert_eq!(Role::parse("F"), Some(Role::Follower));
        assert_eq!(Role::parse("both"), None);
    }

    #[test]
    fn catalog_rejects_zero_total_capacity() {
        let error = LevelCatalog::standard(0).expect_err("zero capacity rejected");
        assert_eq!(error, ConfigurationError::NoCapacity { total: 0 });
    }

    #[test]
    fn catalog_rejects_capacity_overflow() {
        let error = LevelCatalog::standard(i64::MAX).expect_err("overflow rejected");
        assert_eq!(error, ConfigurationError::CapacityOverflow);

        let single = LevelCatalog::new(vec![Level::new("S1", "Salsa Level 1", i64::MAX)])
            .expect("one huge level fits");
        assert_eq!(single.levels()[0].capacity, i64::MAX);
    }

    #[test]
    fn catalog_rejects_negative_capacity() {
        let error = LevelCatalog::new(vec![
            Level::new("S1", "Salsa Level 1", 15),
            Level::new("S2", "Salsa Level 2", -1),
        ])
        .expect_err("negative capacity rejected");
        assert!(matches!(error, ConfigurationError::NegativeCapacity { capacity: -1, .. }));
    }

    #[test]
    fn catalog_rejects_duplicates_and_empty() {
        assert_eq!(
            LevelCatalog::new(Vec::new()).expect_err("empty"),
            ConfigurationError::EmptyCatalog
        );
        let error = LevelCatalog::new(vec![
            Level::new("S1", "Salsa Level 1", 15),
            Level::new("S1", "Salsa Level 1 (again)", 15),
        ])
        .expect_err("duplicate");
        assert_eq!(error, ConfigurationError::DuplicateLevel(LevelId::new("S1")));
    }

    #[test]
    fn catalog_resolves_ids_and_names() {
        let catalog = LevelCatalog::standard(15).expect("catalog");
        assert_eq!(catalog.resolve("s1").map(|level| level.id.as_str()), Some("S1"));
        assert_eq!(
            catalog
                .resolve("  bachata   level 2 ")
                .map(|level| level.id.as_str()),
            Some("B2")
        );
        assert!(catalog.resolve("Kizomba").is_none());
        assert!(catalog.resolve("   ").is_none());
    }

    #[test]
    fn registrant_rejects_unknown_levels_and_dedups() {
        let catalog = LevelCatalog::standard(15).expect("catalog");
        let identity = Identity::new("@Ana", "Ana", "ANA@example.com");
        assert_eq!(identity.handle, "@ana");
        assert_eq!(identity.email, "ana@example.com");

        let error = Registrant::new(
            identity.clone(),
            Role::Leader,
            vec![LevelId::new("S9")],
            PriorityFlags::default(),
            &catalog,
        )
        .expect_err("unknown level");
        assert_eq!(error.to_string(), "unknown level 'S9'");

        let registrant = Registrant::new(
            identity,
            Role::Leader,
            vec![LevelId::new("S1"), LevelId::new("S1"), LevelId::new("B1")],
            PriorityFlags::default(),
            &catalog,
        )
        .expect("valid");
        assert_eq!(
            registrant.preferences(),
            &[LevelId::new("S1"), LevelId::new("B1")]
        );
    }

    #[test]
    fn validation_error_reports_row_number() {
        let error = ValidationError::MissingRole { row: None }.at_row(7);
        assert_eq!(error.row(), Some(7));
        assert_eq!(error.to_string(), "row 7: missing dance role");
    }
}
