use super::normalizer::parse_flag;
use super::parser::empty_string_as_none;
use crate::workflows::raffle::domain::Membership;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

/// Association members list, keyed by handle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberRegistry {
    approved: BTreeSet<String>,
    paid: BTreeSet<String>,
}

#[derive(Debug, Deserialize)]
struct MemberRow {
    #[serde(default, alias = "Telegram handle", deserialize_with = "empty_string_as_none")]
    handle: Option<String>,
    #[serde(default, alias = "member", deserialize_with = "empty_string_as_none")]
    approved: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    paid: Option<String>,
}

impl MemberRegistry {
    /// A missing file means nobody is a member.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, csv::Error> {
        let path = path.as_ref();
        if !path.exists() {
            warn!(path = %path.display(), "no members list found");
            return Ok(Self::default());
        }
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Only cells that clearly say yes count; anything unreadable is a no.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, csv::Error> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut registry = Self::default();

        for record in csv_reader.deserialize::<MemberRow>() {
            let row = record?;
            let Some(handle) = row.handle.map(|handle| handle.trim().to_lowercase()) else {
                continue;
            };
            if yes(row.approved.as_deref()) {
                registry.approved.insert(handle.clone());
            }
            if yes(row.paid.as_deref()) {
                registry.paid.insert(handle);
            }
        }

        info!(
            members = registry.approved.len(),
            paid = registry.paid.len(),
            "members list loaded"
        );
        Ok(registry)
    }

    pub fn membership(&self, handle: &str) -> Membership {
        let handle = handle.trim().to_lowercase();
        Membership {
            member: self.approved.contains(&handle),
            paid: self.paid.contains(&handle),
        }
    }

    pub fn len(&self) -> usize {
        self.approved.len()
    }

    pub fn is_empty(&self) -> bool {
        self.approved.is_empty()
    }
}

fn yes(value: Option<&str>) -> bool {
    value.and_then(|flag| parse_flag(Some(flag))) == Some(true)
}
