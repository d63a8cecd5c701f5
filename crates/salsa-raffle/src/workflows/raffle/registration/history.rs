use super::normalizer::parse_flag;
use crate::workflows::raffle::allocation::WAITING_LIST_LABEL;
use super::parser::empty_string_as_none;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;
use tracing::warn;

/// Handles that earn first priority this cycle: wait-listed last cycle after
/// registering before last cycle's cutoff.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreviousCycle {
    qualifying: BTreeSet<String>,
}

#[derive(Debug, Deserialize)]
struct GroupsRow {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    handle: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    placement: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    late_registration: Option<String>,
}

impl PreviousCycle {
    pub fn from_handles<I, S>(handles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            qualifying: handles
                .into_iter()
                .map(|handle| handle.as_ref().trim().to_lowercase())
                .filter(|handle| !handle.is_empty())
                .collect(),
        }
    }

    /// Read last cycle's groups export. A missing file means nobody qualifies.
    ///
    /// Only rows whose `late_registration` cell explicitly says no qualify. A
    /// missing column, an empty cell or an unreadable flag counts as late.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, csv::Error> {
        let path = path.as_ref();
        if !path.exists() {
            warn!(path = %path.display(), "no previous groups file found");
            return Ok(Self::default());
        }
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, csv::Error> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut qualifying = BTreeSet::new();

        for record in csv_reader.deserialize::<GroupsRow>() {
            let row = record?;
            let Some(handle) = row.handle else {
                continue;
            };
            let wait_listed = row
                .placement
                .as_deref()
                .map(|placement| placement.eq_ignore_ascii_case(WAITING_LIST_LABEL))
                .unwrap_or(false);
            let on_time = row
                .late_registration
                .as_deref()
                .and_then(|flag| parse_flag(Some(flag)))
                == Some(false);

            if wait_listed && on_time {
                qualifying.insert(handle.trim().to_lowercase());
            }
        }

        Ok(Self { qualifying })
    }

    pub fn qualifies(&self, handle: &str) -> bool {
        self.qualifying.contains(&handle.trim().to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.qualifying.len()
    }

    pub fn is_empty(&self) -> bool {
        self.qualifying.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn only_on_time_waiting_list_rows_qualify() {
        let csv = "handle,name,email,role,placement,position,previous_waiting_list,late_registration\n\
@ana,Ana,ana@example.com,Leader,S1,1,false,false\n\
@ben,Ben,ben@example.com,Leader,waiting_list,1,false,false\n\
@cleo,Cleo,cleo@example.com,Follower,waiting_list,1,false,true\n\
@DIA,Dia,dia@example.com,Follower,waiting_list,2,true,false\n";

        let previous = PreviousCycle::from_reader(Cursor::new(csv)).expect("parse");

        assert!(!previous.qualifies("@ana"));
        assert!(previous.qualifies("@ben"));
        assert!(!previous.qualifies("@cleo"), "late registrants never qualify");
        assert!(previous.qualifies("@dia"));
        assert_eq!(previous.len(), 2);
    }

    #[test]
    fn lateness_must_be_explicitly_denied() {
        let csv = "handle,placement,late_registration\n\
@ana,waiting_list,\n\
@ben,waiting_list,maybe\n\
@cleo,waiting_list,no\n";
        let previous = PreviousCycle::from_reader(Cursor::new(csv)).expect("parse");
        assert!(!previous.qualifies("@ana"), "empty cell counts as late");
        assert!(!previous.qualifies("@ben"), "unreadable flag counts as late");
        assert!(previous.qualifies("@cleo"));

        let without_column = "handle,placement\n@dia,waiting_list\n";
        let previous = PreviousCycle::from_reader(Cursor::new(without_column)).expect("parse");
        assert!(previous.is_empty(), "missing column counts as late");
    }

    #[test]
    fn missing_file_yields_empty_history() {
        let previous = PreviousCycle::from_path("./no-such-groups.csv").expect("missing is fine");
        assert!(previous.is_empty());
    }

    #[test]
    fn handles_are_matched_case_insensitively() {
        let previous = PreviousCycle::from_handles([" @Eve "]);
        assert!(previous.qualifies("@EVE"));
    }
}
