use super::history::PreviousCycle;
use super::members::MemberRegistry;
use super::normalizer::{parse_flag, parse_timestamp};
use crate::workflows::raffle::domain::{
    Identity, LevelCatalog, PriorityFlags, Registrant, Role, ValidationError,
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer};
use std::io::Read;

/// Loosely typed registration form row, exactly as exported.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RegistrationRow {
    #[serde(
        rename = "Timestamp",
        alias = "timestamp",
        alias = "submitted_at",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    pub(crate) timestamp: Option<String>,
    #[serde(
        rename = "Telegram handle",
        alias = "handle",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    pub(crate) handle: Option<String>,
    #[serde(
        rename = "Full name (first and last name)",
        alias = "name",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    pub(crate) name: Option<String>,
    #[serde(
        rename = "Email address",
        alias = "email",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    pub(crate) email: Option<String>,
    #[serde(
        rename = "Dance role",
        alias = "role",
        alias = "First preference dance role",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    pub(crate) role: Option<String>,
    #[serde(
        rename = "First preference",
        alias = "first_preference",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    pub(crate) first_preference: Option<String>,
    #[serde(
        rename = "I have a second preference",
        alias = "has_second_preference",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    pub(crate) has_second_preference: Option<String>,
    #[serde(
        rename = "Second preference",
        alias = "second_preference",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    pub(crate) second_preference: Option<String>,
    #[serde(
        rename = "Previous waiting list",
        alias = "previous_waiting_list",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    pub(crate) previous_waiting_list: Option<String>,
    #[serde(
        rename = "Late registration",
        alias = "late_registration",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    pub(crate) late_registration: Option<String>,
}

/// Row together with its spreadsheet row number (the header is row 1).
#[derive(Debug)]
pub(crate) struct NumberedRow {
    pub(crate) row: usize,
    pub(crate) data: RegistrationRow,
}

pub(crate) fn parse_rows<R: Read>(reader: R) -> Result<Vec<NumberedRow>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);
    let mut rows = Vec::new();

    for (index, record) in csv_reader.deserialize::<RegistrationRow>().enumerate() {
        rows.push(NumberedRow {
            row: index + 2,
            data: record?,
        });
    }

    Ok(rows)
}

/// Inputs needed to turn a raw row into a [`Registrant`].
pub(crate) struct NormalizeContext<'a> {
    pub(crate) catalog: &'a LevelCatalog,
    pub(crate) cutoff: Option<NaiveDateTime>,
    pub(crate) previous: Option<&'a PreviousCycle>,
    pub(crate) members: Option<&'a MemberRegistry>,
}

impl RegistrationRow {
    pub(crate) fn normalized_handle(&self) -> Option<String> {
        self.handle
            .as_deref()
            .map(|handle| handle.trim().to_lowercase())
    }

    pub(crate) fn into_registrant(
        self,
        context: &NormalizeContext<'_>,
    ) -> Result<Registrant, ValidationError> {
        let handle = self
            .normalized_handle()
            .ok_or(ValidationError::MissingHandle { row: None })?;

        let raw_role = self
            .role
            .as_deref()
            .ok_or(ValidationError::MissingRole { row: None })?;
        let role = Role::parse(raw_role).ok_or_else(|| ValidationError::UnknownRole {
            row: None,
            value: raw_role.to_string(),
        })?;

        let wants_second = match self.has_second_preference.as_deref() {
            None => true,
            Some(value) => parse_flag(Some(value)).ok_or_else(|| ValidationError::MalformedFlag {
                row: None,
                field: "second preference",
                value: value.to_string(),
            })?,
        };

        let mut labels = Vec::new();
        labels.extend(self.first_preference.as_deref());
        if wants_second {
            labels.extend(self.second_preference.as_deref());
        }

        let mut preferences = Vec::with_capacity(labels.len());
        for label in labels {
            let level = context
                .catalog
                .resolve(label)
                .ok_or_else(|| ValidationError::UnknownLevel {
                    row: None,
                    value: label.to_string(),
                })?;
            preferences.push(level.id.clone());
        }

        let listed_previous = flag(self.previous_waiting_list.as_deref(), "previous waiting list")?;
        let listed_late = flag(self.late_registration.as_deref(), "late registration")?;

        let submitted_after_cutoff = match (self.timestamp.as_deref(), context.cutoff) {
            (Some(raw), Some(cutoff)) => {
                let submitted =
                    parse_timestamp(raw).ok_or_else(|| ValidationError::MalformedTimestamp {
                        row: None,
                        value: raw.to_string(),
                    })?;
                submitted > cutoff
            }
            _ => false,
        };

        let qualified_last_cycle = context
            .previous
            .map(|previous| previous.qualifies(&handle))
            .unwrap_or(false);

        let flags = PriorityFlags {
            was_on_previous_waiting_list: listed_previous || qualified_last_cycle,
            is_late_registration: listed_late || submitted_after_cutoff,
        };

        let membership = context
            .members
            .map(|members| members.membership(&handle))
            .unwrap_or_default();
        let identity = Identity::new(
            handle,
            self.name.unwrap_or_default(),
            self.email.unwrap_or_default(),
        )
        .with_membership(membership);

        Registrant::new(identity, role, preferences, flags, context.catalog)
    }
}

fn flag(value: Option<&str>, field: &'static str) -> Result<bool, ValidationError> {
    parse_flag(value).ok_or_else(|| ValidationError::MalformedFlag {
        row: None,
        field,
        value: value.unwrap_or_default().to_string(),
    })
}

pub(crate) fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
