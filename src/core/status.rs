//! Raw status string → [`LeadStatus`] lookup.

use crate::core::LeadStatus;
use once_cell::sync::Lazy;
use std::collections::HashMap;

static DEFAULT_ALIASES: Lazy<HashMap<&'static str, LeadStatus>> = Lazy::new(|| {
    use LeadStatus::*;
    [
        ("pending", Pending),
        ("queued", Pending),
        ("scheduled", Pending),
        ("draft", Pending),
        ("not contacted", Pending),
        ("not sent", Pending),
        ("sent", Sent),
        ("contacted", Sent),
        ("delivered", Sent),
        ("opened", Sent),
        ("in sequence", Sent),
        ("connected", Connected),
        ("accepted", Connected),
        ("connection accepted", Connected),
        ("messaged", Messaged),
        ("message sent", Messaged),
        ("replied", Replied),
        ("reply", Replied),
        ("responded", Replied),
        ("interested", Interested),
        ("not interested", NotInterested),
        ("objection", Objection),
        ("objections", Objection),
        ("automated reply", AutomatedReply),
        ("automated", AutomatedReply),
        ("auto reply", AutomatedReply),
        ("out of office", AutomatedReply),
        ("revisit later", RevisitLater),
        ("revisit", RevisitLater),
        ("bounced", Bounced),
        ("bounce", Bounced),
        ("hard bounce", Bounced),
        ("soft bounce", Bounced),
        ("unsubscribed", Unsubscribed),
        ("unsubscribe", Unsubscribed),
        ("opted out", Unsubscribed),
    ]
    .into_iter()
    .collect()
});

/// Case-fold a raw status and collapse `_`, `-` and whitespace runs to one space.
pub fn canonical_key(raw: &str) -> String {
    raw.split(|c: char| c.is_whitespace() || c == '_' || c == '-')
        .filter(|part| !part.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Lookup table from canonical status keys to [`LeadStatus`].
#[derive(Debug, Clone, PartialEq)]
pub struct StatusMap {
    entries: HashMap<String, LeadStatus>,
}

impl Default for StatusMap {
    fn default() -> Self {
        Self {
            entries: DEFAULT_ALIASES
                .iter()
                .map(|(k, v)| ((*k).to_string(), *v))
                .collect(),
        }
    }
}

impl StatusMap {
    /// Extend the default table with extra `raw → target` aliases.
    ///
    /// Targets are themselves resolved through the default table, so
    /// `"warm lead" = "interested"` works. Aliases whose target does not
    /// resolve are skipped with a warning.
    pub fn with_aliases<I, K, V>(aliases: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut map = Self::default();
        for (raw, target) in aliases {
            match lookup_default(target.as_ref()) {
                Some(status) => {
                    map.entries.insert(canonical_key(raw.as_ref()), status);
                }
                None => log::warn!(
                    "Ignoring status alias '{}': unknown target '{}'",
                    raw.as_ref(),
                    target.as_ref()
                ),
            }
        }
        map
    }

    /// Map a raw status string; unmapped or empty values become `Unknown`.
    pub fn lookup(&self, raw: &str) -> LeadStatus {
        self.entries
            .get(&canonical_key(raw))
            .copied()
            .unwrap_or(LeadStatus::Unknown)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn lookup_default(raw: &str) -> Option<LeadStatus> {
    DEFAULT_ALIASES.get(canonical_key(raw).as_str()).copied()
}

impl std::str::FromStr for LeadStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        lookup_default(s).ok_or_else(|| format!("unrecognized status '{s}'"))
    }
}
