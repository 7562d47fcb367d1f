pub mod category;
pub mod import;
pub mod link;
pub mod login_attempt;
pub mod patch;
pub mod snapshot;
pub mod token;

pub use category::{Category, CategoryPatch, CategoryWithLinks, NewCategory};
pub use import::{ExportDocument, ExportMeta, ImportGroup, ImportItem, ImportPayload, ImportReport, SkippedItem};
pub use link::{Link, LinkPatch, NewLink};
pub use login_attempt::{AttemptState, FailureTransition, LoginAttempt};
pub use patch::PatchValue;
pub use snapshot::{sanitize_groups, Snapshot, SnapshotGroup, SnapshotItem, WriteOutcome};
pub use token::{CreatedToken, Token};

use serde::{Deserialize, Deserializer};

/// Privacy flags arrive as `true`/`false` or as the `0`/`1` integers older exports used
#[derive(Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Int(i64),
}

impl From<Flag> for bool {
    fn from(flag: Flag) -> Self {
        match flag {
            Flag::Bool(b) => b,
            Flag::Int(i) => i != 0,
        }
    }
}

pub(crate) fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Flag::deserialize(deserializer).map(bool::from)
}

pub(crate) fn deserialize_optional_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Flag>::deserialize(deserializer).map(|flag| flag.map(bool::from))
}

/// Trim a user-supplied string and cut it to `max` characters
pub(crate) fn clip(value: &str, max: usize) -> String {
    value.trim().chars().take(max).collect()
}
