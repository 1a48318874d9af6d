//! Key listing pages.

use crate::tracker::{TrackerError, TrackerResponse};

/// One page of keys from `list_keys`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyPage {
    pub keys:       Vec<String>,
    /// Cursor to pass as `after` for the next page.
    pub next_after: Option<String>,
}

impl KeyPage {
    pub fn empty() -> Self { Self::default() }

    /// Decode `key_count`, `key_1..key_N` and `next_after`.
    pub fn from_response(response: &TrackerResponse) -> Result<Self, TrackerError> {
        let count = response.get_u64("key_count")?.unwrap_or(0);
        let keys = (1..=count)
            .map(|i| response.require(&format!("key_{i}")).map(str::to_string))
            .collect::<Result<Vec<_>, _>>()?;
        let next_after = response
            .get("next_after")
            .filter(|cursor| !cursor.is_empty())
            .map(str::to_string);
        Ok(Self { keys, next_after })
    }

    pub fn is_empty(&self) -> bool { self.keys.is_empty() }

    /// The cursor for the page after this one, or `None` when listing is
    /// done: the page was empty, had no cursor, or did not advance past
    /// `previous`.
    pub fn advance(&self, previous: Option<&str>) -> Option<&str> {
        if self.keys.is_empty() {
            return None;
        }
        self.next_after
            .as_deref()
            .filter(|next| Some(*next) != previous)
    }
}
