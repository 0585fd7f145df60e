//! Expansion identifiers.

use derive_more::Display;
use uuid::Uuid;

/// Tags every log line of one top-level include expansion and everything
/// nested under it. UUIDv7, so identifiers sort by creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[display("{_0}")]
pub struct ExpansionId(Uuid);

impl ExpansionId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for ExpansionId {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_distinct() {
        assert_ne!(ExpansionId::new(), ExpansionId::new());
    }

    #[test]
    fn test_display_is_hyphenated_uuid() {
        let shown = ExpansionId::new().to_string();
        assert_eq!(shown.len(), 36);
        assert_eq!(shown.matches('-').count(), 4);
    }
}
