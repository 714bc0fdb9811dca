use shared::domain::BotRecord;

use crate::config::BotEntry;

/// Known bots, fixed for the lifetime of a dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotRegistry {
    bots: Vec<BotRecord>,
}

impl BotRegistry {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, S)>,
        S: Into<String>,
    {
        Self {
            bots: entries
                .into_iter()
                .map(|(id, name)| BotRecord::new(id, name))
                .collect(),
        }
    }

    pub fn from_entries(entries: &[BotEntry]) -> Self {
        Self::new(
            entries
                .iter()
                .map(|entry| (entry.id.clone(), entry.name.clone())),
        )
    }

    pub fn into_records(self) -> Vec<BotRecord> {
        self.bots
    }
}
