use super::model::{Content, SLOTS_PER_DAY};
use crate::prelude::*;
use crate::Result;
use async_trait::async_trait;
use chrono::prelude::*;

/// Single content item routed to a concrete slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Assignment {
    pub(crate) date: NaiveDate,
    pub(crate) channel: String,
    pub(crate) slot: u8,
    pub(crate) content: Content,
}

/// Several content items routed to the same date and channel. The slots
/// are assigned in the order of submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct BulkAssignment {
    pub(crate) date: NaiveDate,
    pub(crate) channel: String,
    pub(crate) items: Vec<Content>,
}

impl BulkAssignment {
    /// Items past the daily slot count are dropped
    pub(crate) fn slots(self) -> impl Iterator<Item = Assignment> {
        let Self {
            date,
            channel,
            items,
        } = self;

        (1..=SLOTS_PER_DAY)
            .zip(items)
            .map(move |(slot, content)| Assignment {
                date,
                channel: channel.clone(),
                slot,
                content,
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct BulkOutcome {
    /// Slots that were saved in the ascending order
    pub(crate) saved: Vec<u8>,
    pub(crate) attempted: usize,
}

impl BulkOutcome {
    pub(crate) fn succeeded(&self) -> usize {
        self.saved.len()
    }
}

#[async_trait]
pub(crate) trait SlotAssigner: Send + Sync {
    async fn assign(&self, assignment: &Assignment) -> Result;
}

/// Commits every item of the bulk one by one. A failure of a single item
/// is logged and doesn't stop the rest.
pub(crate) async fn assign_bulk(assigner: &dyn SlotAssigner, bulk: BulkAssignment) -> BulkOutcome {
    let mut outcome = BulkOutcome {
        saved: vec![],
        attempted: 0,
    };

    for assignment in bulk.slots() {
        outcome.attempted += 1;

        match assigner.assign(&assignment).await {
            Ok(()) => outcome.saved.push(assignment.slot),
            Err(err) => warn!(
                err = tracing_err(&err),
                slot = assignment.slot,
                channel = %assignment.channel,
                "Failed to assign bulk item, skipping it"
            ),
        }
    }

    outcome
}
