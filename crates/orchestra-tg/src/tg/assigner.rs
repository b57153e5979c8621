use crate::pipeline::{Assignment, Content, SlotAssigner};
use crate::prelude::*;
use crate::{db, drive, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// Stores the content in the database and mirrors scripts to Google Drive
pub(crate) struct ContentAssigner {
    pub(crate) db: Arc<db::Repo>,
    pub(crate) drive: Option<Arc<drive::DriveTree>>,
}

#[async_trait]
impl SlotAssigner for ContentAssigner {
    #[instrument(skip_all, fields(
        date = %assignment.date,
        channel = %assignment.channel,
        slot = assignment.slot,
        content = assignment.content.label(),
    ))]
    async fn assign(&self, assignment: &Assignment) -> Result {
        let channel = self.db.channels.get(&assignment.channel).await?;

        // Two separate statements, the slot may be observed with stale
        // fields in between
        self.db
            .slots
            .ensure(channel.id, assignment.date, assignment.slot)
            .await?;

        self.db
            .slots
            .update(
                channel.id,
                assignment.date,
                assignment.slot,
                &assignment.content.to_patch(),
            )
            .await?;

        metrics::counter!(
            "slot_assignments_total",
            "content" => assignment.content.label()
        )
        .increment(1);

        if let (Content::Script { text }, Some(drive)) = (&assignment.content, &self.drive) {
            let result = drive
                .upload_script(assignment.date, &assignment.channel, assignment.slot, text)
                .await;

            // Drive copy is best effort, the database is the source of truth
            if let Err(err) = result {
                warn!(err = tracing_err(&err), "Failed to mirror the script to Google Drive");
            }
        }

        Ok(())
    }
}
