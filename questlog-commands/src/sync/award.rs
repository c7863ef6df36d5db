use tracing::{error, info, warn};

use questlog_core::Session;
use questlog_database::impls::progress::merge_skill;
use questlog_progression::{AwardOutcome, Skill, apply_points};
use questlog_utils::formatting::{level_up_message, points_added_message};

use crate::sync::NOT_READY_MESSAGE;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AwardReport {
    /// No store or no signed-in user; nothing was attempted.
    Rejected,
    Saved { outcome: AwardOutcome, version: u64 },
    /// The merge failed. `reverted` tells whether the optimistic record was rolled back.
    Failed { outcome: AwardOutcome, reverted: bool },
}

/// Award points to one skill and merge the new record into the user's document.
///
/// The local record is updated before the write and reverted if the write fails.
/// Every outcome is reported through the session's notification slot.
pub async fn award_points(session: &Session, skill: Skill, points_to_add: u64) -> AwardReport {
    let (Some(store), Some(path)) = (session.store(), session.progress_path()) else {
        warn!(skill = %skill, "award rejected: session not ready");
        session.notifier().error(NOT_READY_MESSAGE);
        return AwardReport::Rejected;
    };

    let _busy = session.busy().enter();

    let (outcome, write) = {
        let mut progress = session.progress();
        let outcome = apply_points(&progress.record(skill), points_to_add);
        let write = progress.begin_write(skill, outcome.record);
        (outcome, write)
    };

    match merge_skill(store, &path, skill, outcome.record).await {
        Ok(version) => {
            session.progress().confirm_write(&write, version);
            info!(
                skill = %skill,
                points = points_to_add,
                level = outcome.record.level,
                levels_gained = outcome.levels_gained,
                version,
                "award saved"
            );

            let text = if outcome.leveled_up() {
                level_up_message(skill, outcome.record.level)
            } else {
                points_added_message(skill, points_to_add)
            };
            session.notifier().success(text);

            AwardReport::Saved { outcome, version }
        }
        Err(err) => {
            error!(?err, skill = %skill, "failed to save award");
            let reverted = session.progress().fail_write(&write);

            let text = if reverted {
                format!("Failed to update {skill}: {err:#}. Change reverted.")
            } else {
                format!("Failed to update {skill}: {err:#}")
            };
            session.notifier().error(text);

            AwardReport::Failed { outcome, reverted }
        }
    }
}
