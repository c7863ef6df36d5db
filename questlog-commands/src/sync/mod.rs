/// Award flow: progression, optimistic update, merge write.
pub mod award;
/// Session bootstrap and live subscription.
pub mod bootstrap;

pub use award::{AwardReport, award_points};
pub use bootstrap::{SyncHandle, load_or_initialize};

pub const NOT_READY_MESSAGE: &str =
    "System not ready. Wait for loading to finish or check the store connection.";
pub const LOADED_MESSAGE: &str = "Skill data loaded!";
pub const INITIALIZED_MESSAGE: &str = "Skill data initialized!";
pub const LIVE_DATA_ERROR_MESSAGE: &str = "Failed to load live data. Try restarting.";
