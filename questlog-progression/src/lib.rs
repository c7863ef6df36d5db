/// Threshold formula and point awards.
pub mod leveling;
/// Tracked skill categories.
pub mod skill;

pub use leveling::{AwardOutcome, SkillRecord, apply_points, points_to_next_level};
pub use skill::Skill;
