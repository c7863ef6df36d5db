use serde::{Deserialize, Serialize};

/// Points needed to clear the first level.
pub const BASE_THRESHOLD: u64 = 100;
/// Extra points required for every level past the first.
pub const THRESHOLD_STEP: u64 = 20;

/// Points required to advance from `level` to `level + 1`.
pub fn points_to_next_level(level: u32) -> u64 {
    if level <= 1 {
        return BASE_THRESHOLD;
    }

    BASE_THRESHOLD + u64::from(level - 1) * THRESHOLD_STEP
}

/// Progression state for one skill.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillRecord {
    pub level: u32,
    pub current_points: u64,
    pub points_to_next_level: u64,
}

impl SkillRecord {
    pub fn new() -> Self {
        Self {
            level: 1,
            current_points: 0,
            points_to_next_level: points_to_next_level(1),
        }
    }

    /// Rebuild the record from `level` and `current_points` only.
    ///
    /// The stored threshold is ignored and recomputed, a zero level becomes 1,
    /// and points at or above the threshold are carried into further levels.
    pub fn normalized(self) -> Self {
        let base = Self {
            level: self.level.max(1),
            current_points: 0,
            points_to_next_level: points_to_next_level(self.level.max(1)),
        };
        apply_points(&base, self.current_points).record
    }

    /// Whether `0 <= current_points < points_to_next_level(level)` holds.
    pub fn is_normalized(&self) -> bool {
        self.level >= 1
            && self.points_to_next_level == points_to_next_level(self.level)
            && self.current_points < self.points_to_next_level
    }

    /// Fraction of the current level already earned, in `[0, 1)` for normalized records.
    pub fn progress_ratio(&self) -> f64 {
        if self.points_to_next_level == 0 {
            return 0.0;
        }
        self.current_points as f64 / self.points_to_next_level as f64
    }
}

impl Default for SkillRecord {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of awarding points to a skill.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AwardOutcome {
    pub record: SkillRecord,
    pub levels_gained: u32,
}

impl AwardOutcome {
    pub fn leveled_up(&self) -> bool {
        self.levels_gained > 0
    }
}

/// Award `points_to_add` to `record`, carrying excess points over as many levels as they cover.
///
/// Equivalent to adding the points and then repeatedly subtracting the current
/// threshold and advancing a level while the points still reach it. The number
/// of levels is found by bisection so very large awards stay cheap.
pub fn apply_points(record: &SkillRecord, points_to_add: u64) -> AwardOutcome {
    let level = record.level.max(1);
    let points = record.current_points.saturating_add(points_to_add);

    let gained = affordable_levels(level, points);
    let spent = cost_of_levels(level, u64::from(gained));
    let remaining = u128::from(points) - spent;
    let new_level = level + gained;

    AwardOutcome {
        record: SkillRecord {
            level: new_level,
            // `remaining` is below the next threshold, which fits in u64.
            current_points: u64::try_from(remaining).unwrap_or(u64::MAX),
            points_to_next_level: points_to_next_level(new_level),
        },
        levels_gained: gained,
    }
}

/// Total points needed to climb `count` levels starting at `level` (`level >= 1`).
fn cost_of_levels(level: u32, count: u64) -> u128 {
    let first = u128::from(points_to_next_level(level));
    let count = u128::from(count);
    let step = u128::from(THRESHOLD_STEP);
    count * first + step * count * count.saturating_sub(1) / 2
}

/// Largest number of levels `points` can pay for from `level`.
fn affordable_levels(level: u32, points: u64) -> u32 {
    let budget = u128::from(points);
    let mut low = 0_u32;
    let mut high = u32::MAX - level;

    while low < high {
        let mid = low + (high - low).div_ceil(2);
        if cost_of_levels(level, u64::from(mid)) <= budget {
            low = mid;
        } else {
            high = mid - 1;
        }
    }

    low
}
