use questlog_progression::{Skill, SkillRecord};

/// Rank names by level, starting at level 1.
pub const LEVEL_TITLES: &[&str] = &[
    "Novice",
    "Aspirant",
    "Apprentice",
    "Practitioner",
    "Adept",
    "Competent",
    "Specialist",
    "Master",
    "Visionary",
    "Legendary",
    "Shadow Monarch",
];

const PROGRESS_BAR_WIDTH: usize = 20;

/// Rank name for `level`; every level past the table keeps the last title.
pub fn level_title(level: u32) -> &'static str {
    let index = usize::try_from(level.max(1))
        .unwrap_or(usize::MAX)
        .min(LEVEL_TITLES.len())
        - 1;
    LEVEL_TITLES[index]
}

/// Whole-number share of the current level earned, capped at 100.
pub fn progress_percent(record: &SkillRecord) -> u8 {
    let percent = (record.progress_ratio() * 100.0).round().clamp(0.0, 100.0);
    percent as u8
}

pub fn progress_bar(record: &SkillRecord, width: usize) -> String {
    let ratio = record.progress_ratio().clamp(0.0, 1.0);
    let filled = ((ratio * width as f64).floor() as usize).min(width);
    format!("{}{}", "#".repeat(filled), "-".repeat(width - filled))
}

/// One-line summary, e.g. `Strength     Lv 3   APPRENTICE      [######--------------]  21% (30/140)`.
pub fn skill_card(skill: Skill, record: &SkillRecord) -> String {
    format!(
        "{:<13}Lv {:<4} {:<15} [{}] {:>3}% ({}/{})",
        skill.key(),
        record.level,
        level_title(record.level).to_ascii_uppercase(),
        progress_bar(record, PROGRESS_BAR_WIDTH),
        progress_percent(record),
        record.current_points,
        record.points_to_next_level,
    )
}

pub fn level_up_message(skill: Skill, level: u32) -> String {
    format!("Congratulations! Your {skill} skill reached level {level}!")
}

pub fn points_added_message(skill: Skill, points: u64) -> String {
    format!("+{points} points for {skill}!")
}
