use questlog_core::Session;
use questlog_progression::Skill;
use questlog_utils::formatting::skill_card;
use questlog_utils::parse::{is_negative_amount, parse_points};

use crate::sync::{AwardReport, award_points};
use crate::{CommandMeta, Reply, usage_message};

pub const META: CommandMeta = CommandMeta {
    name: "award",
    desc: "Awards any number of points to a skill.",
    category: "skills",
    usage: "award <skill> <points>",
};

pub async fn award(session: &Session, args: &[&str]) -> Reply {
    let [raw_skill, raw_points] = args else {
        return Reply::line(usage_message(META.usage));
    };

    let Some(skill) = Skill::parse(raw_skill) else {
        return Reply::line(format!("Unknown skill `{raw_skill}`."));
    };

    let Some(points) = parse_points(raw_points) else {
        if is_negative_amount(raw_points) {
            return Reply::line("Points cannot be negative.");
        }
        return Reply::line(format!("Invalid point amount `{raw_points}`."));
    };

    award_reply(session, skill, points).await
}

/// Run the award and show the skill's card as it stands afterwards.
pub(crate) async fn award_reply(session: &Session, skill: Skill, points: u64) -> Reply {
    match award_points(session, skill, points).await {
        AwardReport::Rejected => Reply::Lines(Vec::new()),
        AwardReport::Saved { .. } | AwardReport::Failed { .. } => {
            let record = session.progress().record(skill);
            Reply::line(skill_card(skill, &record))
        }
    }
}
