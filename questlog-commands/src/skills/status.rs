use questlog_core::Session;
use questlog_progression::Skill;
use questlog_utils::formatting::skill_card;

use crate::{CommandMeta, Reply};

pub const META: CommandMeta = CommandMeta {
    name: "status",
    desc: "Shows every skill's level and progress.",
    category: "skills",
    usage: "status",
};

pub fn status(session: &Session) -> Reply {
    let mut lines = Vec::new();
    if let Some(warning) = session.warning() {
        lines.push(format!("! {warning}"));
    }
    if session.busy().is_busy() {
        lines.push("(syncing...)".to_owned());
    }

    let progress = session.progress();
    for skill in Skill::ALL {
        let tracked = progress.tracked(skill);
        let mut card = skill_card(skill, &tracked.record);
        if progress.is_pending(skill) {
            card.push_str(" *");
        }
        lines.push(card);
    }

    Reply::Lines(lines)
}
