use questlog_core::Session;

use crate::skills::activities::find_activity;
use crate::skills::award::award_reply;
use crate::{CommandMeta, Reply, usage_message};

pub const META: CommandMeta = CommandMeta {
    name: "do",
    desc: "Logs an activity from the catalog.",
    category: "skills",
    usage: "do <activity>",
};

pub async fn activity(session: &Session, args: &[&str]) -> Reply {
    let [name] = args else {
        return Reply::line(usage_message(META.usage));
    };

    let Some(activity) = find_activity(name) else {
        return Reply::line(format!(
            "Unknown activity `{name}`. Type `activities` to see them all."
        ));
    };

    award_reply(session, activity.skill, activity.points).await
}
