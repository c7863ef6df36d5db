use questlog_progression::Skill;

use crate::{CommandMeta, Reply};

pub const META: CommandMeta = CommandMeta {
    name: "activities",
    desc: "Lists the activities that can be logged.",
    category: "skills",
    usage: "activities [skill]",
};

/// A loggable activity and the points it is worth.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Activity {
    pub name: &'static str,
    pub label: &'static str,
    pub skill: Skill,
    pub points: u64,
    pub bonus: bool,
}

const fn activity(name: &'static str, label: &'static str, skill: Skill, points: u64) -> Activity {
    Activity {
        name,
        label,
        skill,
        points,
        bonus: false,
    }
}

const fn bonus(name: &'static str, label: &'static str, skill: Skill, points: u64) -> Activity {
    Activity {
        name,
        label,
        skill,
        points,
        bonus: true,
    }
}

pub const ACTIVITIES: &[Activity] = &[
    activity("pushup", "One push-up", Skill::Strength, 1),
    activity("lift", "Lifting session", Skill::Strength, 5),
    bonus("breakthrough", "Pushed past a limit", Skill::Strength, 15),
    activity("run", "5 km run", Skill::Cardio, 5),
    activity("walk", "2 km walk", Skill::Cardio, 2),
    bonus("sprint", "Sprint intervals", Skill::Cardio, 10),
    activity("book", "Finished a book", Skill::Intelligence, 20),
    activity("study", "Focused study", Skill::Intelligence, 10),
    activity("practice", "Hands-on learning", Skill::Intelligence, 30),
    bonus("share", "Shared what you learned", Skill::Intelligence, 20),
    activity("motivate", "Motivated someone", Skill::Camaraderie, 15),
    activity("support", "Active support", Skill::Camaraderie, 10),
    activity("celebrate", "Celebrated together", Skill::Camaraderie, 20),
    bonus("bond", "Team bonding", Skill::Camaraderie, 25),
];

pub fn find_activity(name: &str) -> Option<&'static Activity> {
    let wanted = name.trim();
    ACTIVITIES
        .iter()
        .find(|activity| activity.name.eq_ignore_ascii_case(wanted))
}

pub fn activities_for(skill: Skill) -> impl Iterator<Item = &'static Activity> {
    ACTIVITIES
        .iter()
        .filter(move |activity| activity.skill == skill)
}

pub fn activities(args: &[&str]) -> Reply {
    let skills: Vec<Skill> = match args.first() {
        Some(raw) => match Skill::parse(raw) {
            Some(skill) => vec![skill],
            None => return Reply::line(format!("Unknown skill `{raw}`.")),
        },
        None => Skill::ALL.to_vec(),
    };

    let mut lines = Vec::new();
    for skill in skills {
        lines.push(format!("{skill}:"));
        for activity in activities_for(skill) {
            let marker = if activity.bonus { " (bonus)" } else { "" };
            lines.push(format!(
                "  {:<13} +{:<3} {}{}",
                activity.name, activity.points, activity.label, marker
            ));
        }
    }
    Reply::Lines(lines)
}

#[cfg(test)]
mod tests {
    use questlog_progression::Skill;

    use super::{ACTIVITIES, activities, activities_for, find_activity};
    use crate::Reply;

    #[test]
    fn every_skill_has_activities_and_one_bonus() {
        for skill in Skill::ALL {
            let listed: Vec<_> = activities_for(skill).collect();
            assert!(listed.len() >= 3, "{skill}");
            assert_eq!(listed.iter().filter(|a| a.bonus).count(), 1, "{skill}");
        }
    }

    #[test]
    fn names_are_unique() {
        let mut names: Vec<&str> = ACTIVITIES.iter().map(|a| a.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), ACTIVITIES.len());
    }

    #[test]
    fn finds_activity_case_insensitively() {
        let run = find_activity(" RUN ").unwrap();
        assert_eq!(run.skill, Skill::Cardio);
        assert_eq!(run.points, 5);
        assert!(find_activity("nap").is_none());
    }

    #[test]
    fn lists_single_skill() {
        let Reply::Lines(lines) = activities(&["cardio"]) else {
            panic!("expected lines");
        };
        assert_eq!(lines[0], "Cardio:");
        assert_eq!(lines.len(), 4);
        assert!(lines[3].ends_with("(bonus)"));

        assert_eq!(
            activities(&["charisma"]),
            Reply::line("Unknown skill `charisma`.")
        );
    }
}
