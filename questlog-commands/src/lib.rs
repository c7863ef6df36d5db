pub mod skills;
pub mod sync;
pub mod utility;

use questlog_core::Session;

pub struct CommandMeta {
    pub name: &'static str,
    pub desc: &'static str,
    pub category: &'static str,
    pub usage: &'static str,
}

pub const COMMANDS: &[CommandMeta] = &[
    skills::status::META,
    skills::award::META,
    skills::activity::META,
    skills::activities::META,
    utility::whoami::META,
    utility::help::META,
    utility::quit::META,
];

/// What the front end should do after a command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reply {
    Lines(Vec<String>),
    Quit,
}

impl Reply {
    pub fn line(text: impl Into<String>) -> Self {
        Self::Lines(vec![text.into()])
    }
}

/// Run one line of input against the session.
pub async fn dispatch(session: &Session, input: &str) -> Reply {
    let mut parts = input.split_whitespace();
    let Some(name) = parts.next() else {
        return Reply::Lines(Vec::new());
    };
    let args: Vec<&str> = parts.collect();

    match name.to_ascii_lowercase().as_str() {
        "status" => skills::status::status(session),
        "award" => skills::award::award(session, &args).await,
        "do" => skills::activity::activity(session, &args).await,
        "activities" => skills::activities::activities(&args),
        "whoami" => utility::whoami::whoami(session),
        "help" => utility::help::help(&args),
        "quit" | "exit" => Reply::Quit,
        other => Reply::line(unknown_command_message(other)),
    }
}

pub fn usage_message(usage: &str) -> String {
    format!("Usage: `{usage}`")
}

fn unknown_command_message(name: &str) -> String {
    format!("Unknown command `{name}`. Type `help` for the list of commands.")
}

#[cfg(test)]
mod tests {
    use questlog_core::Session;

    use super::{COMMANDS, Reply, dispatch};

    #[tokio::test]
    async fn blank_input_does_nothing() {
        let session = Session::new("app");
        assert_eq!(dispatch(&session, "   ").await, Reply::Lines(Vec::new()));
    }

    #[tokio::test]
    async fn quit_and_unknown_commands() {
        let session = Session::new("app");
        assert_eq!(dispatch(&session, "QUIT").await, Reply::Quit);
        assert_eq!(dispatch(&session, "exit").await, Reply::Quit);

        let Reply::Lines(lines) = dispatch(&session, "dance").await else {
            panic!("expected lines");
        };
        assert!(lines[0].contains("`dance`"));
    }

    #[test]
    fn command_names_are_unique() {
        let mut names: Vec<&str> = COMMANDS.iter().map(|c| c.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), COMMANDS.len());
    }
}
