use crate::{COMMANDS, CommandMeta, Reply};

pub const META: CommandMeta = CommandMeta {
    name: "help",
    desc: "Lists out all available commands.",
    category: "utility",
    usage: "help [category]",
};

pub fn help(args: &[&str]) -> Reply {
    let category = args.first().map(|raw| raw.to_ascii_lowercase());

    let mut categories: Vec<&str> = COMMANDS.iter().map(|c| c.category).collect();
    categories.sort_unstable();
    categories.dedup();

    if let Some(wanted) = category.as_deref()
        && !categories.contains(&wanted)
    {
        return Reply::line(format!(
            "Unknown category `{wanted}`. Categories: {}",
            categories.join(", ")
        ));
    }

    let mut lines = Vec::new();
    for current in categories {
        if category.as_deref().is_some_and(|wanted| wanted != current) {
            continue;
        }

        lines.push(format!("{}:", capitalize(current)));
        for command in COMMANDS.iter().filter(|c| c.category == current) {
            lines.push(format!("  {:<26} {}", command.usage, command.desc));
        }
    }

    Reply::Lines(lines)
}

fn capitalize(raw: &str) -> String {
    let mut chars = raw.chars();
    match chars.next() {
        Some(first) => format!("{}{}", first.to_uppercase(), chars.as_str()),
        None => String::new(),
    }
}
