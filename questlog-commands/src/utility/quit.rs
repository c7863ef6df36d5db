use crate::CommandMeta;

pub const META: CommandMeta = CommandMeta {
    name: "quit",
    desc: "Leaves the tracker.",
    category: "utility",
    usage: "quit",
};
