use questlog_core::Session;
use questlog_core::auth::SignInMethod;

use crate::{CommandMeta, Reply};

pub const META: CommandMeta = CommandMeta {
    name: "whoami",
    desc: "Shows the signed-in user id.",
    category: "utility",
    usage: "whoami",
};

pub fn whoami(session: &Session) -> Reply {
    let Some(identity) = session.identity() else {
        return Reply::line("Not signed in.");
    };

    let method = match identity.method {
        SignInMethod::Anonymous => "anonymous",
        SignInMethod::CustomToken => "token",
    };
    Reply::line(format!(
        "{} ({method} sign-in, namespace `{}`)",
        identity.user_id,
        session.app_id()
    ))
}
