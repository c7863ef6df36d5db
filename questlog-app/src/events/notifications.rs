use tokio::task::JoinHandle;

use questlog_core::{Notification, Session, Severity};

fn format_notification(notification: &Notification) -> String {
    let marker = match notification.severity {
        Severity::Info => "[i]",
        Severity::Success => "[ok]",
        Severity::Error => "[!]",
    };
    format!("{marker} {}", notification.text)
}

/// Print whatever is in the slot right now, e.g. warnings raised while connecting.
pub fn print_current(session: &Session) {
    if let Some(notification) = session.notifier().current() {
        println!("{}", format_notification(&notification));
    }
}

/// Print every notification as it is shown. Clears are silent.
pub fn spawn_printer(session: &Session) -> JoinHandle<()> {
    let mut updates = session.notifier().subscribe();
    tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let current = updates.borrow_and_update().clone();
            if let Some(notification) = current {
                println!("{}", format_notification(&notification));
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use questlog_core::{Notification, Severity};

    use super::format_notification;

    #[test]
    fn marks_severity() {
        assert_eq!(
            format_notification(&Notification::new("saved", Severity::Success)),
            "[ok] saved"
        );
        assert_eq!(
            format_notification(&Notification::new("nope", Severity::Error)),
            "[!] nope"
        );
        assert_eq!(
            format_notification(&Notification::new("hi", Severity::Info)),
            "[i] hi"
        );
    }
}
