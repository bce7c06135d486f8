//! Stdout-only notification consumer, used with `--print`.

use tokio::sync::mpsc::UnboundedReceiver;

use dmon_models::{capitalize, Notification, ObjectNotification};

/// Line printed for an object notification.
pub fn format_notification(n: &ObjectNotification) -> String {
    format!(
        "***NOTIFICATION*** at {}: {} {}",
        n.t,
        capitalize(&n.classification),
        n.event
    )
}

/// Print every object notification until the channel closes.
pub async fn print_notifier(mut rx: UnboundedReceiver<Notification>) {
    while let Some(notification) = rx.recv().await {
        if let Notification::Object(n) = notification {
            println!("{}", format_notification(&n));
        }
    }
}
