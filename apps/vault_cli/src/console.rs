use std::io::{self, BufRead, Write};

use async_trait::async_trait;
use tracing::error;
use wallet_core::{Notification, NotificationIcon, Notifier};

/// Reads one line from stdin off the runtime. `None` on EOF or read failure.
/// Shell input and confirmation prompts share the process-wide stdin buffer.
pub async fn read_line() -> Option<String> {
    let read = tokio::task::spawn_blocking(|| {
        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(line),
            Err(err) => {
                error!("console: failed to read stdin: {err}");
                None
            }
        }
    });
    read.await.ok().flatten()
}

pub fn prompt(text: &str) {
    print!("{text}");
    let _ = io::stdout().flush();
}

pub fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

fn icon_tag(icon: NotificationIcon) -> &'static str {
    match icon {
        NotificationIcon::Success => "ok",
        NotificationIcon::Error => "error",
        NotificationIcon::Warning => "warn",
        NotificationIcon::Info => "info",
    }
}

pub struct TerminalNotifier {
    assume_yes: bool,
}

impl TerminalNotifier {
    pub fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }
}

#[async_trait]
impl Notifier for TerminalNotifier {
    async fn inform(&self, notification: Notification) {
        println!(
            "[{}] {}: {}",
            icon_tag(notification.icon),
            notification.title,
            notification.text
        );
    }

    async fn confirm(&self, notification: Notification) -> bool {
        let cancel = notification.cancel_label.as_deref().unwrap_or("Cancel");
        if self.assume_yes {
            println!(
                "{} {} [{}]",
                notification.title, notification.text, notification.confirm_label
            );
            return true;
        }
        prompt(&format!(
            "{} {} [y = {}, n = {}] ",
            notification.title, notification.text, notification.confirm_label, cancel
        ));
        read_line().await.is_some_and(|answer| is_yes(&answer))
    }
}
