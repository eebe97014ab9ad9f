use async_trait::async_trait;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationIcon {
    Success,
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub text: String,
    pub icon: NotificationIcon,
    pub confirm_label: String,
    /// Present only for yes/no prompts.
    pub cancel_label: Option<String>,
}

impl Notification {
    fn new(icon: NotificationIcon, title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
            icon,
            confirm_label: "OK".into(),
            cancel_label: None,
        }
    }

    pub fn success(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(NotificationIcon::Success, title, text)
    }

    pub fn error(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(NotificationIcon::Error, title, text)
    }

    pub fn warning(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(NotificationIcon::Warning, title, text)
    }

    pub fn question(
        title: impl Into<String>,
        text: impl Into<String>,
        confirm_label: impl Into<String>,
        cancel_label: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
            icon: NotificationIcon::Warning,
            confirm_label: confirm_label.into(),
            cancel_label: Some(cancel_label.into()),
        }
    }
}

/// Blocking dialog service. `confirm` returns `false` for "no" and for a
/// dismissed dialog alike.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn inform(&self, notification: Notification);
    async fn confirm(&self, notification: Notification) -> bool;
}

/// Headless notifier: writes to the log and declines every prompt.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn inform(&self, notification: Notification) {
        match notification.icon {
            NotificationIcon::Error => {
                error!(title = %notification.title, "{}", notification.text)
            }
            NotificationIcon::Warning => {
                warn!(title = %notification.title, "{}", notification.text)
            }
            NotificationIcon::Success | NotificationIcon::Info => {
                info!(title = %notification.title, "{}", notification.text)
            }
        }
    }

    async fn confirm(&self, notification: Notification) -> bool {
        warn!(
            title = %notification.title,
            "declining prompt without an interactive notifier: {}",
            notification.text
        );
        false
    }
}
