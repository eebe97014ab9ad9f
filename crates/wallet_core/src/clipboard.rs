use std::sync::Arc;

use shared::error::WalletError;
use tracing::error;

use crate::notify::{Notification, Notifier};

/// System clipboard access. Implementations acquire the clipboard per call and
/// release it before returning.
pub trait ClipboardWriter: Send + Sync {
    fn write_text(&self, text: &str) -> anyhow::Result<()>;
}

pub struct ClipboardService {
    writer: Arc<dyn ClipboardWriter>,
    notifier: Arc<dyn Notifier>,
}

impl ClipboardService {
    pub fn new(writer: Arc<dyn ClipboardWriter>, notifier: Arc<dyn Notifier>) -> Self {
        Self { writer, notifier }
    }

    pub async fn copy(&self, text: &str) -> Result<(), WalletError> {
        let writer = Arc::clone(&self.writer);
        let owned = text.to_string();
        let result = match tokio::task::spawn_blocking(move || writer.write_text(&owned)).await {
            Ok(result) => result.map_err(|err| err.to_string()),
            Err(join_err) => Err(join_err.to_string()),
        };

        match result {
            Ok(()) => {
                self.notifier
                    .inform(Notification::success(
                        "Success!",
                        "The address has been copied to the clipboard.",
                    ))
                    .await;
                Ok(())
            }
            Err(cause) => {
                error!("clipboard: error copying to clipboard: {cause}");
                self.notifier
                    .inform(Notification::error("Error", "Could not copy the address."))
                    .await;
                Err(WalletError::ClipboardFailure(cause))
            }
        }
    }
}
