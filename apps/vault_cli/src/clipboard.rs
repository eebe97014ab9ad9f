use arboard::Clipboard;
use wallet_core::ClipboardWriter;

/// OS clipboard; opened per write so the handle is never held between copies.
pub struct SystemClipboard;

impl ClipboardWriter for SystemClipboard {
    fn write_text(&self, text: &str) -> anyhow::Result<()> {
        let mut clipboard = Clipboard::new()?;
        clipboard.set_text(text.to_owned())?;
        Ok(())
    }
}
