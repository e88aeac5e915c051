//! Side effects the engine hands back to its embedder.

use tracing::info;

/// Callbacks into the embedding host. The engine never does I/O itself.
pub trait HostBridge {
    /// Post-demo "copy" action.
    fn clipboard_write(&mut self, text: &str);

    /// Marketplace action, or completion of the escape hold.
    fn navigate_marketplace(&mut self);

    /// Escape-hold progress in 0..=1 while the gesture is active.
    fn esc_progress(&mut self, _progress: f32) {}
}

/// Host that remembers every side effect, for headless runs and tests.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordingHost {
    pub clipboard: Vec<String>,
    pub marketplace_visits: u32,
    pub last_esc_progress: Option<f32>,
}

impl HostBridge for RecordingHost {
    fn clipboard_write(&mut self, text: &str) {
        info!(text, "clipboard write");
        self.clipboard.push(text.to_owned());
    }

    fn navigate_marketplace(&mut self) {
        info!("navigate to marketplace");
        self.marketplace_visits += 1;
    }

    fn esc_progress(&mut self, progress: f32) {
        self.last_esc_progress = Some(progress);
    }
}

impl<H: HostBridge + ?Sized> HostBridge for &mut H {
    fn clipboard_write(&mut self, text: &str) {
        (**self).clipboard_write(text);
    }

    fn navigate_marketplace(&mut self) {
        (**self).navigate_marketplace();
    }

    fn esc_progress(&mut self, progress: f32) {
        (**self).esc_progress(progress);
    }
}
