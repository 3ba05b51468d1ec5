//! Text View Port

/// Text surface of the interactive display.
///
/// Only ever called from the [`MainThread`](crate::infrastructure::MainThread).
pub trait TextView: Send + Sync {
    fn set_text(&self, text: &str);
}
