//! Navigation subscriber trait

use super::NavigationContext;

/// Trait for components that need to respond to session state changes
/// (chapter lists repainting their read/unread partition, a presenter
/// following the scroll offset, and so on).
pub trait NavigationSubscriber: Send + Sync {
    /// Called after every observable state change.
    fn on_navigation_change(&self, context: &NavigationContext);
}
