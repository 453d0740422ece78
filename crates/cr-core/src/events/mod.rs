use std::sync::Arc;

use ahash::AHashMap;
use parking_lot::Mutex;

/// System-wide event bus
pub struct EventBus {
    handlers: Arc<Mutex<AHashMap<std::any::TypeId, Vec<Box<dyn EventHandler>>>>>,
}

/// Event trait that all events must implement
pub trait Event: Send + Sync + 'static {
    fn as_any(&self) -> &dyn std::any::Any;
}

/// Handler trait for event handlers
pub trait EventHandler: Send + Sync {
    fn handle(&mut self, event: &dyn Event);
}

/// Session lifecycle events published by the engine
pub mod events {
    use super::Event;

    /// A chapter finished loading and is now on screen
    #[derive(Debug, Clone)]
    pub struct ChapterOpened {
        pub title: String,
        pub chapter: String,
        pub page_count: usize,
        pub resumed_at: i32,
    }

    /// The viewer closed (explicitly or by walking off a list boundary)
    #[derive(Debug, Clone)]
    pub struct ChapterClosed {
        pub title: String,
        pub chapter: String,
    }

    /// Archive extraction failed; the previous state was kept
    #[derive(Debug, Clone)]
    pub struct ExtractionFailed {
        pub chapter: String,
        pub error: String,
    }

    /// A progress record was written to disk
    #[derive(Debug, Clone)]
    pub struct ProgressSaved {
        pub title: String,
        pub chapter: String,
        pub position: i32,
    }

    // Implement Event trait for all event types
    macro_rules! impl_event {
        ($($t:ty),*) => {
            $(
                impl Event for $t {
                    fn as_any(&self) -> &dyn std::any::Any {
                        self
                    }
                }
            )*
        }
    }

    impl_event!(ChapterOpened, ChapterClosed, ExtractionFailed, ProgressSaved);
}

impl EventBus {
    /// Create a new event bus
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(Mutex::new(AHashMap::new())),
        }
    }

    /// Subscribe to events of a specific type
    pub fn subscribe<E: Event>(&self, handler: Box<dyn EventHandler>) {
        let type_id = std::any::TypeId::of::<E>();
        let mut handlers = self.handlers.lock();
        handlers.entry(type_id).or_insert_with(Vec::new).push(handler);
    }

    /// Publish an event
    pub fn publish<E: Event>(&self, event: E) {
        let type_id = std::any::TypeId::of::<E>();
        let mut handlers = self.handlers.lock();

        if let Some(event_handlers) = handlers.get_mut(&type_id) {
            for handler in event_handlers.iter_mut() {
                handler.handle(&event);
            }
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Helper struct for creating event handlers from closures
pub struct ClosureEventHandler<F> {
    handler: F,
}

impl<F> EventHandler for ClosureEventHandler<F>
where
    F: FnMut(&dyn Event) + Send + Sync,
{
    fn handle(&mut self, event: &dyn Event) {
        (self.handler)(event);
    }
}

/// Create an event handler from a closure
pub fn handler_from_fn<F>(f: F) -> Box<dyn EventHandler>
where
    F: FnMut(&dyn Event) + Send + Sync + 'static,
{
    Box::new(ClosureEventHandler { handler: f })
}
