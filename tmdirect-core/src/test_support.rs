//! Helpers shared by unit tests.

use std::sync::{Arc, Mutex};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

/// Collects the messages of WARN events.
#[derive(Clone, Default)]
struct WarnCollector(Arc<Mutex<Vec<String>>>);

impl<S: Subscriber> Layer<S> for WarnCollector {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() != Level::WARN {
            return;
        }
        let mut message = MessageVisitor::default();
        event.record(&mut message);
        self.0.lock().unwrap().push(message.0);
    }
}

#[derive(Default)]
struct MessageVisitor(String);

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.0 = format!("{value:?}");
        }
    }
}

/// Run `f` and return its result with every warning it logged.
pub(crate) fn capture_warnings<R>(f: impl FnOnce() -> R) -> (R, Vec<String>) {
    let collector = WarnCollector::default();
    let subscriber = tracing_subscriber::registry().with(collector.clone());
    let result = tracing::subscriber::with_default(subscriber, f);
    let warnings = collector.0.lock().unwrap().clone();
    (result, warnings)
}
