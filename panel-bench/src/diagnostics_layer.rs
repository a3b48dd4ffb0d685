//! Tracing layer that keeps recent warnings for the console `status` command

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

/// Crates that belong to this project (for filtering)
const PROJECT_CRATES: &[&str] = &["videopanel", "panel_core", "panel_sim"];

/// A warning or error captured from tracing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticEvent {
    /// Module the event came from, simplified for display
    pub source: String,
    /// Severity level
    pub level: Level,
    /// Log message
    pub message: String,
}

/// Bounded history of captured events, shared with the console
#[derive(Debug, Clone)]
pub struct DiagnosticLog {
    recent: Arc<Mutex<VecDeque<DiagnosticEvent>>>,
    total: Arc<AtomicUsize>,
    capacity: usize,
}

impl DiagnosticLog {
    /// Keep at most `capacity` events; older ones are forgotten
    pub fn new(capacity: usize) -> Self {
        Self {
            recent: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            total: Arc::new(AtomicUsize::new(0)),
            capacity,
        }
    }

    fn record(&self, event: DiagnosticEvent) {
        self.total.fetch_add(1, Ordering::Relaxed);
        if self.capacity == 0 {
            return;
        }
        let mut recent = self.recent.lock().unwrap_or_else(PoisonError::into_inner);
        if recent.len() == self.capacity {
            recent.pop_front();
        }
        recent.push_back(event);
    }

    /// Events still in the history, oldest first
    pub fn recent(&self) -> Vec<DiagnosticEvent> {
        self.recent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    /// Events captured since startup, including forgotten ones
    pub fn total(&self) -> usize {
        self.total.load(Ordering::Relaxed)
    }
}

/// Layer that copies project warnings and errors into a [`DiagnosticLog`]
pub struct DiagnosticsLayer {
    log: DiagnosticLog,
}

impl DiagnosticsLayer {
    pub fn new(log: DiagnosticLog) -> Self {
        Self { log }
    }
}

impl<S: Subscriber> Layer<S> for DiagnosticsLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        if *meta.level() > Level::WARN {
            return;
        }

        let target = meta.target();
        if !PROJECT_CRATES
            .iter()
            .any(|crate_name| target.starts_with(crate_name))
        {
            return;
        }

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        self.log.record(DiagnosticEvent {
            source: simplify_target(target),
            level: *meta.level(),
            message: visitor.message.unwrap_or_default(),
        });
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: Option<String>,
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = Some(format!("{:?}", value));
        }
    }
}

/// Last module path segment, e.g. `panel_core::buffers` -> `buffers`
fn simplify_target(target: &str) -> String {
    target.rsplit("::").next().unwrap_or(target).to_string()
}
