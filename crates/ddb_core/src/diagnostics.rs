//! Structured trace events emitted by the extractors.
//!
//! Extraction never prints. Callers that want to observe how a value was
//! found pass a [`Diagnostics`] sink; the default sink drops everything.

use std::cell::RefCell;

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Diagnostic {
    SpellDiscovered {
        name: String,
        path: &'static str,
    },
    SpellMerged {
        name: String,
        path: &'static str,
    },
    SpellUnprepared {
        name: String,
    },
    DamageFromDescription {
        spell: String,
        dice: String,
    },
    AttackStrategy {
        strategy: &'static str,
        count: usize,
    },
    UnarmedStrikeSynthesized {
        attack_bonus: i32,
        damage: String,
    },
    ValueResolved {
        field: &'static str,
        source: &'static str,
        value: i64,
    },
}

pub trait Diagnostics {
    fn record(&self, event: Diagnostic);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoDiagnostics;

impl Diagnostics for NoDiagnostics {
    fn record(&self, _event: Diagnostic) {}
}

/// Forwards every event to `tracing` at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn record(&self, event: Diagnostic) {
        tracing::debug!(?event, "pipeline diagnostic");
    }
}

/// Keeps events in memory so tests can assert on them.
#[derive(Debug, Default)]
pub struct RecordingDiagnostics {
    events: RefCell<Vec<Diagnostic>>,
}

impl RecordingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&self) -> Vec<Diagnostic> {
        self.events.take()
    }
}

impl Diagnostics for RecordingDiagnostics {
    fn record(&self, event: Diagnostic) {
        self.events.borrow_mut().push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_sink_drains_in_order() {
        let sink = RecordingDiagnostics::new();
        sink.record(Diagnostic::SpellUnprepared {
            name: "Bless".to_string(),
        });
        sink.record(Diagnostic::AttackStrategy {
            strategy: "inventory",
            count: 2,
        });

        let events = sink.take();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[1], Diagnostic::AttackStrategy { count: 2, .. }));
        assert!(sink.take().is_empty());
    }
}
