//! # Hint Sinks
//!
//! The diagnostics collaborator is anything implementing [`HintSink`].
//! [`TracingSink`] forwards hints to `tracing` at a level chosen from the
//! hint severity; [`CollectSink`] keeps them in memory for later rendering.

use std::sync::{Mutex, PoisonError};

use crate::hint::{Hint, Severity};

/// Receiver of structured hints.
pub trait HintSink {
    fn emit(&self, hint: &Hint);

    /// Emit every hint of an error tree.
    fn emit_all<'a>(&self, hints: impl IntoIterator<Item = &'a Hint>)
    where
        Self: Sized,
    {
        for hint in hints {
            self.emit(hint);
        }
    }
}

/// Forwards hints to the `tracing` subscriber, one event per node.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl TracingSink {
    fn emit_node(hint: &Hint, depth: usize) {
        let loc = hint
            .loc
            .as_ref()
            .map(|l| l.to_string())
            .unwrap_or_default();
        let data = hint.data.as_deref().unwrap_or("");
        let level = depth as u64;
        match hint.severity {
            Severity::Error => {
                tracing::error!(depth = level, loc = %loc, data, "{}", hint.primary)
            }
            Severity::Warning => {
                tracing::warn!(depth = level, loc = %loc, data, "{}", hint.primary)
            }
            Severity::Info => {
                tracing::info!(depth = level, loc = %loc, data, "{}", hint.primary)
            }
        }
        for child in &hint.children {
            Self::emit_node(child, depth + 1);
        }
    }
}

impl HintSink for TracingSink {
    fn emit(&self, hint: &Hint) {
        Self::emit_node(hint, 0);
    }
}

/// Stores hints in emission order.
#[derive(Debug, Default)]
pub struct CollectSink {
    hints: Mutex<Vec<Hint>>,
}

impl CollectSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all hints received so far.
    pub fn hints(&self) -> Vec<Hint> {
        self.hints
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.hints
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drain all collected hints.
    pub fn take(&self) -> Vec<Hint> {
        std::mem::take(&mut *self.hints.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl HintSink for CollectSink {
    fn emit(&self, hint: &Hint) {
        self.hints
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(hint.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loc::Loc;

    #[test]
    fn collect_sink_keeps_order() {
        let sink = CollectSink::new();
        assert!(sink.is_empty());
        sink.emit(&Hint::info("first"));
        sink.emit(&Hint::error("second"));
        let hints = sink.hints();
        assert_eq!(hints.len(), 2);
        assert_eq!(hints[0].primary, "first");
        assert_eq!(hints[1].severity, Severity::Error);
    }

    #[test]
    fn collect_sink_take_drains() {
        let sink = CollectSink::new();
        sink.emit_all([&Hint::info("a"), &Hint::info("b")]);
        assert_eq!(sink.take().len(), 2);
        assert!(sink.is_empty());
    }

    #[test]
    fn tracing_sink_walks_tree() {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_test_writer()
            .finish();
        tracing::subscriber::with_default(subscriber, || {
            let hint = Hint::error("invalid struct")
                .with_loc(&Loc::root())
                .with_child(Hint::warning("unexpected key").with_loc(&Loc::root().key("z")))
                .with_child(Hint::info("context").with_data("x"));
            TracingSink.emit(&hint);
        });
    }
}
