//! Run-scoped logging handle.
//!
//! Library code never installs a subscriber. The runner creates one
//! `RunLogger` per run and threads it down to the segment loop; every event
//! emitted inside its spans carries the run id and mode. Binaries decide
//! where the output goes (see the CLI's `tracing_subscriber` setup).

use tracing::Span;

#[derive(Debug, Clone)]
pub struct RunLogger {
    run_id: String,
    span: Span,
}

impl RunLogger {
    pub fn new(run_id: &str, mode: &str) -> Self {
        Self {
            run_id: run_id.to_string(),
            span: tracing::info_span!("run", run_id = %run_id, mode = %mode),
        }
    }

    /// A logger whose spans are disabled. Events still reach any installed
    /// subscriber, just without run context.
    pub fn detached() -> Self {
        Self {
            run_id: String::new(),
            span: Span::none(),
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Child span for one segment.
    pub fn segment_span(&self, segment_id: &str) -> Span {
        tracing::info_span!(parent: &self.span, "segment", segment_id = %segment_id)
    }

    /// Run `f` inside the run span.
    pub fn in_scope<F: FnOnce() -> R, R>(&self, f: F) -> R {
        self.span.in_scope(f)
    }
}

impl Default for RunLogger {
    fn default() -> Self {
        Self::detached()
    }
}
