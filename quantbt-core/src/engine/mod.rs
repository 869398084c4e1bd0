//! Backtesting engine — segment planning and the event-driven segment loop.
//!
//! Per segment:
//!
//! 1. Enqueue every market event of the segment (FIFO).
//! 2. Drain: a market event marks the ledger and asks the strategy for
//!    signals; each signal becomes an order appended to the queue tail.
//! 3. Orders execute against the latest observed price of their symbol and
//!    their fills are applied to the ledger.
//!
//! Because orders are appended behind the remaining market events, every
//! order fills against the last observed price of its symbol in the segment.

pub mod loop_runner;
pub mod modes;
pub mod queue;
pub mod scheduler;

pub use loop_runner::run_segment;
pub use modes::{EngineMode, EngineResult, EngineSegmentResult, RunStatus, SegmentPlan};
pub use queue::EventQueue;
pub use scheduler::{RunScheduler, SchedulerConfig};
