//! Execution simulation: turns an order plus the latest market observation
//! into zero or more fills. Pure and deterministic.

pub mod costs;
pub mod simulator;

pub use costs::CostModel;
pub use simulator::{ExecutionConfig, ExecutionError, ExecutionHandler, SimulatedExecution};
