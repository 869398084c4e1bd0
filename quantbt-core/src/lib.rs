//! quantbt core — events, execution simulation, portfolio accounting,
//! the strategy contract, segment scheduling and the data layer.
//!
//! A backtest is a sequence of segments. Each segment replays a slice of
//! market events through the FIFO loop in [`engine::run_segment`]:
//! market → signal → order → fill, with every fill applied to one
//! [`portfolio::PortfolioLedger`] shared across the segments of a run.

pub mod data;
pub mod domain;
pub mod engine;
pub mod execution;
pub mod logging;
pub mod portfolio;
pub mod rng;
pub mod strategy;
