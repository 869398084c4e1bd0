//! Portfolio accounting: positions, multi-currency cash, margin, borrow
//! costs and the trade log.

pub mod ledger;
pub mod position;
pub mod trade_log;

pub use ledger::{ExposureSummary, PortfolioLedger, PortfolioSnapshot};
pub use position::Position;
pub use trade_log::{TradeLogError, TradeRecord};
