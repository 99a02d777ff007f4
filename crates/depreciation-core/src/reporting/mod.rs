//! Report envelopes and multi-asset batch calls built on the engine.

pub mod batch;
pub mod report;

pub use batch::{
    annual_totals, batch_report, compute_batch, portfolio_book_value_at, AssetRequest,
    BatchItem, BatchOutcome, BatchReport, YearTotal,
};
pub use report::{depreciation_report, DepreciationReport, ReportOptions};
