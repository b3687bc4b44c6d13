pub mod aggregation;
pub mod export;
pub mod insights;
pub mod performance;
