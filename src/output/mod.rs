//! Plan summaries and run reports

pub mod report;

pub use report::{ArchivedSegment, PlanSummary, PlannedSegment, RunReport};
