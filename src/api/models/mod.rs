pub mod report;

pub use report::{CreateReportRequest, ReportListResponse};
