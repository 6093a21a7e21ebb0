pub mod analysis;
pub mod postgres;
pub mod report;
pub mod store;
pub mod users;

pub use analysis::{AnalysisDocument, AnalysisRepository, StoredAnalysis};
pub use postgres::PgDocumentStore;
pub use report::{EfficiencyReportDocument, ReportRepository, StoredReport};
pub use store::{Document, DocumentStore, MemoryDocumentStore};
pub use users::UserRepository;
