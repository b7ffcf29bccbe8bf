pub mod csv_writer;
pub mod etl;
pub mod extract;
pub mod fetcher;
pub mod pipeline;
pub mod reporter;

pub use crate::domain::model::{
    ElectionRecord, HeaderMode, OutputFormat, Row, RunReport, RunSummary, Schema, TownFailure,
    TownResults,
};
pub use crate::domain::ports::{ConfigProvider, PageFetcher, Reporter};
pub use crate::utils::error::Result;
