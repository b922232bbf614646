pub mod config;
pub mod error;
pub mod export;
pub mod interactive;
pub mod probe;
pub mod session;
pub mod source;
pub mod transcoder;

pub use config::Config;
pub use error::{Result, SubextractError};
pub use export::{ExportOperation, ExportPlan, ExportRequest, ExportSelection};
pub use probe::{parse_stream_report, TrackRecord};
pub use session::{print_summary, ExportSession, ExportSummary};
