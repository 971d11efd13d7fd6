use serde::{Deserialize, Serialize};
use ts_rs::TS;

pub mod financial;
pub mod session;

pub use financial::{format_millions, ExtractionStatus, FinancialExtraction, ZERO_AMOUNT};
pub use session::{AgentMessage, AgentSession, MessageRole, SessionStatus};

/// Error body printed or returned when an extraction run fails
#[derive(Debug, Serialize, Deserialize, TS)]
pub struct ErrorResponse {
    pub error: String,
}
