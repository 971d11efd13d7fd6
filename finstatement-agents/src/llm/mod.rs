pub mod error;
pub mod gemini;
pub mod schema;
pub mod types;

pub use error::LlmError;
pub use types::{
    CompletionRequest, CompletionResponse, ContentBlock, Message, ResponseFormat, Role, Usage,
};

use async_trait::async_trait;

/// Model identifiers accepted by the clients in this crate
pub mod models {
    pub mod gemini {
        pub const GEMINI_2_0_FLASH_ID: &str = "gemini-2.0-flash";
        pub const GEMINI_2_5_FLASH_ID: &str = "gemini-2.5-flash";
        pub const GEMINI_2_5_PRO_ID: &str = "gemini-2.5-pro";
    }
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Short provider name recorded with each session
    fn provider_name(&self) -> &str;

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;
}
