pub mod agent;
pub mod system_prompt;
pub mod validation;

pub use agent::{descriptor, FinancialExtractorAgent, DEFAULT_MODEL};
pub use system_prompt::{build_instruction, AGENT_NAME, OUTPUT_KEY};
pub use validation::validate_amount;
