//! MCP `session_history` and `clear_session` tool parameter definitions.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the `session_history` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SessionHistoryParams {
    #[schemars(description = "Conversation session id")]
    pub session_id: String,

    #[schemars(description = "Return only the most recent N messages. Defaults to 10.")]
    pub limit: Option<usize>,
}

/// Parameters for the `clear_session` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ClearSessionParams {
    #[schemars(description = "Conversation session id to delete")]
    pub session_id: String,
}
