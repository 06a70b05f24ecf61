//! MCP `ask` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the `ask` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct AskParams {
    /// Free-text question about the call transcripts, in Spanish.
    #[schemars(
        description = "Question about the collection-call transcripts, e.g. '¿Cuántos casos de alquiler hay este mes?'"
    )]
    pub question: String,

    /// Conversation session. Defaults to `"default"`.
    #[schemars(description = "Conversation session id. Defaults to 'default'.")]
    pub session_id: Option<String>,
}
