//! MCP `top_supervisors` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the `top_supervisors` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct TopSupervisorsParams {
    #[schemars(description = "Topic (lema) to rank supervisors by")]
    pub topic: String,

    /// Maximum number of supervisors. Defaults to `analysis.supervisor_limit`.
    #[schemars(description = "Maximum number of supervisors to return. Defaults to 10.")]
    pub limit: Option<usize>,
}
