//! MCP `compare_periods` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ComparePeriodsParams {
    #[schemars(description = "Topic (lema) to compare, e.g. 'juicio'")]
    pub topic: String,

    #[schemars(description = "First month, formatted YYYY-MM")]
    pub period1: String,

    #[schemars(description = "Second month, formatted YYYY-MM")]
    pub period2: String,
}
