use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

#[derive(Debug, Deserialize)]
pub struct AdviceRequest {
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct AdviceResponse {
    pub answer: String,
    pub source: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub deleted: u64,
}
