mod client;
mod extract;

pub use client::{GenAiClient, GenAiError, InlineImage, TextGenerator};
pub use extract::extract_json_block;
