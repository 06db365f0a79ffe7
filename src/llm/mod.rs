pub mod action_parser;
pub mod prompt;
pub mod provider;
pub mod providers;
pub mod registry;
pub mod segmenter;
pub mod sse_parser;
pub mod types;
