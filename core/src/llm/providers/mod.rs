//! Completion backend providers

pub mod openai;

pub use openai::OpenAiClient;
