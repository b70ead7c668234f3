pub mod accounts;
pub mod llm;
pub mod proxy;
pub mod spotify;
