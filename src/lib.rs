pub mod analyzer;
pub mod catalog;
pub mod config;
pub mod merger;
pub mod openai;
pub mod report;
pub mod retry;
pub mod validator;
