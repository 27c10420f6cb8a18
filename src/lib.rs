pub mod admin;
pub mod config;
pub mod export;
pub mod fetch;
pub mod output;
pub mod publish;
pub mod scatter;
pub mod variables;
