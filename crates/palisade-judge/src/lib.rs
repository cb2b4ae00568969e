//! # palisade-judge
//!
//! The HTTP implementation of the engine's `Judge` trait: one
//! chat-completion request per `llm_judge` condition, against any
//! OpenAI-compatible endpoint.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use palisade_judge::{HttpJudge, JudgeConfig};
//!
//! let config = JudgeConfig::from_file(Path::new("judge.toml"))?;
//! let judge = HttpJudge::new(config);
//! ```

pub mod config;
pub mod http;

pub use config::JudgeConfig;
pub use http::HttpJudge;
