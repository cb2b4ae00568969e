//! # palisade-engine
//!
//! The guardrail evaluation engine: field resolution, condition evaluation,
//! action execution, and the should-proceed calculus.
//!
//! Everything here is a pure function of `(definition, context)` except the
//! `llm_judge` condition operator, which reaches out through the [`Judge`]
//! trait.  The orchestration that fetches guardrails, runs them
//! concurrently, and audits the result lives in `palisade-core`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use palisade_engine::{condition, path, proceed};
//!
//! let value = path::resolve(context.root(), "input.items[0].name")?;
//! let (fired, matched) =
//!     condition::evaluate_all(&judge, context.root(), &conditions, logic).await?;
//! ```

pub mod action;
pub mod condition;
pub mod judge;
pub mod path;
pub mod proceed;

pub use judge::{Judge, UnconfiguredJudge};
