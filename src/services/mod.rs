//! Service layer: the orchestration stages and their side-effect helpers.
//!
//! ## Service map
//! - `config.rs` — declarative file discovery and parsing.
//! - `policy.rs` — override merging into per-module resolved policies.
//! - `plan.rs` — per-header task expansion and output-path derivation.
//! - `invoke.rs` — backend execution (sequential or bounded-parallel).
//! - `output.rs` — artifact persistence and run reporting.
//! - `settings.rs` — user settings file.
//!
//! ## Conventions
//! - Prefer pure helpers where possible.
//! - Side effects should be explicit and localized.
//! - Stages communicate through `domain::models` values only.

pub mod config;
pub mod invoke;
pub mod output;
pub mod plan;
pub mod policy;
pub mod settings;
