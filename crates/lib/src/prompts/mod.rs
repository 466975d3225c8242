//! # Prompt Template Modules
//!
//! `sql_generation` holds the built-in template text and sentinels;
//! `template` renders a template into the final prompt string.

pub mod sql_generation;
pub mod template;

pub use template::{build_prompt, render_examples, PromptSections, PromptTemplate};
