//! # Example Selection
//!
//! Picks the reference examples placed in a prompt. A text match is tried
//! first; when nothing matches, the most recently updated examples for the
//! dialect are used instead so the prompt still carries some structure.

use crate::{
    errors::GenerationError,
    providers::db::storage::Catalog,
    types::{Dialect, ReferenceExample},
};
use tracing::debug;

/// Selects at most `max_count` active examples for `dialect`.
///
/// An empty result is valid and means no active examples exist for the
/// dialect at all.
pub async fn select_examples(
    catalog: &dyn Catalog,
    question: &str,
    dialect: Dialect,
    max_count: usize,
) -> Result<Vec<ReferenceExample>, GenerationError> {
    if max_count == 0 {
        return Ok(Vec::new());
    }

    let matched = catalog
        .find_examples(dialect, Some(question), max_count)
        .await?;
    if !matched.is_empty() {
        debug!(%dialect, count = matched.len(), "Selected examples by text match.");
        return Ok(matched);
    }

    let recent = catalog.find_examples(dialect, None, max_count).await?;
    debug!(%dialect, count = recent.len(), "No text match; using most recent examples.");
    Ok(recent)
}
