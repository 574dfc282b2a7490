use tracing::warn;

use crate::history::RecentStatements;
use crate::service::TextService;

/// Used whenever the service cannot produce a statement.
pub const FALLBACK_STATEMENT: &str =
    "Trust in the Lord with all your heart, and let His love guide your steps.";

/// Outcome of one generation request, raw (not yet sanitized).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub text: String,
    pub fell_back: bool,
}

/// Ask the service for a fresh statement, steering it away from `recent`.
///
/// Successful output is appended to `recent`. On failure `recent` is left untouched and
/// [`FALLBACK_STATEMENT`] is returned.
pub fn generate_statement<S>(service: &S, recent: &mut RecentStatements) -> Statement
where
    S: TextService + ?Sized,
{
    match service.generate_statement(&recent.to_vec()) {
        Ok(text) => {
            recent.push(text.clone());
            Statement {
                text,
                fell_back: false,
            }
        }
        Err(err) => {
            warn!(error = %err, "Statement generation failed; using fallback statement");
            Statement {
                text: FALLBACK_STATEMENT.to_string(),
                fell_back: true,
            }
        }
    }
}
