//! Choosing one verse per slot with help from the text-generation service.

use std::num::IntErrorKind;

use rand::Rng;
use rand::seq::IndexedRandom;
use tracing::{debug, warn};

use crate::corpus::VerseRecord;
use crate::service::TextService;

/// Upper bound on candidates shown to the service in one prompt.
pub const MAX_PRESENTED_CANDIDATES: usize = 20;

/// How a verse ended up being chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionReason {
    /// The service named a valid index.
    ServicePick,
    /// The service answered `none` but several candidates were presented.
    RandomAfterNone,
    /// The service named an index outside the presented list.
    RandomOutOfRange,
    /// The reply was neither a number nor `none`; the first candidate was used.
    DefaultedToFirst,
    /// The service call failed.
    RandomAfterFailure,
}

impl SelectionReason {
    /// True when the choice did not come from a clean service answer.
    pub fn is_fallback(&self) -> bool {
        !matches!(self, SelectionReason::ServicePick)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection<'a> {
    Chosen {
        verse: &'a VerseRecord,
        reason: SelectionReason,
    },
    /// The only candidate was rejected; the slot should get a generated statement.
    NoneAcceptable,
}

/// A service reply, normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionReply {
    None,
    Index(i64),
    Unparseable,
}

impl SelectionReply {
    pub fn parse(raw: &str) -> Self {
        let reply = raw.trim().to_lowercase();
        if reply.starts_with("none") {
            return SelectionReply::None;
        }
        match reply.parse::<i64>() {
            Ok(index) => SelectionReply::Index(index),
            // Still a number, just never a valid position.
            Err(err) => match err.kind() {
                IntErrorKind::PosOverflow => SelectionReply::Index(i64::MAX),
                IntErrorKind::NegOverflow => SelectionReply::Index(i64::MIN),
                _ => SelectionReply::Unparseable,
            },
        }
    }
}

/// Cap the candidate list at [`MAX_PRESENTED_CANDIDATES`] by sampling without replacement.
pub fn present_candidates<'a, R>(candidates: &'a [VerseRecord], rng: &mut R) -> Vec<&'a VerseRecord>
where
    R: Rng + ?Sized,
{
    if candidates.len() > MAX_PRESENTED_CANDIDATES {
        candidates
            .choose_multiple(rng, MAX_PRESENTED_CANDIDATES)
            .collect()
    } else {
        candidates.iter().collect()
    }
}

/// Ask the service for the best of `candidates`.
///
/// Falls back to a uniformly random candidate when the service fails (drawn from the
/// full list), answers `none` with several options, or names an index out of range.
pub fn select_best<'a, S, R>(
    service: &S,
    candidates: &'a [VerseRecord],
    rng: &mut R,
) -> Selection<'a>
where
    S: TextService + ?Sized,
    R: Rng + ?Sized,
{
    let presented = present_candidates(candidates, rng);
    if presented.is_empty() {
        return Selection::NoneAcceptable;
    }
    let texts: Vec<&str> = presented.iter().map(|verse| verse.text.as_str()).collect();

    let raw_reply = match service.choose_candidate(&texts) {
        Ok(reply) => reply,
        Err(err) => {
            warn!(
                error = %err,
                candidates = candidates.len(),
                "Verse selection failed; picking at random"
            );
            return random_choice(candidates.iter(), rng, SelectionReason::RandomAfterFailure);
        }
    };

    match SelectionReply::parse(&raw_reply) {
        SelectionReply::None if presented.len() == 1 => {
            debug!("Service rejected the only candidate");
            Selection::NoneAcceptable
        }
        SelectionReply::None => random_choice(
            presented.iter().copied(),
            rng,
            SelectionReason::RandomAfterNone,
        ),
        SelectionReply::Index(index) => {
            let in_range = usize::try_from(index)
                .ok()
                .and_then(|one_based| one_based.checked_sub(1))
                .and_then(|zero_based| presented.get(zero_based).copied());
            match in_range {
                Some(verse) => Selection::Chosen {
                    verse,
                    reason: SelectionReason::ServicePick,
                },
                None => {
                    warn!(
                        index,
                        presented = presented.len(),
                        "Selection index out of range; picking at random"
                    );
                    random_choice(
                        presented.iter().copied(),
                        rng,
                        SelectionReason::RandomOutOfRange,
                    )
                }
            }
        }
        SelectionReply::Unparseable => {
            warn!(reply = %raw_reply, "Unrecognized selection reply; using the first candidate");
            Selection::Chosen {
                verse: presented[0],
                reason: SelectionReason::DefaultedToFirst,
            }
        }
    }
}

fn random_choice<'a, I, R>(pool: I, rng: &mut R, reason: SelectionReason) -> Selection<'a>
where
    I: Iterator<Item = &'a VerseRecord>,
    R: Rng + ?Sized,
{
    let pool: Vec<&VerseRecord> = pool.collect();
    match pool.choose(rng) {
        Some(verse) => Selection::Chosen {
            verse: *verse,
            reason,
        },
        None => Selection::NoneAcceptable,
    }
}
