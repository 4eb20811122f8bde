use thiserror::Error;

use super::branch_search::TransferCandidate;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SelectionError {
    #[error("no transfer candidates to choose from")]
    Empty,
}

/// Pick the cheapest candidate.
///
/// Exact cost ties go to the branch with fewer revolutions, then to the one
/// listed first. Candidates with a non-finite cost are never chosen.
pub fn select_best(candidates: &[TransferCandidate]) -> Result<TransferCandidate, SelectionError> {
    let mut best: Option<&TransferCandidate> = None;
    for candidate in candidates.iter().filter(|c| c.cost_km_s.is_finite()) {
        best = match best {
            None => Some(candidate),
            Some(current) => {
                let cheaper = candidate.cost_km_s < current.cost_km_s;
                let tie_with_fewer_revs =
                    candidate.cost_km_s == current.cost_km_s && candidate.revolutions < current.revolutions;
                if cheaper || tie_with_fewer_revs {
                    Some(candidate)
                } else {
                    Some(current)
                }
            }
        };
    }
    best.copied().ok_or(SelectionError::Empty)
}
