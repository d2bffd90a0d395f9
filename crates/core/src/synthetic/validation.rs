//! Comparison of a synthetic assumption against authoritative broker data.

use crate::constants::SYNTHETIC_PNL_TOLERANCE;
use crate::events::{EventType, FinancialEvent, SyntheticStatus};
use crate::ledger::CorrectedEconomics;

/// Decides the validation outcome for a synthetic event once its
/// authoritative counterpart is known.
///
/// Confirmed when the economic outcome matches the assumption within
/// tolerance - the stored values stay untouched. Contradicted otherwise,
/// with the authoritative economics to supersede the assumption in place.
pub fn assess_against_authoritative(
    synthetic: &FinancialEvent,
    authoritative: &FinancialEvent,
) -> (SyntheticStatus, Option<CorrectedEconomics>) {
    let outcome_matches = matches!(
        (synthetic.event_type, authoritative.event_type),
        (EventType::OptionExpiration, EventType::OptionExpiration)
            | (
                EventType::OptionAssignmentAssumed,
                EventType::OptionAssignment
            )
    );

    let pnl_matches =
        (synthetic.realized_pnl - authoritative.realized_pnl).abs() <= SYNTHETIC_PNL_TOLERANCE;
    let cash_matches =
        (synthetic.cash_impact - authoritative.cash_impact).abs() <= SYNTHETIC_PNL_TOLERANCE;

    if outcome_matches && pnl_matches && cash_matches {
        (SyntheticStatus::Confirmed, None)
    } else {
        (
            SyntheticStatus::Contradicted,
            Some(CorrectedEconomics {
                cash_impact: authoritative.cash_impact,
                realized_pnl: authoritative.realized_pnl,
                commission: authoritative.commission,
            }),
        )
    }
}
