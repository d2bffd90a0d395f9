//! Pure daily reconciliation arithmetic.
//!
//! Computes categorized sums over one trading day's events and verifies
//! the core balance equation:
//!
//! ```text
//! closing_nav == opening_nav
//!                 + deposits - withdrawals
//!                 + realized_pnl
//!                 - commissions - fees
//!                 + interest
//!                 + exercise_proceeds - exercise_commissions
//! ```

use crate::constants::RECONCILIATION_TOLERANCE;
use crate::events::{EventType, FinancialEvent};
use crate::reconciliation::reconciliation_model::DailySummary;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;

/// Categorized sums over one day's events.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DayBreakdown {
    /// Deposits timestamped before the opening bell; these adjust the
    /// return baseline.
    pub deposits_pre_open: Decimal,
    pub deposits_post_open: Decimal,
    /// Withdrawal magnitude (positive).
    pub withdrawals: Decimal,
    /// Realized P&L from trades.
    pub trading_pnl: Decimal,
    /// Realized P&L from option expirations/assignments, synthetic or
    /// authoritative.
    pub exercise_pnl: Decimal,
    /// Trade commissions plus standalone commission adjustments.
    pub commissions: Decimal,
    /// Fee magnitude (positive).
    pub fees: Decimal,
    /// Signed interest accrued.
    pub interest: Decimal,
    /// Gross cash proceeds of option settlements, before commission.
    pub exercise_proceeds: Decimal,
    pub exercise_commissions: Decimal,
    pub event_count: usize,
}

impl DayBreakdown {
    pub fn deposits(&self) -> Decimal {
        self.deposits_pre_open + self.deposits_post_open
    }

    pub fn gross_pnl(&self) -> Decimal {
        self.trading_pnl + self.exercise_pnl
    }

    pub fn total_commissions(&self) -> Decimal {
        self.commissions + self.exercise_commissions
    }

    pub fn net_pnl(&self) -> Decimal {
        self.gross_pnl() - self.total_commissions()
    }

    pub fn net_cash_flow(&self) -> Decimal {
        self.deposits() - self.withdrawals
    }

    /// The NAV change implied by the day's events.
    pub fn implied_nav_change(&self) -> Decimal {
        self.deposits() - self.withdrawals + self.trading_pnl - self.commissions - self.fees
            + self.interest
            + self.exercise_proceeds
            - self.exercise_commissions
    }
}

/// Sums one day's events by category. Exhaustive over [`EventType`]: a new
/// event kind will not compile until it is placed in a bucket here.
pub fn compute_day_breakdown(events: &[FinancialEvent]) -> DayBreakdown {
    let mut breakdown = DayBreakdown {
        event_count: events.len(),
        ..Default::default()
    };

    for event in events {
        match event.event_type {
            EventType::Deposit => {
                if event.is_pre_open() {
                    breakdown.deposits_pre_open += event.cash_impact;
                } else {
                    breakdown.deposits_post_open += event.cash_impact;
                }
            }
            EventType::Withdrawal => {
                breakdown.withdrawals += event.cash_impact.abs();
            }
            EventType::Trade => {
                breakdown.trading_pnl += event.realized_pnl;
                breakdown.commissions += event.commission;
            }
            EventType::OptionExpiration
            | EventType::OptionAssignment
            | EventType::OptionAssignmentAssumed => {
                breakdown.exercise_pnl += event.realized_pnl;
                // cash_impact is net of commission; the equation carries
                // gross proceeds and commissions as separate terms.
                breakdown.exercise_proceeds += event.cash_impact + event.commission;
                breakdown.exercise_commissions += event.commission;
            }
            EventType::InterestAccrual => {
                breakdown.interest += event.cash_impact;
            }
            EventType::Fee => {
                breakdown.fees += event.cash_impact.abs();
            }
            EventType::Commission => {
                breakdown.commissions += event.cash_impact.abs();
            }
        }
    }

    breakdown
}

/// Verifies the balance equation for one day and produces the summary row.
///
/// `opening_nav` is the broker observation at the previous close (absent on
/// an account's first day, treated as zero in the equation). When no
/// closing observation exists the implied value is reported with a zero
/// difference - there is nothing authoritative to check against, and the
/// narrative says so rather than presenting the figure as verified.
pub fn reconcile_day(
    account_id: &str,
    date: NaiveDate,
    opening_nav: Option<Decimal>,
    observed_closing_nav: Option<Decimal>,
    breakdown: &DayBreakdown,
) -> DailySummary {
    let opening = opening_nav.unwrap_or(Decimal::ZERO);
    let implied_closing = opening + breakdown.implied_nav_change();

    let closing_observed = observed_closing_nav.is_some();
    let closing_nav = observed_closing_nav.unwrap_or(implied_closing);
    let reconciliation_difference = closing_nav - implied_closing;
    let is_reconciled = reconciliation_difference.abs() <= RECONCILIATION_TOLERANCE;

    let adjusted_opening_nav = opening_nav.map(|nav| nav + breakdown.deposits_pre_open);
    let daily_return_pct = match adjusted_opening_nav {
        Some(baseline) if !baseline.is_zero() => {
            Some(breakdown.net_pnl() / baseline * Decimal::ONE_HUNDRED)
        }
        // First day of an account, or an empty baseline: the return is
        // undefined, never a division by zero.
        _ => None,
    };

    DailySummary {
        id: DailySummary::summary_id(account_id, date),
        account_id: account_id.to_string(),
        date,
        opening_nav,
        adjusted_opening_nav,
        closing_nav,
        closing_observed,
        gross_pnl: breakdown.gross_pnl(),
        net_pnl: breakdown.net_pnl(),
        net_cash_flow: breakdown.net_cash_flow(),
        deposits: breakdown.deposits(),
        withdrawals: breakdown.withdrawals,
        total_commissions: breakdown.total_commissions(),
        total_fees: breakdown.fees,
        total_interest: breakdown.interest,
        exercise_proceeds: breakdown.exercise_proceeds,
        exercise_commissions: breakdown.exercise_commissions,
        reconciliation_difference,
        is_reconciled,
        daily_return_pct,
        calculated_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::SyntheticStatus;
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()
    }

    fn event(event_type: EventType, hour_utc: u32) -> FinancialEvent {
        let now = Utc::now();
        FinancialEvent {
            id: uuid::Uuid::new_v4().to_string(),
            account_id: "acct-1".to_string(),
            // 12:00 UTC on an EDT day is 08:00 New York; 15:00 is 11:00.
            timestamp: Utc.with_ymd_and_hms(2025, 3, 14, hour_utc, 0, 0).unwrap(),
            event_type,
            description: String::new(),
            cash_impact: Decimal::ZERO,
            realized_pnl: Decimal::ZERO,
            commission: Decimal::ZERO,
            currency: "USD".to_string(),
            source_transaction_id: Some(uuid::Uuid::new_v4().to_string()),
            contract_key: None,
            expiration_date: None,
            is_synthetic: false,
            synthetic_status: SyntheticStatus::Unknown,
            confirmed_timestamp: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn simple_day_reconciles_exactly() {
        // Opening 1,000,000; one trade with P&L +5,000 and commission 20.
        let mut trade = event(EventType::Trade, 15);
        trade.realized_pnl = dec!(5000);
        trade.commission = dec!(20);
        trade.cash_impact = dec!(4980);

        let breakdown = compute_day_breakdown(&[trade]);
        let summary = reconcile_day(
            "acct-1",
            day(),
            Some(dec!(1000000)),
            Some(dec!(1004980)),
            &breakdown,
        );

        assert!(summary.is_reconciled);
        assert_eq!(summary.reconciliation_difference, Decimal::ZERO);
        assert_eq!(summary.gross_pnl, dec!(5000));
        assert_eq!(summary.net_pnl, dec!(4980));
        assert_eq!(summary.daily_return_pct, Some(dec!(0.498)));
    }

    #[test]
    fn pre_open_deposit_adjusts_return_baseline() {
        // Opening 800,000; 50,000 deposited at 08:00 ET (12:00 UTC in EDT);
        // net P&L 1,500 after commissions.
        let mut deposit = event(EventType::Deposit, 12);
        deposit.cash_impact = dec!(50000);

        let mut trade = event(EventType::Trade, 15);
        trade.realized_pnl = dec!(1520);
        trade.commission = dec!(20);
        trade.cash_impact = dec!(1500);

        let breakdown = compute_day_breakdown(&[deposit, trade]);
        assert_eq!(breakdown.deposits_pre_open, dec!(50000));
        assert_eq!(breakdown.deposits_post_open, Decimal::ZERO);

        let summary = reconcile_day(
            "acct-1",
            day(),
            Some(dec!(800000)),
            Some(dec!(851500)),
            &breakdown,
        );

        assert!(summary.is_reconciled);
        assert_eq!(summary.opening_nav, Some(dec!(800000)));
        assert_eq!(summary.adjusted_opening_nav, Some(dec!(850000)));
        let pct = summary.daily_return_pct.unwrap().round_dp(3);
        assert_eq!(pct, dec!(0.176));
    }

    #[test]
    fn post_open_deposit_leaves_baseline_alone() {
        // 20:00 UTC on an EDT day is 16:00 New York - not pre-open.
        let mut deposit = event(EventType::Deposit, 20);
        deposit.cash_impact = dec!(50000);

        let breakdown = compute_day_breakdown(&[deposit]);
        assert_eq!(breakdown.deposits_pre_open, Decimal::ZERO);
        assert_eq!(breakdown.deposits_post_open, dec!(50000));

        let summary = reconcile_day("acct-1", day(), Some(dec!(800000)), None, &breakdown);
        assert_eq!(summary.adjusted_opening_nav, Some(dec!(800000)));
    }

    #[test]
    fn unexplained_delta_is_flagged_as_discrepancy() {
        let breakdown = compute_day_breakdown(&[]);
        let summary = reconcile_day(
            "acct-1",
            day(),
            Some(dec!(1000000)),
            Some(dec!(1000010)),
            &breakdown,
        );

        assert!(!summary.is_reconciled);
        assert_eq!(summary.reconciliation_difference, dec!(10));
    }

    #[test]
    fn zero_event_day_closes_flat() {
        let breakdown = compute_day_breakdown(&[]);
        let summary = reconcile_day("acct-1", day(), Some(dec!(500000)), None, &breakdown);

        assert!(summary.is_reconciled);
        assert_eq!(summary.closing_nav, dec!(500000));
        assert!(!summary.closing_observed);
        assert_eq!(summary.reconciliation_difference, Decimal::ZERO);
    }

    #[test]
    fn first_day_has_undefined_return() {
        let mut deposit = event(EventType::Deposit, 12);
        deposit.cash_impact = dec!(100000);

        let breakdown = compute_day_breakdown(&[deposit]);
        let summary = reconcile_day("acct-1", day(), None, Some(dec!(100000)), &breakdown);

        assert!(summary.is_reconciled);
        assert_eq!(summary.daily_return_pct, None);
        assert_eq!(summary.opening_nav, None);
    }

    #[test]
    fn withdrawal_and_fees_reduce_implied_closing() {
        let mut withdrawal = event(EventType::Withdrawal, 20);
        withdrawal.cash_impact = dec!(-25000);

        let mut fee = event(EventType::Fee, 20);
        fee.cash_impact = dec!(-12.50);

        let mut interest = event(EventType::InterestAccrual, 20);
        interest.cash_impact = dec!(42.10);

        let breakdown = compute_day_breakdown(&[withdrawal, fee, interest]);
        assert_eq!(breakdown.withdrawals, dec!(25000));
        assert_eq!(breakdown.fees, dec!(12.50));
        assert_eq!(breakdown.interest, dec!(42.10));

        let summary = reconcile_day("acct-1", day(), Some(dec!(100000)), None, &breakdown);
        assert_eq!(summary.closing_nav, dec!(75029.60));
    }

    #[test]
    fn exercise_terms_enter_the_equation_separately() {
        let mut assignment = event(EventType::OptionAssignment, 21);
        assignment.realized_pnl = dec!(-350);
        assignment.cash_impact = dec!(-351.10);
        assignment.commission = dec!(1.10);

        let breakdown = compute_day_breakdown(&[assignment]);
        assert_eq!(breakdown.exercise_pnl, dec!(-350));
        assert_eq!(breakdown.exercise_proceeds, dec!(-350.00));
        assert_eq!(breakdown.exercise_commissions, dec!(1.10));

        let summary = reconcile_day(
            "acct-1",
            day(),
            Some(dec!(10000)),
            Some(dec!(9648.90)),
            &breakdown,
        );
        assert!(summary.is_reconciled);
        assert_eq!(summary.gross_pnl, dec!(-350));
        assert_eq!(summary.net_pnl, dec!(-351.10));
    }

    proptest! {
        /// For any synthetically-constructed day with no discrepancy
        /// injected, the observed closing equal to the implied value
        /// reconciles within tolerance.
        #[test]
        fn balance_closure_holds_without_injected_discrepancy(
            opening in 0i64..10_000_000,
            deposit in 0i64..1_000_000,
            withdrawal in 0i64..100_000,
            pnl_cents in -10_000_000i64..10_000_000,
            commission_cents in 0i64..100_000,
            interest_cents in -100_000i64..100_000,
        ) {
            let mut deposit_event = event(EventType::Deposit, 12);
            deposit_event.cash_impact = Decimal::from(deposit);

            let mut withdrawal_event = event(EventType::Withdrawal, 20);
            withdrawal_event.cash_impact = -Decimal::from(withdrawal);

            let mut trade = event(EventType::Trade, 15);
            trade.realized_pnl = Decimal::new(pnl_cents, 2);
            trade.commission = Decimal::new(commission_cents, 2);

            let mut interest = event(EventType::InterestAccrual, 20);
            interest.cash_impact = Decimal::new(interest_cents, 2);

            let breakdown =
                compute_day_breakdown(&[deposit_event, withdrawal_event, trade, interest]);
            let implied = Decimal::from(opening) + breakdown.implied_nav_change();
            let summary = reconcile_day(
                "acct-1",
                day(),
                Some(Decimal::from(opening)),
                Some(implied),
                &breakdown,
            );

            prop_assert!(summary.is_reconciled);
            prop_assert_eq!(summary.reconciliation_difference, Decimal::ZERO);
        }
    }
}
