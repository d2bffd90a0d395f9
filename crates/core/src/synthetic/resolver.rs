use crate::constants::MARKET_CLOSE;
use crate::events::{
    exchange_timestamp, EventType, FinancialEvent, SyntheticStatus,
};
use crate::ledger::LedgerServiceTrait;
use crate::synthetic::synthetic_model::{
    ExpiringPosition, PendingSettlement, ResolutionOutcome, ValidationEntry, ValidationReport,
};
use crate::synthetic::validation::assess_against_authoritative;
use crate::Result;
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use log::{debug, info, warn};
use rust_decimal::Decimal;
use std::sync::Arc;

/// Trait defining the contract for synthetic resolution operations.
#[async_trait]
pub trait SyntheticResolverTrait: Send + Sync {
    /// Derives provisional expiration/assignment events for option
    /// positions expiring on `expiration_date` with no outcome in the
    /// ledger yet. Runs after market close; emits at most one event per
    /// contract, ever.
    async fn resolve_expirations(
        &self,
        account_id: &str,
        expiration_date: NaiveDate,
        positions: &[ExpiringPosition],
    ) -> Result<ResolutionOutcome>;

    /// Matches unvalidated synthetic events against authoritative records
    /// now present in the ledger, then reports the status of every
    /// synthetic event for the account.
    async fn validate(
        &self,
        account_id: &str,
        expiration_date: Option<NaiveDate>,
    ) -> Result<ValidationReport>;
}

/// Covers the gap between an option's expiration and the broker feed's
/// settlement reporting delay by deriving assignment-or-expiration events
/// from moneyness at the settlement price.
#[derive(Clone)]
pub struct SyntheticResolver {
    ledger: Arc<dyn LedgerServiceTrait>,
}

impl SyntheticResolver {
    pub fn new(ledger: Arc<dyn LedgerServiceTrait>) -> Self {
        Self { ledger }
    }

    fn derive_event(
        &self,
        account_id: &str,
        expiration_date: NaiveDate,
        position: &ExpiringPosition,
        settlement: Decimal,
    ) -> Result<FinancialEvent> {
        let timestamp = exchange_timestamp(expiration_date, MARKET_CLOSE)
            .map_err(crate::errors::Error::from)?;

        let intrinsic = position.intrinsic_value(settlement);
        let (event_type, cash_impact, realized_pnl, description) = if intrinsic.is_zero() {
            (
                EventType::OptionExpiration,
                Decimal::ZERO,
                Decimal::ZERO,
                format!(
                    "Expired worthless: {} (settlement {} vs strike {})",
                    position.contract_key, settlement, position.strike
                ),
            )
        } else {
            // Settlement cash flows with the position direction: a short
            // contract pays the intrinsic value away, a long one collects it.
            let contracts = Decimal::from(position.quantity);
            let per_contract = intrinsic * Decimal::from(position.multiplier);
            let settlement_pnl = contracts * per_contract;
            (
                EventType::OptionAssignmentAssumed,
                settlement_pnl,
                settlement_pnl,
                format!(
                    "Assumed assignment: {} (settlement {} vs strike {}, est. P&L {})",
                    position.contract_key, settlement, position.strike, settlement_pnl
                ),
            )
        };

        let now = Utc::now();
        Ok(FinancialEvent {
            id: uuid::Uuid::new_v4().to_string(),
            account_id: account_id.to_string(),
            timestamp,
            event_type,
            description,
            cash_impact,
            realized_pnl,
            commission: Decimal::ZERO,
            currency: position.currency.clone(),
            source_transaction_id: None,
            contract_key: Some(position.contract_key.clone()),
            expiration_date: Some(expiration_date),
            is_synthetic: true,
            synthetic_status: SyntheticStatus::Unknown,
            confirmed_timestamp: None,
            created_at: now,
            updated_at: now,
        })
    }
}

#[async_trait]
impl SyntheticResolverTrait for SyntheticResolver {
    async fn resolve_expirations(
        &self,
        account_id: &str,
        expiration_date: NaiveDate,
        positions: &[ExpiringPosition],
    ) -> Result<ResolutionOutcome> {
        let mut outcome = ResolutionOutcome::default();

        for position in positions {
            let existing = self.ledger.events_for_contract(
                account_id,
                &position.contract_key,
                expiration_date,
            )?;
            if !existing.is_empty() {
                debug!(
                    "Contract {} exp {} already has a ledger event; not emitting",
                    position.contract_key, expiration_date
                );
                outcome.already_covered.push(position.contract_key.clone());
                continue;
            }

            let settlement = match position.settlement_price {
                Some(price) => price,
                None => {
                    debug!(
                        "No settlement price yet for {} exp {}; deferring",
                        position.contract_key, expiration_date
                    );
                    outcome.pending.push(PendingSettlement {
                        contract_key: position.contract_key.clone(),
                        reason: "settlement price unavailable".to_string(),
                    });
                    continue;
                }
            };

            let event = self.derive_event(account_id, expiration_date, position, settlement)?;
            if self.ledger.append(&event).await? {
                info!(
                    "Emitted synthetic {} for {} exp {}",
                    event.event_type, position.contract_key, expiration_date
                );
                outcome.emitted.push(event);
            } else {
                outcome.already_covered.push(position.contract_key.clone());
            }
        }

        Ok(outcome)
    }

    async fn validate(
        &self,
        account_id: &str,
        expiration_date: Option<NaiveDate>,
    ) -> Result<ValidationReport> {
        let mut newly_validated = 0usize;
        let mut validated_ids = Vec::new();

        for synthetic in self
            .ledger
            .unvalidated_synthetics(account_id, expiration_date)?
        {
            let (contract_key, expiration) =
                match (&synthetic.contract_key, synthetic.expiration_date) {
                    (Some(key), Some(expiration)) => (key.clone(), expiration),
                    _ => continue,
                };

            let authoritative = self
                .ledger
                .events_for_contract(account_id, &contract_key, expiration)?
                .into_iter()
                .find(|e| !e.is_synthetic);

            let authoritative = match authoritative {
                Some(event) => event,
                // Feed still behind; retried on the next scheduled pass.
                None => continue,
            };

            let (status, corrected) = assess_against_authoritative(&synthetic, &authoritative);
            if status == SyntheticStatus::Contradicted {
                warn!(
                    "Synthetic assumption contradicted for {} exp {}: assumed ({}, pnl {}) vs authoritative ({}, pnl {})",
                    contract_key,
                    expiration,
                    synthetic.event_type,
                    synthetic.realized_pnl,
                    authoritative.event_type,
                    authoritative.realized_pnl
                );
            }
            self.ledger
                .mark_synthetic_validation(
                    &synthetic.id,
                    status,
                    Some(authoritative.timestamp),
                    corrected,
                )
                .await?;
            newly_validated += 1;
            validated_ids.push(synthetic.id.clone());
        }

        let mut report = ValidationReport {
            account_id: account_id.to_string(),
            newly_validated,
            ..Default::default()
        };
        for event in self.ledger.synthetic_events(account_id)? {
            if event.synthetic_status == SyntheticStatus::Unknown {
                report.still_unknown += 1;
            }
            report.entries.push(ValidationEntry {
                event_id: event.id.clone(),
                contract_key: event.contract_key.clone(),
                expiration_date: event.expiration_date,
                status: event.synthetic_status,
                realized_pnl: event.realized_pnl,
                cash_impact: event.cash_impact,
                confirmed_timestamp: event.confirmed_timestamp,
                validated_this_pass: validated_ids.contains(&event.id),
            });
        }

        Ok(report)
    }
}
