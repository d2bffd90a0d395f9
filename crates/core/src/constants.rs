use chrono::NaiveTime;
use chrono_tz::Tz;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Exchange calendar timezone (US equities).
pub const EXCHANGE_TZ: Tz = chrono_tz::America::New_York;

/// Regular session opening bell, exchange-local.
pub const MARKET_OPEN: NaiveTime = NaiveTime::from_hms_opt(9, 30, 0).unwrap();

/// Regular session close, exchange-local.
pub const MARKET_CLOSE: NaiveTime = NaiveTime::from_hms_opt(16, 0, 0).unwrap();

/// Assigned time for deposits whose broker record carries no time:
/// before the open, so they adjust the day's return baseline.
pub const DEPOSIT_DEFAULT_TIME: NaiveTime = NaiveTime::from_hms_opt(8, 0, 0).unwrap();

/// Assigned time for withdrawals whose broker record carries no time:
/// at the close.
pub const WITHDRAWAL_DEFAULT_TIME: NaiveTime = MARKET_CLOSE;

/// Absolute tolerance for the daily balance equation, in currency units.
pub const RECONCILIATION_TOLERANCE: Decimal = dec!(0.01);

/// Tolerance when matching a synthetic event's estimated P&L against the
/// authoritative broker figure.
pub const SYNTHETIC_PNL_TOLERANCE: Decimal = dec!(0.01);

/// Standard US equity option contract multiplier.
pub const OPTION_CONTRACT_MULTIPLIER: i64 = 100;

/// Default base currency when a broker record omits one.
pub const DEFAULT_CURRENCY: &str = "USD";
