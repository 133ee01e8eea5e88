use chrono::NaiveDate;
use keeper_core::{KeeperResult, RawTransaction};
use keeper_store::LedgerStore;
use rust_decimal::Decimal;

/// Record a new raw transaction; it is categorized on the next processing run
pub fn add_transaction(
    store: &LedgerStore,
    date: NaiveDate,
    description: &str,
    amount: Decimal,
) -> KeeperResult<RawTransaction> {
    store.append_raw(date, description, amount)
}
