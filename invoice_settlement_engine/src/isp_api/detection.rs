use serde::{Deserialize, Serialize};

use crate::{db_types::Invoice, traits::AddressTransaction};

/// Decides which transactions at an invoice's address count as payment.
///
/// The default accepts any transaction at all, including unconfirmed ones, and ignores the amount.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionPolicy {
    pub min_confirmations: u32,
    /// Only accept transactions whose reported value covers the invoice amount. Transactions without a reported value
    /// are never accepted under this setting.
    pub require_full_amount: bool,
}

impl DetectionPolicy {
    pub fn new(min_confirmations: u32, require_full_amount: bool) -> Self {
        Self { min_confirmations, require_full_amount }
    }

    /// The first transaction in `history` that counts as payment for `invoice`.
    pub fn find_payment<'a>(
        &self,
        invoice: &Invoice,
        history: &'a [AddressTransaction],
    ) -> Option<&'a AddressTransaction> {
        history.iter().find(|tx| self.accepts(invoice, tx))
    }

    fn accepts(&self, invoice: &Invoice, tx: &AddressTransaction) -> bool {
        if tx.confirmations < self.min_confirmations {
            return false;
        }
        if self.require_full_amount {
            return tx.received.map(|v| v >= invoice.amount_asset).unwrap_or(false);
        }
        true
    }
}
