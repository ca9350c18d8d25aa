use std::fmt::Display;

use serde::Serialize;

use crate::db_types::InvoiceId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedInvoice {
    pub id: InvoiceId,
    pub reason: String,
}

/// What happened during one pass of the monitor over the open invoices.
///
/// An invoice that was confirmed and then settled in the same tick appears in both `confirmed` and `settled`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TickReport {
    pub expired: Vec<InvoiceId>,
    pub confirmed: Vec<InvoiceId>,
    pub settled: Vec<InvoiceId>,
    pub failed: Vec<FailedInvoice>,
    /// Invoices that were not (fully) processed before the tick budget ran out
    pub deferred: Vec<InvoiceId>,
    pub unchanged: usize,
    pub elapsed_ms: u64,
}

impl TickReport {
    pub fn merge(mut self, other: TickReport) -> Self {
        self.expired.extend(other.expired);
        self.confirmed.extend(other.confirmed);
        self.settled.extend(other.settled);
        self.failed.extend(other.failed);
        self.deferred.extend(other.deferred);
        self.unchanged += other.unchanged;
        self.elapsed_ms = self.elapsed_ms.max(other.elapsed_ms);
        self
    }

    /// True if nothing changed state and nothing went wrong.
    pub fn is_quiet(&self) -> bool {
        self.expired.is_empty()
            && self.confirmed.is_empty()
            && self.settled.is_empty()
            && self.failed.is_empty()
            && self.deferred.is_empty()
    }

    pub fn invoices_seen(&self) -> usize {
        // confirmed invoices also show up in one of the other buckets
        let confirmed_only = self
            .confirmed
            .iter()
            .filter(|id| {
                !self.settled.contains(id)
                    && !self.deferred.contains(id)
                    && !self.failed.iter().any(|f| &f.id == *id)
            })
            .count();
        self.expired.len()
            + confirmed_only
            + self.settled.len()
            + self.failed.len()
            + self.deferred.len()
            + self.unchanged
    }
}

impl Display for TickReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} expired, {} confirmed, {} settled, {} failed, {} deferred, {} unchanged in {}ms",
            self.expired.len(),
            self.confirmed.len(),
            self.settled.len(),
            self.failed.len(),
            self.deferred.len(),
            self.unchanged,
            self.elapsed_ms
        )
    }
}
