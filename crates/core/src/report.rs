//! The reporter: shared pipeline state every producer pushes through.

use crate::dedup::Deduplicator;
use crate::hooks::Failure;
use faultline_common::ErrorRecord;
use std::fmt;
use std::sync::Arc;

/// Delivery seam between the pipeline and the wire.
///
/// `deliver` is fire-and-forget: implementations must return immediately and
/// must never raise to the caller, whatever happens on the network.
pub trait Deliver: Send + Sync {
    fn deliver(&self, record: ErrorRecord);
}

/// Host application context stamped onto every record at capture time.
#[derive(Debug, Clone)]
pub struct ReportContext {
    /// Host application location (page URL, service address, ...).
    pub url: String,
    /// Client identification string.
    pub user_agent: String,
}

impl Default for ReportContext {
    fn default() -> Self {
        Self {
            url: String::new(),
            user_agent: concat!("faultline/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Dedup-then-deliver pipeline shared by all capture producers.
pub struct Reporter {
    dedup: Deduplicator,
    transport: Arc<dyn Deliver>,
    context: ReportContext,
}

impl fmt::Debug for Reporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reporter")
            .field("dedup", &self.dedup)
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

impl Reporter {
    pub fn new(dedup: Deduplicator, transport: Arc<dyn Deliver>, context: ReportContext) -> Self {
        Self {
            dedup,
            transport,
            context,
        }
    }

    pub fn context(&self) -> &ReportContext {
        &self.context
    }

    /// Push a fully-built record through deduplication and transport.
    pub fn report(&self, record: ErrorRecord) {
        if self.dedup.should_suppress(&record) {
            return;
        }
        self.transport.deliver(record);
    }

    /// Normalize a failure into a record stamped with this reporter's
    /// context, then report it.
    pub fn capture(&self, failure: Failure, source: &str) {
        let record = failure.into_record(source, &self.context);
        self.report(record);
    }
}
