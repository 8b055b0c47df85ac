//! Position collection and the probe lifecycle.
//!
//! The callback path (background listener) is the sole writer to the shared
//! state; the main sequence blocks on a one-shot completion handoff instead of
//! spin-waiting, then reads the records after the terminal sentinel or a
//! timeout. On timeout the returned records are a snapshot taken under lock;
//! late appends may still land in the collector but are not reported.

use std::fmt;
use std::num::ParseFloatError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crossbeam::channel::{bounded, Receiver, RecvTimeoutError, Sender};
use log::{error, warn};

use crate::events::{InstrumentInfo, PortfolioValue, ProbeEvents, SessionFault};
use crate::report;
use crate::session::ProbeSession;

/// Position quantity exactly as reported at the vendor boundary.
///
/// The service reports position sizes as decimal quantities that may be
/// fractional. The probe keeps the native text form and converts to a float
/// only for display; whether that conversion succeeds, and what it yields,
/// is the datum under test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawQuantity(String);

impl RawQuantity {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The native decimal form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Defensive float conversion. Failure is an expected, reportable
    /// outcome, not a bug.
    pub fn to_f64(&self) -> Result<f64, ParseFloatError> {
        self.0.trim().parse()
    }
}

impl fmt::Display for RawQuantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<f64> for RawQuantity {
    fn from(quantity: f64) -> Self {
        Self(quantity.to_string())
    }
}

/// One entry per (account, instrument) pair reported by the remote service.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionRecord {
    pub account: String,
    pub symbol: String,
    pub sec_type: String,
    pub exchange: String,
    pub currency: String,
    pub quantity: RawQuantity,
    pub avg_cost: f64,
}

/// Everything collected by one probe run.
#[derive(Debug, Default)]
pub struct ProbeOutcome {
    /// Records in arrival order. The service guarantees no sort key.
    pub records: Vec<PositionRecord>,
    /// Whether the terminal sentinel was observed before the timeout.
    pub completed: bool,
}

/// Shared state for one run: written exclusively by the callback path, read
/// by the waiting path after completion or timeout.
pub struct Collector {
    records: Mutex<Vec<PositionRecord>>,
    complete: AtomicBool,
    done: Sender<()>,
}

impl Collector {
    pub fn new() -> (Arc<Self>, Receiver<()>) {
        let (done, completion) = bounded(1);
        let collector = Arc::new(Self {
            records: Mutex::new(Vec::new()),
            complete: AtomicBool::new(false),
            done,
        });
        (collector, completion)
    }

    pub fn is_complete(&self) -> bool {
        self.complete.load(Ordering::SeqCst)
    }

    /// Clones the records collected so far.
    pub fn snapshot(&self) -> Vec<PositionRecord> {
        self.records.lock().unwrap().clone()
    }
}

impl ProbeEvents for Collector {
    fn session_ready(&self, next_order_id: i32) {
        report::session_ready(next_order_id);
    }

    fn position(&self, account: &str, instrument: &InstrumentInfo, quantity: RawQuantity, avg_cost: f64) {
        let record = PositionRecord {
            account: account.to_string(),
            symbol: instrument.symbol.clone(),
            sec_type: instrument.sec_type.clone(),
            exchange: instrument.exchange.clone(),
            currency: instrument.currency.clone(),
            quantity,
            avg_cost,
        };

        report::position_dump(&record);

        self.records.lock().unwrap().push(record);
    }

    fn positions_end(&self) {
        if self.complete.swap(true, Ordering::SeqCst) {
            warn!("duplicate positions-end notification ignored");
            return;
        }

        report::positions_end(self.records.lock().unwrap().len());

        // Receiver may already be gone if the waiter timed out.
        let _ = self.done.try_send(());
    }

    fn session_error(&self, fault: &SessionFault) {
        if fault.is_notice() {
            warn!("TWS notice [{}]: {}", fault.code, fault.message);
        } else {
            error!("TWS error [{}]: {}", fault.code, fault.message);
        }

        report::session_fault(fault);
    }

    fn portfolio_value(&self, update: &PortfolioValue) {
        report::portfolio_dump(update);
    }

    fn account_download_end(&self, account: &str) {
        report::account_download_end(account);
    }
}

/// Drives the whole lifecycle: start the session's listener, block until the
/// terminal sentinel or `timeout`, then disconnect regardless of outcome.
///
/// This owns the only blocking wait in the probe. Remote faults never end the
/// wait early; only the sentinel or the timeout do.
pub fn run_and_collect(mut session: impl ProbeSession, timeout: Duration) -> ProbeOutcome {
    let (collector, completion) = Collector::new();

    if let Err(err) = session.start(Arc::clone(&collector) as Arc<dyn ProbeEvents>) {
        error!("session start failed: {err}");
    }

    let completed = match completion.recv_timeout(timeout) {
        Ok(()) => true,
        Err(RecvTimeoutError::Timeout) => false,
        Err(RecvTimeoutError::Disconnected) => collector.is_complete(),
    };

    report::disconnecting();
    session.disconnect();

    ProbeOutcome {
        records: collector.snapshot(),
        completed,
    }
}
