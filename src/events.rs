//! Callback interfaces at the vendor boundary.
//!
//! Receiving callbacks and driving the connection are independent traits:
//! [ProbeEvents] is the receiver side, [crate::session::ProbeSession] the
//! driver side. [crate::probe::run_and_collect] composes the two.

use time::OffsetDateTime;

use crate::probe::RawQuantity;

/// Descriptive instrument attributes reported with a position callback.
/// Supplied by the remote service and not validated locally.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstrumentInfo {
    pub symbol: String,
    pub sec_type: String,
    pub exchange: String,
    pub currency: String,
}

/// Asynchronous fault reported by the remote service: bad credentials,
/// connection-level faults, rejected requests.
#[derive(Debug, Clone)]
pub struct SessionFault {
    /// Request the fault relates to, or -1 for connection-level faults.
    pub request_id: i32,
    pub timestamp: OffsetDateTime,
    pub code: i32,
    pub message: String,
}

impl SessionFault {
    /// TWS codes 2100-2169 are status notices, not failures.
    pub fn is_notice(&self) -> bool {
        (2100..=2169).contains(&self.code)
    }
}

/// Portfolio update notification. The probe logs these verbatim but never
/// subscribes to account updates, so against a live service they stay silent.
#[derive(Debug, Clone)]
pub struct PortfolioValue {
    pub account: String,
    pub symbol: String,
    pub quantity: RawQuantity,
    pub market_price: f64,
    pub market_value: f64,
    pub average_cost: f64,
    pub unrealized_pnl: f64,
    pub realized_pnl: f64,
}

/// Event-receiver role of the probe. Implementations are shared with the
/// background listener thread and must synchronize their own state.
pub trait ProbeEvents: Send + Sync {
    /// Fired once when the handshake completes and the transaction-id
    /// namespace is assigned. The driver then issues the single outbound
    /// "subscribe to all positions" request.
    fn session_ready(&self, next_order_id: i32);

    /// One call per (account, instrument) the service currently tracks a
    /// position in. Arrival order is whatever the service chooses.
    fn position(&self, account: &str, instrument: &InstrumentInfo, quantity: RawQuantity, avg_cost: f64);

    /// Terminal sentinel: no more items in this batch. The service gives no
    /// count upfront, so completion is edge-triggered.
    fn positions_end(&self);

    /// Remote/session fault. Policy is log and continue; a fatal connection
    /// error before the sentinel looks the same as "still waiting" until the
    /// timeout elapses.
    fn session_error(&self, fault: &SessionFault);

    fn portfolio_value(&self, _update: &PortfolioValue) {}

    fn account_download_end(&self, _account: &str) {}
}
