//! Connection driver over the vendor client library.
//!
//! [TwsSession] owns the vendor client and the background listener thread that
//! drains the positions subscription. Connection-control is deliberately a
//! separate trait from the event-receiver side, so the lifecycle in
//! [crate::probe::run_and_collect] composes the two instead of one object
//! inheriting both roles.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use ibapi::accounts::PositionUpdate;
use ibapi::Client;
use log::{debug, warn};
use time::OffsetDateTime;

use crate::config::ProbeConfig;
use crate::errors::Error;
use crate::events::{InstrumentInfo, ProbeEvents, SessionFault};
use crate::probe::RawQuantity;

/// How often the listener re-checks for teardown while draining the
/// subscription.
const DRAIN_INTERVAL: Duration = Duration::from_millis(250);

/// Connection-control role of the probe.
pub trait ProbeSession {
    /// Spawns the background listener that translates vendor callbacks into
    /// [ProbeEvents] calls. Does not wait for data.
    fn start(&mut self, events: Arc<dyn ProbeEvents>) -> Result<(), Error>;

    /// Unconditional teardown. Safe to call more than once, and after a
    /// failed or already-closed connection.
    fn disconnect(&mut self);
}

/// A live session against TWS or IB Gateway.
pub struct TwsSession {
    client: Option<Client>,
    shutdown: Arc<AtomicBool>,
    listener: Option<JoinHandle<()>>,
}

impl TwsSession {
    /// Opens the connection. The vendor client completes the handshake before
    /// returning; session-ready is still reported asynchronously through
    /// [ProbeEvents::session_ready] once the listener starts.
    pub fn connect(config: &ProbeConfig) -> Result<Self, Error> {
        let address = config.address();
        debug!("connecting to {address} with client id {}", config.client_id);

        let client = Client::connect(&address, config.client_id)?;

        Ok(Self {
            client: Some(client),
            shutdown: Arc::new(AtomicBool::new(false)),
            listener: None,
        })
    }
}

impl ProbeSession for TwsSession {
    fn start(&mut self, events: Arc<dyn ProbeEvents>) -> Result<(), Error> {
        let client = self
            .client
            .take()
            .ok_or_else(|| Error::Simple("session already started".into()))?;
        let shutdown = Arc::clone(&self.shutdown);

        self.listener = Some(thread::spawn(move || listen(client, events, shutdown)));

        Ok(())
    }

    fn disconnect(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);

        // Dropping the client closes the socket if the listener never ran.
        self.client.take();

        if let Some(listener) = self.listener.take() {
            if listener.join().is_err() {
                warn!("listener thread panicked during teardown");
            }
        }

        debug!("session closed");
    }
}

/// Background listener: owns the client, drains the positions subscription
/// and invokes the capability callbacks synchronously as data arrives.
fn listen(client: Client, events: Arc<dyn ProbeEvents>, shutdown: Arc<AtomicBool>) {
    debug!(
        "session ready: server version {}, connected at {:?}",
        client.server_version(),
        client.connection_time()
    );
    events.session_ready(client.next_order_id());

    // The one and only outbound request: all positions across all accounts.
    let subscription = match client.positions() {
        Ok(subscription) => subscription,
        Err(err) => {
            events.session_error(&session_fault(err));
            return;
        }
    };

    loop {
        if shutdown.load(Ordering::SeqCst) {
            subscription.cancel();
            break;
        }

        match subscription.next_timeout(DRAIN_INTERVAL) {
            Some(PositionUpdate::Position(position)) => {
                let instrument = InstrumentInfo {
                    symbol: position.contract.symbol.to_string(),
                    sec_type: position.contract.security_type.to_string(),
                    exchange: position.contract.exchange.to_string(),
                    currency: position.contract.currency.to_string(),
                };
                events.position(
                    &position.account,
                    &instrument,
                    RawQuantity::from(position.position),
                    position.average_cost,
                );
            }
            Some(PositionUpdate::PositionEnd) => {
                events.positions_end();
                // Leaving the subscription open would stream live updates;
                // the probe only wants the initial batch.
                subscription.cancel();
                break;
            }
            None => {
                // Either the drain interval elapsed with no data, or the
                // subscription failed. Faults are reported and the loop keeps
                // listening until the waiter times out and requests teardown.
                if let Some(err) = subscription.error() {
                    events.session_error(&session_fault(err));
                }
            }
        }
    }

    // Client drops here; the vendor library closes the socket.
}

fn session_fault(err: ibapi::Error) -> SessionFault {
    let (code, message) = match err {
        ibapi::Error::Message(code, message) => (code, message),
        other => (-1, other.to_string()),
    };

    SessionFault {
        request_id: -1,
        timestamp: OffsetDateTime::now_utc(),
        code,
        message,
    }
}
