//! A diagnostic probe for the position feed of the Interactive Brokers TWS API.
//!
//! The probe connects to TWS or IB Gateway, subscribes once to the account's
//! current positions, prints every field of each callback (including the raw,
//! string and float-converted forms of the position quantity) and exits. Its
//! purpose is to let a developer inspect how the API represents numeric
//! position data; the conversion's success or failure is itself part of the
//! report, not an error.
//!
//! The wire protocol and session handling live in the [ibapi] crate. This
//! crate only drives it: one background listener translates the vendor's
//! position updates into [events::ProbeEvents] callbacks, and
//! [probe::run_and_collect] waits for the terminal sentinel or a timeout,
//! then tears the session down.
//!
//!```no_run
//! use std::time::Duration;
//!
//! use position_probe::config::ProbeConfig;
//! use position_probe::probe;
//! use position_probe::session::TwsSession;
//!
//! let config = ProbeConfig::from_env();
//! let session = TwsSession::connect(&config).expect("connection failed");
//! let outcome = probe::run_and_collect(session, Duration::from_secs(15));
//! println!("received {} positions, completed: {}", outcome.records.len(), outcome.completed);
//!```

/// Process configuration: host, port, client id and timeout.
pub mod config;

mod errors;

/// Callback interfaces at the vendor boundary.
pub mod events;

/// Position collection and the probe lifecycle.
pub mod probe;

/// Human-readable transcript written to standard output.
pub mod report;

/// Connection driver over the vendor client library.
pub mod session;

#[cfg(test)]
pub(crate) mod stubs;

pub use errors::Error;
