//! Scripted session driver used by tests in place of a live TWS connection.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use time::OffsetDateTime;

use crate::errors::Error;
use crate::events::{InstrumentInfo, ProbeEvents, SessionFault};
use crate::probe::RawQuantity;
use crate::session::ProbeSession;

/// One simulated callback from the remote service.
pub enum ScriptStep {
    Ready(i32),
    Position {
        account: String,
        instrument: InstrumentInfo,
        quantity: RawQuantity,
        avg_cost: f64,
    },
    PositionsEnd,
    Fault { code: i32, message: String },
}

/// Counter handle that stays valid after the session moves into
/// [crate::probe::run_and_collect].
pub struct DisconnectCount(Arc<AtomicUsize>);

impl DisconnectCount {
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// Plays a fixed list of steps on a background thread, mirroring the shape of
/// [crate::session::TwsSession] without any network.
pub struct ScriptedSession {
    steps: Option<Vec<ScriptStep>>,
    player: Option<JoinHandle<()>>,
    disconnects: Arc<AtomicUsize>,
}

impl ScriptedSession {
    pub fn new(steps: Vec<ScriptStep>) -> Self {
        Self {
            steps: Some(steps),
            player: None,
            disconnects: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn disconnects(&self) -> DisconnectCount {
        DisconnectCount(Arc::clone(&self.disconnects))
    }
}

impl ProbeSession for ScriptedSession {
    fn start(&mut self, events: Arc<dyn ProbeEvents>) -> Result<(), Error> {
        let steps = self
            .steps
            .take()
            .ok_or_else(|| Error::Simple("session already started".into()))?;

        self.player = Some(thread::spawn(move || play(steps, events)));

        Ok(())
    }

    fn disconnect(&mut self) {
        self.disconnects.fetch_add(1, Ordering::SeqCst);

        if let Some(player) = self.player.take() {
            let _ = player.join();
        }
    }
}

fn play(steps: Vec<ScriptStep>, events: Arc<dyn ProbeEvents>) {
    for step in steps {
        match step {
            ScriptStep::Ready(next_order_id) => events.session_ready(next_order_id),
            ScriptStep::Position {
                account,
                instrument,
                quantity,
                avg_cost,
            } => events.position(&account, &instrument, quantity, avg_cost),
            ScriptStep::PositionsEnd => events.positions_end(),
            ScriptStep::Fault { code, message } => events.session_error(&SessionFault {
                request_id: -1,
                timestamp: OffsetDateTime::now_utc(),
                code,
                message,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_disconnect_is_idempotent() {
        let mut session = ScriptedSession::new(vec![ScriptStep::Ready(1)]);
        let disconnects = session.disconnects();

        // disconnect before start, then twice more after: never panics
        session.disconnect();

        let (collector, _completion) = crate::probe::Collector::new();
        session.start(collector).expect("start failed");

        session.disconnect();
        session.disconnect();

        assert_eq!(disconnects.count(), 3);
    }

    #[test]
    fn test_second_start_is_rejected() {
        let mut session = ScriptedSession::new(vec![]);

        let (collector, _completion) = crate::probe::Collector::new();
        session.start(Arc::clone(&collector) as Arc<dyn ProbeEvents>).expect("start failed");

        assert!(session.start(collector).is_err());
    }
}
