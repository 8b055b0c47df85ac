//! Command-line entry point for the position probe.
//!
//! Exits 0 after teardown regardless of whether positions were received; the
//! transcript on stdout is the probe's product.

use clap::{arg, value_parser, Command};
use log::error;

use position_probe::config::{ProbeConfig, GATEWAY_PORT};
use position_probe::probe;
use position_probe::report;
use position_probe::session::TwsSession;

fn main() {
    env_logger::init();

    let matches = Command::new("position-probe")
        .about("Dumps every TWS position callback, including raw, string and float forms of each quantity")
        .arg(arg!(--host <HOST> "TWS/Gateway host").required(false))
        .arg(
            arg!(--port <PORT> "API port; overrides --gateway")
                .value_parser(value_parser!(u16))
                .required(false),
        )
        .arg(arg!(--gateway "Use the IB Gateway default port instead of the TWS one"))
        .arg(
            arg!(--client_id <ID> "Client id, unique per concurrent session")
                .value_parser(value_parser!(i32))
                .required(false),
        )
        .arg(
            arg!(--timeout <SECONDS> "Seconds to wait for the position snapshot")
                .value_parser(value_parser!(u64))
                .required(false),
        )
        .get_matches();

    let mut config = ProbeConfig::from_env();
    if matches.get_flag("gateway") {
        config.port = GATEWAY_PORT;
    }
    if let Some(host) = matches.get_one::<String>("host") {
        config.host = host.clone();
    }
    if let Some(port) = matches.get_one::<u16>("port") {
        config.port = *port;
    }
    if let Some(client_id) = matches.get_one::<i32>("client_id") {
        config.client_id = *client_id;
    }
    if let Some(timeout) = matches.get_one::<u64>("timeout") {
        config.timeout = std::time::Duration::from_secs(*timeout);
    }

    report::banner();
    println!("Connecting to {} (client id {})...", config.address(), config.client_id);

    let session = match TwsSession::connect(&config) {
        Ok(session) => session,
        Err(err) => {
            // Nothing to probe; still a clean exit, the probe has no
            // exit-code contract beyond "0 after teardown".
            error!("connection failed: {err}");
            println!("Could not connect to {}: {err}", config.address());
            return;
        }
    };

    let outcome = probe::run_and_collect(session, config.timeout);

    if outcome.completed {
        report::summary(&outcome.records);
    } else {
        report::timeout(config.timeout);
    }

    println!("Done!");
}
