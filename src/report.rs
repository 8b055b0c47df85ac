//! Human-readable transcript written to standard output.
//!
//! The transcript is the probe's product, not diagnostics: it goes to stdout
//! unconditionally, while `log` carries the driver chatter. Rendering is split
//! from printing so tests can assert on the exact output.

use std::io::{self, Write};
use std::time::Duration;

use crate::events::{PortfolioValue, SessionFault};
use crate::probe::PositionRecord;

const RULE: &str = "==================================================";

pub fn banner() {
    println!("TWS API Position Probe");
    println!("{RULE}");
}

pub fn session_ready(next_order_id: i32) {
    println!("Connected! Next valid order ID: {next_order_id}");
    println!();
    println!("=== Requesting positions ===");
}

pub fn position_dump(record: &PositionRecord) {
    let stdout = io::stdout();
    let _ = render_position(&mut stdout.lock(), record);
}

pub fn render_position(out: &mut impl Write, record: &PositionRecord) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "=== POSITION CALLBACK ===")?;
    writeln!(out, "  Account: {}", record.account)?;
    writeln!(out, "  Symbol: {}", record.symbol)?;
    writeln!(out, "  SecType: {}", record.sec_type)?;
    writeln!(out, "  Exchange: {}", record.exchange)?;
    writeln!(out, "  Currency: {}", record.currency)?;
    writeln!(out, "  Position (raw): {:?}", record.quantity)?;
    writeln!(out, "  Position (str): {}", record.quantity)?;
    match record.quantity.to_f64() {
        Ok(value) => writeln!(out, "  Position (float): {value}")?,
        Err(err) => writeln!(out, "  Position (float conversion failed): {err}")?,
    }
    writeln!(out, "  Avg Cost: {}", record.avg_cost)?;
    Ok(())
}

pub fn positions_end(count: usize) {
    println!();
    println!("=== POSITIONS END ===");
    println!("Total positions received: {count}");
}

pub fn session_fault(fault: &SessionFault) {
    println!(
        "ERROR: reqId={}, time={}, code={}, msg={}",
        fault.request_id, fault.timestamp, fault.code, fault.message
    );
}

pub fn portfolio_dump(update: &PortfolioValue) {
    let stdout = io::stdout();
    let _ = render_portfolio(&mut stdout.lock(), update);
}

pub fn render_portfolio(out: &mut impl Write, update: &PortfolioValue) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "=== UPDATE PORTFOLIO CALLBACK ===")?;
    writeln!(out, "  Account: {}", update.account)?;
    writeln!(out, "  Symbol: {}", update.symbol)?;
    writeln!(out, "  Position (raw): {:?}", update.quantity)?;
    writeln!(out, "  Position (str): {}", update.quantity)?;
    match update.quantity.to_f64() {
        Ok(value) => writeln!(out, "  Position (float): {value}")?,
        Err(err) => writeln!(out, "  Position (float conversion failed): {err}")?,
    }
    writeln!(out, "  Market Price: {}", update.market_price)?;
    writeln!(out, "  Market Value: {}", update.market_value)?;
    writeln!(out, "  Avg Cost: {}", update.average_cost)?;
    writeln!(out, "  Unrealized PNL: {}", update.unrealized_pnl)?;
    writeln!(out, "  Realized PNL: {}", update.realized_pnl)?;
    Ok(())
}

pub fn account_download_end(account: &str) {
    println!();
    println!("=== ACCOUNT DOWNLOAD END: {account} ===");
}

pub fn summary(records: &[PositionRecord]) {
    let stdout = io::stdout();
    let _ = render_summary(&mut stdout.lock(), records);
}

pub fn render_summary(out: &mut impl Write, records: &[PositionRecord]) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{RULE}")?;
    writeln!(out, "SUMMARY")?;
    writeln!(out, "{RULE}")?;
    for record in records {
        writeln!(
            out,
            "{:<10} | Position: {} | Avg Cost: ${:.2}",
            record.symbol, record.quantity, record.avg_cost
        )?;
    }
    Ok(())
}

pub fn timeout(timeout: Duration) {
    println!();
    println!("Timeout after {}s waiting for positions", timeout.as_secs());
}

pub fn disconnecting() {
    println!();
    println!("Disconnecting...");
}
