//! Persist entries and error traces into a directory store
//!
//! Run with `TELEMETRY_STORE_DIR=/tmp/telemetry cargo run --example trace_persistence`
//! and inspect the `.jsonl` files afterwards.

use telemetry_log::Telemetry;

#[derive(Debug)]
struct Unavailable(&'static str);

impl std::fmt::Display for Unavailable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} unavailable", self.0)
    }
}

impl std::error::Error for Unavailable {}

fn charge(amount: u64) -> Result<u64, Unavailable> {
    if amount > 100 {
        return Err(Unavailable("payment gateway"));
    }
    Ok(amount)
}

fn main() -> telemetry_log::Result<()> {
    let telemetry = Telemetry::builder().with_hook().json_formatter().build()?;
    let log = telemetry.log();

    log.info("service started", &[]);

    if let Err(err) = charge(250) {
        log.with_trace(&err).error("internal error", &[]);
    }

    telemetry.flush()?;
    println!(
        "documents written under {}",
        telemetry.config().store_dir.display()
    );
    Ok(())
}
