//! Basic usage of the structured logger

use telemetry_log::prelude::*;
use telemetry_log::{info, warn};

#[derive(Debug)]
struct User {
    id: u64,
    email: String,
}

impl Loggable for User {
    fn as_log(&self) -> FieldValue {
        // Never log the full address
        let domain = self.email.split('@').nth(1).unwrap_or("unknown");
        FieldValue::Any(serde_json::json!({ "id": self.id, "email_domain": domain }))
    }
}

fn main() -> Result<()> {
    let logger = Logger::builder().level(LogLevel::Debug).build()?;

    logger.debug("starting", &[]);

    let request = logger.with_ctx(ctx::string("request_id", "req-7f3a"));
    let user = User {
        id: 42,
        email: "ada@example.com".to_string(),
    };
    request.info("user signed in", &[ctx::loggable("user", &user)]);

    info!(request, "served {} items", 3);
    warn!(request, [ctx::f64("latency_s", 1.7)], "slow response");

    let json = Logger::builder().json().build()?;
    let err = std::io::Error::new(std::io::ErrorKind::NotFound, "config.toml missing");
    json.with_trace(&err).error("cannot load settings", &[]);

    Ok(())
}
