//! What an asynchronous sink does when its queue is full

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Policy for a full [`AsyncSink`](crate::sinks::AsyncSink) queue.
///
/// Critical entries (Error and Fatal) are never subject to the policy: when
/// they cannot be queued they are written synchronously instead.
///
/// ```
/// use telemetry_log::OverflowPolicy;
/// use std::time::Duration;
///
/// assert_eq!(OverflowPolicy::default(), OverflowPolicy::AlertAndDrop);
/// let patient = OverflowPolicy::BlockWithTimeout(Duration::from_millis(100));
/// assert_eq!(patient.to_string(), "block_with_timeout(100ms)");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Discard the new entry and count it
    DropNewest,

    /// Wait for space; the caller sees the backpressure
    Block,

    /// Wait up to the timeout, then discard
    BlockWithTimeout(Duration),

    /// Discard, warn on stderr and invoke the overflow callback
    #[default]
    AlertAndDrop,
}

impl fmt::Display for OverflowPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverflowPolicy::DropNewest => write!(f, "drop_newest"),
            OverflowPolicy::Block => write!(f, "block"),
            OverflowPolicy::BlockWithTimeout(d) => write!(f, "block_with_timeout({:?})", d),
            OverflowPolicy::AlertAndDrop => write!(f, "alert_and_drop"),
        }
    }
}

/// Called with the total number of dropped entries after each drop
pub type OverflowCallback = Arc<dyn Fn(u64) + Send + Sync>;
