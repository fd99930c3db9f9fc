//! Time-based identifier tokens for trips and itinerary items.

use chrono::Utc;
use std::sync::atomic::{AtomicI64, Ordering};

static LAST_TOKEN: AtomicI64 = AtomicI64::new(0);

/// Returns the current time in milliseconds as a token.
///
/// Tokens are strictly increasing within a process, so two items created in
/// the same millisecond still get distinct ids.
pub fn time_token() -> String {
    let now = Utc::now().timestamp_millis();
    let mut last = LAST_TOKEN.load(Ordering::Relaxed);
    loop {
        let next = if now > last { now } else { last + 1 };
        match LAST_TOKEN.compare_exchange_weak(last, next, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => return next.to_string(),
            Err(actual) => last = actual,
        }
    }
}

/// Returns an id for an item that came from the suggestion service.
pub fn suggestion_token() -> String {
    format!(
        "ai-{}-{}",
        Utc::now().timestamp_millis(),
        rand::random::<u32>()
    )
}
