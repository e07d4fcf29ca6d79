//! Event stream replay
//!
//! The transport stand-in: an NDJSON stream of `{ "topic": ..., "message":
//! ... }` lines, one event per line. Each event is processed fully before
//! the next; a failing event is logged and counted without stopping the
//! stream, mirroring broker redelivery semantics.

use crate::dispatch::process_event;
use edsync_common::db::SyncStore;
use edsync_common::Result;
use serde::Deserialize;
use serde_json::Value;
use std::io::BufRead;
use tracing::{error, warn};

/// One recorded event on the stream
#[derive(Debug, Clone, Deserialize)]
pub struct RecordedEvent {
    pub topic: String,
    pub message: Value,
}

/// Counters for one replay run, reported whether or not every event
/// succeeded
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayStats {
    /// Lines consumed from the stream
    pub processed: usize,
    /// Events handled to completion
    pub handled: usize,
    /// Lines that did not decode into an event
    pub skipped: usize,
    /// Events whose processing failed (left for redelivery)
    pub errors: usize,
}

impl ReplayStats {
    pub fn display_string(&self) -> String {
        format!(
            "{} events processed ({} handled, {} skipped, {} errors)",
            self.processed, self.handled, self.skipped, self.errors
        )
    }
}

/// Replay every event on the reader, one at a time
pub async fn replay(store: &SyncStore, reader: impl BufRead) -> Result<ReplayStats> {
    let mut stats = ReplayStats::default();

    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        stats.processed += 1;

        let event: RecordedEvent = match serde_json::from_str(&line) {
            Ok(event) => event,
            Err(err) => {
                warn!("Skipping undecodable event line: {}", err);
                stats.skipped += 1;
                continue;
            }
        };

        if let Err(err) = process_event(store, &event.topic, event.message).await {
            // This event fails alone; the stream continues
            error!("Error processing event from topic {}: {}", event.topic, err);
            stats.errors += 1;
        } else {
            stats.handled += 1;
        }
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recorded_event_decodes() {
        let line = r#"{"topic":"user-topic","message":{"eventType":"USER_CREATED","data":{}}}"#;
        let event: RecordedEvent = serde_json::from_str(line).unwrap();
        assert_eq!(event.topic, "user-topic");
        assert!(event.message.get("eventType").is_some());
    }

    #[test]
    fn test_replay_stats_display() {
        let stats = ReplayStats {
            processed: 5,
            handled: 3,
            skipped: 1,
            errors: 1,
        };
        assert_eq!(
            stats.display_string(),
            "5 events processed (3 handled, 1 skipped, 1 errors)"
        );
    }
}
