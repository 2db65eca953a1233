// Copyright 2026 Tenant Scout Contributors
// SPDX-License-Identifier: Apache-2.0

//! Progress event types and broadcast channel for run telemetry.
//!
//! The batch orchestrator emits `ProgressEvent`s as it selects targets and
//! works through locations. Events flow through a `tokio::sync::broadcast`
//! channel to any subscriber (the CLI progress bar, a JSON log). When no
//! subscriber exists, events are silently dropped.

use serde::{Deserialize, Serialize};

/// A progress event emitted during a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// The run this event belongs to.
    pub run_id: String,
    /// Monotonically increasing sequence number.
    pub seq: u64,
    /// The kind of progress event.
    pub event: ProgressEventKind,
}

/// The specific kind of progress event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ProgressEventKind {
    /// The run moved to a new phase.
    PhaseChanged { phase: RunPhase },
    /// Targets were selected; `total` locations will be processed.
    TargetsSelected { total: usize },
    /// Work on a location started.
    LocationStarted {
        index: usize,
        total: usize,
        location_id: String,
        name: String,
    },
    /// A location finished, successfully or not.
    LocationFinished {
        index: usize,
        total: usize,
        location_id: String,
        tenants_found: usize,
        tenants_saved: usize,
        source: String,
        error: Option<String>,
    },
    /// Periodic running totals.
    Checkpoint {
        processed: usize,
        total: usize,
        success: usize,
        failed: usize,
        total_tenants: usize,
    },
    /// The run finished.
    RunComplete {
        success: usize,
        failed: usize,
        total_tenants: usize,
        elapsed_ms: u64,
    },
    /// A non-fatal warning occurred.
    Warning { message: String },
}

/// Orchestrator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RunPhase {
    SelectingTargets,
    Processing,
    Finished,
}

impl std::fmt::Display for RunPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SelectingTargets => write!(f, "Selecting targets"),
            Self::Processing => write!(f, "Processing"),
            Self::Finished => write!(f, "Finished"),
        }
    }
}

/// Sender handle for emitting progress events.
///
/// When no listeners exist, `send()` returns an error which is ignored.
pub type ProgressSender = tokio::sync::broadcast::Sender<ProgressEvent>;

/// Receiver handle for consuming progress events.
pub type ProgressReceiver = tokio::sync::broadcast::Receiver<ProgressEvent>;

/// Create a new progress broadcast channel with a bounded buffer.
///
/// 256 events covers a default batch of 50 locations (two events each plus
/// checkpoints) with room to spare for a slow subscriber.
pub fn channel() -> (ProgressSender, ProgressReceiver) {
    tokio::sync::broadcast::channel(256)
}

/// Emit a progress event, silently ignoring send errors (which occur when
/// no receivers are listening).
pub fn emit(tx: &Option<ProgressSender>, run_id: &str, seq: &mut u64, event: ProgressEventKind) {
    if let Some(ref sender) = tx {
        *seq += 1;
        let _ = sender.send(ProgressEvent {
            run_id: run_id.to_string(),
            seq: *seq,
            event,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_event_serialization() {
        let event = ProgressEvent {
            run_id: "run-1".to_string(),
            seq: 1,
            event: ProgressEventKind::PhaseChanged {
                phase: RunPhase::SelectingTargets,
            },
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("SelectingTargets"));
        assert!(json.contains("PhaseChanged"));

        let parsed: ProgressEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.run_id, "run-1");
        assert_eq!(parsed.seq, 1);
    }

    #[test]
    fn test_location_finished_serialization() {
        let event = ProgressEvent {
            run_id: "run-42".to_string(),
            seq: 10,
            event: ProgressEventKind::LocationFinished {
                index: 3,
                total: 50,
                location_id: "loc-9".to_string(),
                tenants_found: 156,
                tenants_saved: 150,
                source: "sitemap-urls".to_string(),
                error: None,
            },
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("156"));
        assert!(json.contains("LocationFinished"));
    }

    #[tokio::test]
    async fn test_emit_sequences_events() {
        let (tx, mut rx) = channel();
        let tx = Some(tx);
        let mut seq = 0;
        emit(&tx, "r", &mut seq, ProgressEventKind::TargetsSelected { total: 2 });
        emit(
            &tx,
            "r",
            &mut seq,
            ProgressEventKind::Warning {
                message: "slow site".to_string(),
            },
        );
        assert_eq!(rx.recv().await.unwrap().seq, 1);
        assert_eq!(rx.recv().await.unwrap().seq, 2);
    }

    #[test]
    fn test_channel_no_receivers() {
        let (tx, rx) = channel();
        drop(rx);
        emit(
            &Some(tx),
            "test",
            &mut 0,
            ProgressEventKind::Warning {
                message: "test".to_string(),
            },
        );
    }

    #[test]
    fn test_emit_none_sender() {
        emit(
            &None,
            "test",
            &mut 0,
            ProgressEventKind::Warning {
                message: "test".to_string(),
            },
        );
    }

    #[test]
    fn test_run_phase_display() {
        assert_eq!(RunPhase::SelectingTargets.to_string(), "Selecting targets");
        assert_eq!(RunPhase::Finished.to_string(), "Finished");
    }
}
