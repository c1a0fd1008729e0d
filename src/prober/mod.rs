use serde::{Serialize, Serializer};
use std::time::Duration;

pub mod tcp_connect;

/// One scheduled connection attempt. Consumed by exactly one worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeJob {
    pub host: String,
    pub port: u16,
    pub timeout: Duration,
}

/// Outcome of a single probe: connect latency in ms, or a failure marker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProbeOutcome {
    Success(f64),
    Failure,
}

impl ProbeOutcome {
    pub fn latency_ms(&self) -> Option<f64> {
        match self {
            ProbeOutcome::Success(ms) => Some(*ms),
            ProbeOutcome::Failure => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ProbeOutcome::Success(_))
    }
}

// Reported as a bare number, or `false` when the attempt failed.
impl Serialize for ProbeOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ProbeOutcome::Success(ms) => serializer.serialize_f64(*ms),
            ProbeOutcome::Failure => serializer.serialize_bool(false),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProbeResult {
    pub host: String,
    pub outcome: ProbeOutcome,
}
