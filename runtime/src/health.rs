use std::time::Duration;

use fnv::FnvHashMap;
use tokio::time::Instant;

/// Without a successful command for this long the link counts as degraded.
pub const COMMAND_STALENESS: Duration = Duration::from_secs(300);

#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, derive_more::Display)]
pub enum Fault {
    #[display(fmt = "initialization")]
    Init,
    #[display(fmt = "transmit")]
    SendFailure,
    #[display(fmt = "missing acknowledgment")]
    NoAck,
    #[display(fmt = "transport")]
    Transport,
}

impl Fault {
    pub const ALL: [Fault; 4] = [Fault::Init, Fault::SendFailure, Fault::NoAck, Fault::Transport];

    /// Consecutive occurrences that mark the link degraded.
    #[inline]
    pub const fn threshold(self) -> u32 {
        match self {
            Fault::Init => 3,
            Fault::SendFailure => 5,
            Fault::NoAck => 10,
            Fault::Transport => 8,
        }
    }
}

#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, derive_more::Display)]
pub enum Operation {
    Send,
    AckReceived,
    Command,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Health {
    Healthy,
    Degraded(String),
}

impl Health {
    #[inline]
    pub fn is_healthy(&self) -> bool {
        matches!(self, Health::Healthy)
    }
}

/// Consecutive-fault counters and last-success timestamps for one endpoint.
#[derive(Debug, Clone)]
pub struct HealthMonitor {
    faults:       FnvHashMap<Fault, u32>,
    last_success: FnvHashMap<Operation, Instant>,
    started:      Instant,
}

impl Default for HealthMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthMonitor {
    pub fn new() -> Self {
        Self {
            faults:       FnvHashMap::default(),
            last_success: FnvHashMap::default(),
            started:      Instant::now(),
        }
    }

    /// Count one more occurrence. Returns whether the threshold is now reached.
    pub fn record_fault(&mut self, fault: Fault) -> bool {
        let count = self.faults.entry(fault).or_default();
        *count = count.saturating_add(1);

        let tripped = *count >= fault.threshold();

        if tripped {
            tracing::warn!(%fault, count = *count, threshold = fault.threshold(), "fault threshold reached");
        }

        tripped
    }

    #[inline]
    pub fn fault_count(&self, fault: Fault) -> u32 {
        self.faults.get(&fault).copied().unwrap_or(0)
    }

    #[inline]
    pub fn reset(&mut self, fault: Fault) {
        self.faults.remove(&fault);
    }

    pub fn reset_all(&mut self) {
        self.faults.clear();
    }

    #[inline]
    pub fn record_success(&mut self, op: Operation) {
        self.last_success.insert(op, Instant::now());
    }

    #[inline]
    pub fn since_success(&self, op: Operation) -> Option<Duration> {
        self.last_success.get(&op).map(Instant::elapsed)
    }

    pub fn check(&self) -> Health {
        for fault in Fault::ALL {
            if self.fault_count(fault) >= fault.threshold() {
                return Health::Degraded(format!("too many consecutive {} failures", fault));
            }
        }

        // a monitor that never saw a command succeed is judged from its creation
        let quiet = self.since_success(Operation::Command).unwrap_or_else(|| self.started.elapsed());

        if quiet > COMMAND_STALENESS {
            return Health::Degraded(format!("no successful modem command in {}s", quiet.as_secs()));
        }

        Health::Healthy
    }
}
