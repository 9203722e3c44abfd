use std::time::Duration;

/// Tunables for the transfer engine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineConfig {
    /// Upper bound on waiting for an account lock. `None` waits forever.
    pub lock_timeout: Option<Duration>,
}

impl EngineConfig {
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = Some(timeout);
        self
    }

    /// Build from a millisecond count as given on the command line.
    /// Zero disables the bound.
    pub fn from_lock_timeout_ms(ms: Option<u64>) -> Self {
        match ms {
            Some(ms) if ms > 0 => Self::default().with_lock_timeout(Duration::from_millis(ms)),
            _ => Self::default(),
        }
    }
}
