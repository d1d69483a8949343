use std::{thread, time::Duration};

use tracing::info;

use crate::error::RemovalError;

/// Background-removal backend. A batch either completes as a whole or fails as a whole.
pub trait RemovalService: Send + Sync {
    fn submit_batch(&self, identifiers: &[String]) -> Result<(), RemovalError>;
}

/// Stand-in for the real service: waits for a fixed round-trip and succeeds.
pub struct SimulatedRemoval {
    pub delay: Duration,
}

impl SimulatedRemoval {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl RemovalService for SimulatedRemoval {
    fn submit_batch(&self, identifiers: &[String]) -> Result<(), RemovalError> {
        info!(count = identifiers.len(), delay_ms = self.delay.as_millis() as u64, "simulating background removal");
        thread::sleep(self.delay);
        Ok(())
    }
}
