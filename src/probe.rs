//! Existence checks for guessed asset URLs.
//!
//! A probe that cannot be answered after [`ProbePolicy::attempts`] tries is
//! reported as "absent", the same as a non-2xx answer. Callers cannot tell
//! the two apart, so an outage spanning the whole retry window silently
//! drops an otherwise valid file from discovery results.

use std::thread;
use std::time::Duration;

use crate::registry::RegistryClient;

pub const DEFAULT_PROBE_ATTEMPTS: u32 = 3;
pub const MIN_PROBE_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbePolicy {
    pub attempts: u32,
    /// Pause between a failed attempt and the next one.
    pub delay: Duration,
}

impl Default for ProbePolicy {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_PROBE_ATTEMPTS,
            delay: MIN_PROBE_DELAY,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ExistenceProber {
    policy: ProbePolicy,
}

impl ExistenceProber {
    pub fn new(policy: ProbePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> ProbePolicy {
        self.policy
    }

    /// Never fails: transport errors are logged and retried, then count as absent.
    pub fn exists<C: RegistryClient + ?Sized>(&self, client: &C, url: &str) -> bool {
        let attempts = self.policy.attempts.max(1);
        for attempt in 1..=attempts {
            match client.head(url) {
                Ok(found) => {
                    tracing::debug!(url, found, "probed asset");
                    return found;
                }
                Err(err) => {
                    tracing::error!("{err} for {url} (retry {attempt}/{attempts})");
                    if attempt < attempts {
                        thread::sleep(self.policy.delay);
                    }
                }
            }
        }
        false
    }
}
