//! Dev server readiness probing.
//!
//! After the start command is issued the server is polled at a fixed
//! interval. Any HTTP response counts as ready, including error statuses:
//! the question is whether something is listening, not whether the page
//! renders.

use crate::config::ReadinessConfig;
use crate::core::error::ProbeError;

/// Network access used by the prober.
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Issue one request. `Ok` on any response, `Err` when the connection
    /// could not be made.
    async fn connect(&self, url: &str) -> Result<(), ProbeError>;

    async fn sleep(&self, millis: u32);
}

/// Outcome of a probe run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The server answered on the given attempt (1-based).
    Ready { attempt: u32 },
    /// Every attempt failed.
    Exhausted { attempts: u32 },
}

#[cfg(test)]
impl ProbeOutcome {
    pub fn is_ready(self) -> bool {
        matches!(self, Self::Ready { .. })
    }
}

pub struct ReadinessProber<T> {
    transport: T,
}

impl<T: Transport> ReadinessProber<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    #[cfg(test)]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Poll `url` up to `max_attempts` times, waiting `interval_ms` between
    /// attempts. The first attempt is immediate and there is no wait after
    /// the last one. A `max_attempts` of zero is treated as one.
    pub async fn probe(&self, url: &str, interval_ms: u32, max_attempts: u32) -> ProbeOutcome {
        let max_attempts = max_attempts.max(1);

        for attempt in 1..=max_attempts {
            match self.transport.connect(url).await {
                Ok(()) => {
                    log::debug!("{} answered on attempt {}", url, attempt);
                    return ProbeOutcome::Ready { attempt };
                }
                Err(e) => {
                    log::debug!("probe attempt {}/{} failed: {}", attempt, max_attempts, e);
                }
            }
            if attempt < max_attempts {
                self.transport.sleep(interval_ms).await;
            }
        }

        ProbeOutcome::Exhausted {
            attempts: max_attempts,
        }
    }

    /// [`probe`](Self::probe) with a config's url and policy.
    pub async fn probe_with(&self, config: &ReadinessConfig) -> ProbeOutcome {
        self.probe(&config.url, config.interval_ms, config.max_attempts)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::testing::ScriptedTransport;

    #[tokio::test]
    async fn test_ready_on_first_attempt() {
        let prober = ReadinessProber::new(ScriptedTransport::ready_after(0));
        let outcome = prober.probe("http://localhost:3000", 1000, 30).await;

        assert_eq!(outcome, ProbeOutcome::Ready { attempt: 1 });
        assert_eq!(prober.transport().attempts(), 1);
        assert!(prober.transport().sleeps().is_empty());
    }

    #[tokio::test]
    async fn test_ready_after_failures() {
        let prober = ReadinessProber::new(ScriptedTransport::ready_after(4));
        let outcome = prober.probe("http://localhost:3000", 250, 30).await;

        assert_eq!(outcome, ProbeOutcome::Ready { attempt: 5 });
        assert_eq!(prober.transport().sleeps(), vec![250; 4]);
    }

    #[tokio::test]
    async fn test_exactly_max_attempts_without_trailing_wait() {
        let prober = ReadinessProber::new(ScriptedTransport::never_ready());
        let outcome = prober.probe("http://localhost:3000", 1000, 3).await;

        assert_eq!(outcome, ProbeOutcome::Exhausted { attempts: 3 });
        assert!(!outcome.is_ready());
        assert_eq!(prober.transport().attempts(), 3);
        assert_eq!(prober.transport().sleeps(), vec![1000, 1000]);
    }

    #[tokio::test]
    async fn test_zero_attempts_still_probes_once() {
        let prober = ReadinessProber::new(ScriptedTransport::never_ready());
        let outcome = prober.probe("http://localhost:3000", 10, 0).await;

        assert_eq!(outcome, ProbeOutcome::Exhausted { attempts: 1 });
        assert_eq!(prober.transport().attempts(), 1);
    }

    #[tokio::test]
    async fn test_probe_with_config() {
        let prober = ReadinessProber::new(ScriptedTransport::ready_after(1));
        let config = ReadinessConfig {
            url: "http://localhost:5173".into(),
            interval_ms: 5,
            max_attempts: 2,
        };

        assert!(prober.probe_with(&config).await.is_ready());
        assert_eq!(prober.transport().urls(), vec!["http://localhost:5173"; 2]);
    }
}
