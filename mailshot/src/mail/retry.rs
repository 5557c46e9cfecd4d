//! Bounded retry with exponential backoff around a single send.

use std::convert::Infallible;
use std::future::Future;
use std::time::Duration;

use super::{Email, MailError, Mailer, SendReceipt};

/// How many times to try a send and how long to back off between tries.
///
/// The wait before retry `n + 1` is `base_delay * 2^(n - 1)`: 1s, 2s, 4s, ...
/// with the default one-second base.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Self::default()
        }
    }

    /// Delay to wait after the given (1-indexed) failed attempt.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2_u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor)
    }
}

/// Outcome of [`send_with_retry`].
#[derive(Debug, Clone)]
pub struct Delivery {
    pub result: Result<SendReceipt, MailError>,
    /// Attempts made, including the first.
    pub attempts: u32,
}

impl Delivery {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// Attempts beyond the first.
    pub fn retries(&self) -> u32 {
        self.attempts.saturating_sub(1)
    }
}

/// Send `email`, retrying transient failures with exponential backoff.
///
/// Permanent failures return immediately. A `max_attempts` of zero still
/// makes one attempt.
pub async fn send_with_retry<M>(mailer: &M, email: &Email, policy: RetryPolicy) -> Delivery
where
    M: Mailer + ?Sized,
{
    let proceed = || std::future::ready(Ok::<(), Infallible>(()));
    match send_with_retry_until(mailer, email, policy, proceed).await {
        Ok(delivery) => delivery,
        Err(never) => match never {},
    }
}

/// [`send_with_retry`] with a guard consulted after each backoff.
///
/// `proceed` is awaited before every retry. It may hold, for example to wait
/// out a pause. When it fails, no further attempt is made and its error is
/// returned. The first attempt is never guarded; callers check before they
/// start.
pub async fn send_with_retry_until<M, F, Fut, E>(
    mailer: &M,
    email: &Email,
    policy: RetryPolicy,
    mut proceed: F,
) -> Result<Delivery, E>
where
    M: Mailer + ?Sized,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(), E>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match mailer.send(email).await {
            Ok(receipt) => {
                tracing::debug!(to = %email.to, attempt, "email sent");
                return Ok(Delivery {
                    result: Ok(receipt),
                    attempts: attempt,
                });
            }
            Err(err) => {
                tracing::warn!(to = %email.to, attempt, error = %err, "send attempt failed");

                if !err.is_transient() || attempt >= max_attempts {
                    if err.is_transient() {
                        tracing::warn!(to = %email.to, attempts = attempt, "all retry attempts failed");
                    }
                    return Ok(Delivery {
                        result: Err(err),
                        attempts: attempt,
                    });
                }

                let backoff = policy.backoff(attempt);
                tracing::info!(
                    to = %email.to,
                    attempt,
                    backoff_ms = backoff.as_millis() as u64,
                    "transient failure, backing off"
                );
                tokio::time::sleep(backoff).await;

                if let Err(err) = proceed().await {
                    tracing::info!(to = %email.to, attempts = attempt, "retry abandoned");
                    return Err(err);
                }
                attempt += 1;
            }
        }
    }
}
