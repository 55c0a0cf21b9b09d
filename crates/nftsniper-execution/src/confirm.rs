//! Bounded polling for asynchronous state changes

use nftsniper_core::{ConfirmError, ProtocolError};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Poll cadence and attempt bound
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl PollSettings {
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }
}

/// Drive `probe` until it yields a value or the attempt bound is reached.
///
/// The probe reports `Ok(Some(value))` when the awaited state is observable,
/// `Ok(None)` when it is not yet, and `Err` when the read itself failed. A
/// failed read counts as an unfinished attempt rather than a terminal
/// failure; flaky reads while waiting for inclusion are expected. Used for
/// pre-trade approvals, proxy initialization, and the order-pair validation
/// retry.
pub async fn poll_until<T, F, Fut>(settings: PollSettings, mut probe: F) -> Result<T, ConfirmError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, ProtocolError>>,
{
    let mut last_error = String::from("state never became observable");

    for attempt in 1..=settings.max_attempts {
        match probe().await {
            Ok(Some(value)) => return Ok(value),
            Ok(None) => {}
            Err(e) => last_error = e.to_string(),
        }

        if attempt < settings.max_attempts {
            sleep(settings.interval).await;
        }
    }

    Err(ConfirmError::TimedOut {
        attempts: settings.max_attempts,
        last_error,
    })
}
