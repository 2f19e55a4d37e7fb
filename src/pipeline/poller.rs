use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::errors::{ScanError, TransportError};

/// One status read of a remote job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusReading {
    pub progress: u8,
    pub done: bool,
}

impl StatusReading {
    pub fn from_progress(progress: u8) -> Self {
        let progress = progress.min(100);
        Self { progress, done: progress >= 100 }
    }

    fn finished() -> Self {
        Self { progress: 100, done: true }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PollPolicy {
    /// Attempt ceiling. Zero means no ceiling.
    pub max_attempts: u32,
    pub interval: Duration,
}

impl PollPolicy {
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self { max_attempts, interval }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOutcome {
    pub attempts: u32,
    pub progress: u8,
    /// The job vanished (404) and was taken as finished.
    pub recovered: bool,
}

/// Repeatedly `check` a remote job until it reports done.
///
/// Cancellation is checked before every iteration and interrupts the sleep
/// between iterations. `on_progress(progress, attempt)` fires only when the
/// reported progress changes; progress never goes backwards. A "not found"
/// read ends the poll as done at 100%. A read that gets no response means the
/// engine went away; any other check failure propagates as is. The ceiling is
/// checked right after a read, so the last attempt never waits out an interval.
pub async fn poll_until_complete<C, Fut, P>(
    mut check: C,
    mut on_progress: P,
    cancel: &CancellationToken,
    policy: &PollPolicy,
) -> Result<PollOutcome, ScanError>
where
    C: FnMut() -> Fut,
    Fut: Future<Output = Result<StatusReading, TransportError>>,
    P: FnMut(u8, u32),
{
    let mut attempts: u32 = 0;
    let mut last: Option<u8> = None;

    loop {
        if cancel.is_cancelled() {
            debug!(attempts, "Poll cancelled");
            return Err(ScanError::Cancelled);
        }
        attempts += 1;

        let (reading, recovered) = match check().await {
            Ok(reading) => (reading, false),
            Err(e) if e.is_not_found() => {
                warn!(attempt = attempts, "Job status returned 404, treating as complete");
                (StatusReading::finished(), true)
            }
            Err(e) => return Err(ScanError::from_remote(e, ScanError::Transport)),
        };

        let progress = match last {
            Some(previous) => reading.progress.max(previous),
            None => reading.progress,
        };
        if last != Some(progress) {
            on_progress(progress, attempts);
            last = Some(progress);
        }

        if reading.done {
            return Ok(PollOutcome { attempts, progress, recovered });
        }
        if policy.max_attempts > 0 && attempts >= policy.max_attempts {
            return Err(ScanError::PollTimeout { attempts });
        }

        tokio::select! {
            _ = cancel.cancelled() => {
                debug!(attempts, "Poll cancelled while waiting");
                return Err(ScanError::Cancelled);
            }
            _ = tokio::time::sleep(policy.interval) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    fn fast(max_attempts: u32) -> PollPolicy {
        PollPolicy::new(max_attempts, Duration::from_millis(1))
    }

    /// Replays `script` one reading per check; repeats the last entry.
    fn scripted(
        script: Vec<Result<u8, TransportError>>,
        calls: &AtomicU32,
    ) -> impl FnMut() -> std::future::Ready<Result<StatusReading, TransportError>> + '_ {
        move || {
            let i = calls.fetch_add(1, Ordering::SeqCst) as usize;
            let entry = script[i.min(script.len() - 1)].clone();
            std::future::ready(entry.map(StatusReading::from_progress))
        }
    }

    #[tokio::test]
    async fn test_completes_and_emits_only_changes() {
        let calls = AtomicU32::new(0);
        let seen = Mutex::new(Vec::new());
        let outcome = poll_until_complete(
            scripted(vec![Ok(10), Ok(10), Ok(50), Ok(100)], &calls),
            |p, _| seen.lock().unwrap().push(p),
            &CancellationToken::new(),
            &fast(10),
        )
        .await
        .unwrap();

        assert_eq!(outcome.attempts, 4);
        assert!(!outcome.recovered);
        assert_eq!(*seen.lock().unwrap(), vec![10, 50, 100]);
    }

    #[tokio::test]
    async fn test_progress_never_regresses() {
        let calls = AtomicU32::new(0);
        let seen = Mutex::new(Vec::new());
        poll_until_complete(
            scripted(vec![Ok(60), Ok(20), Ok(100)], &calls),
            |p, _| seen.lock().unwrap().push(p),
            &CancellationToken::new(),
            &fast(10),
        )
        .await
        .unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![60, 100]);
    }

    #[tokio::test]
    async fn test_cancelled_before_first_check() {
        let calls = AtomicU32::new(0);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = poll_until_complete(scripted(vec![Ok(0)], &calls), |_, _| {}, &cancel, &fast(10)).await;
        assert!(matches!(result, Err(ScanError::Cancelled)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cancel_mid_poll_stops_checks() {
        let calls = AtomicU32::new(0);
        let cancel = CancellationToken::new();
        let result = poll_until_complete(
            scripted(vec![Ok(5), Ok(10), Ok(15), Ok(20)], &calls),
            |_, attempt| {
                if attempt == 2 {
                    cancel.cancel();
                }
            },
            &cancel,
            &fast(0),
        )
        .await;
        assert!(matches!(result, Err(ScanError::Cancelled)));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_ceiling_yields_poll_timeout() {
        let calls = AtomicU32::new(0);
        let result = poll_until_complete(scripted(vec![Ok(1)], &calls), |_, _| {}, &CancellationToken::new(), &fast(3)).await;
        assert!(matches!(result, Err(ScanError::PollTimeout { attempts: 3 })));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_ceiling_does_not_sleep_after_last_read() {
        let calls = AtomicU32::new(0);
        let policy = PollPolicy::new(1, Duration::from_secs(3600));
        let result = tokio::time::timeout(
            Duration::from_secs(5),
            poll_until_complete(scripted(vec![Ok(1)], &calls), |_, _| {}, &CancellationToken::new(), &policy),
        )
        .await
        .expect("poll should give up without waiting an interval");
        assert!(matches!(result, Err(ScanError::PollTimeout { attempts: 1 })));
    }

    #[tokio::test]
    async fn test_not_found_is_done() {
        let calls = AtomicU32::new(0);
        let gone = TransportError::Status { status: 404, body: String::new() };
        let outcome = poll_until_complete(
            scripted(vec![Ok(30), Err(gone)], &calls),
            |_, _| {},
            &CancellationToken::new(),
            &fast(10),
        )
        .await
        .unwrap();
        assert!(outcome.recovered);
        assert_eq!(outcome.progress, 100);
    }

    #[tokio::test]
    async fn test_other_failures_propagate() {
        let calls = AtomicU32::new(0);
        let broken = TransportError::Status { status: 500, body: "boom".into() };
        let result = poll_until_complete(scripted(vec![Err(broken)], &calls), |_, _| {}, &CancellationToken::new(), &fast(10)).await;
        assert!(matches!(result, Err(ScanError::Transport(TransportError::Status { status: 500, .. }))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_lost_engine_is_unreachable() {
        let calls = AtomicU32::new(0);
        let down = TransportError::NoResponse("connection refused".into());
        let result = poll_until_complete(scripted(vec![Ok(20), Err(down)], &calls), |_, _| {}, &CancellationToken::new(), &fast(10)).await;
        assert!(matches!(result, Err(ScanError::EngineUnreachable(ref m)) if m.contains("connection refused")));
    }
}
