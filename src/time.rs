//! Sleep abstraction for testability.
//!
//! Retry delays are awaited through [`Sleeper`] so tests can skip real
//! waiting with [`InstantSleeper`] while production uses [`TokioSleeper`].

use std::time::Duration;

/// Abstraction over asynchronous waiting.
///
/// # Example
///
/// ```
/// use netlayer::time::{InstantSleeper, Sleeper};
/// use std::time::Duration;
///
/// # async fn example() {
/// InstantSleeper.sleep(Duration::from_secs(60)).await; // returns immediately
/// # }
/// ```
pub trait Sleeper: Send + Sync {
    /// Waits for `duration` without blocking the thread.
    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send;
}

/// Production sleeper backed by [`tokio::time::sleep`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Sleeper that returns immediately, for tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct InstantSleeper;

impl Sleeper for InstantSleeper {
    async fn sleep(&self, _duration: Duration) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Sleeper that records requested delays.
    #[derive(Default)]
    struct RecordingSleeper {
        delays: Mutex<Vec<Duration>>,
    }

    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, duration: Duration) {
            self.delays.lock().unwrap().push(duration);
        }
    }

    #[tokio::test]
    async fn instant_sleeper_does_not_wait() {
        let start = std::time::Instant::now();
        InstantSleeper.sleep(Duration::from_secs(3600)).await;
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn tokio_sleeper_advances_virtual_time() {
        let start = tokio::time::Instant::now();
        TokioSleeper.sleep(Duration::from_secs(30)).await;
        assert!(start.elapsed() >= Duration::from_secs(30));
    }

    #[tokio::test]
    async fn recording_sleeper_captures_durations() {
        let sleeper = RecordingSleeper::default();
        sleeper.sleep(Duration::from_millis(5)).await;
        sleeper.sleep(Duration::from_millis(10)).await;

        assert_eq!(
            *sleeper.delays.lock().unwrap(),
            vec![Duration::from_millis(5), Duration::from_millis(10)]
        );
    }

    #[test]
    fn sleepers_are_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TokioSleeper>();
        assert_send_sync::<InstantSleeper>();
    }
}
