//! Repeating scans on a fixed interval.

use std::future::Future;
use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};
use tracing::info;
use whoshome_core::{Error, Result};

/// Intervals accepted by `--schedule`.
pub const SCHEDULES: [(&str, u64); 6] = [
    ("1m", 60),
    ("5m", 5 * 60),
    ("15m", 15 * 60),
    ("30m", 30 * 60),
    ("45m", 45 * 60),
    ("1h", 60 * 60),
];

pub fn parse_schedule(value: &str) -> Result<Duration> {
    SCHEDULES
        .iter()
        .find(|(name, _)| *name == value.trim())
        .map(|(_, secs)| Duration::from_secs(*secs))
        .ok_or_else(|| {
            let names: Vec<&str> = SCHEDULES.iter().map(|(name, _)| *name).collect();
            Error::InvalidConfig(format!(
                "unknown schedule '{}', expected one of {}",
                value,
                names.join(", ")
            ))
        })
}

/// Run `scan` now and then once per `period`, until it fails.
///
/// A scan that overruns the period delays the next one instead of
/// stacking runs.
pub async fn run_every<F, Fut>(period: Duration, mut scan: F) -> anyhow::Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<()>>,
{
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        info!("scheduled scan starting");
        scan().await?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_parse_schedule() {
        assert_eq!(parse_schedule("1m").unwrap(), Duration::from_secs(60));
        assert_eq!(parse_schedule("45m").unwrap(), Duration::from_secs(2700));
        assert_eq!(parse_schedule(" 1h ").unwrap(), Duration::from_secs(3600));
    }

    #[test]
    fn test_parse_schedule_rejects_unknown() {
        for value in ["2m", "", "60", "1d"] {
            assert!(matches!(parse_schedule(value), Err(Error::InvalidConfig(_))));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_every_stops_on_error() {
        let runs = AtomicUsize::new(0);
        let result = run_every(Duration::from_secs(60), || {
            let n = runs.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if n == 3 {
                    anyhow::bail!("scan failed");
                }
                Ok(())
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(runs.load(Ordering::SeqCst), 3);
    }
}
