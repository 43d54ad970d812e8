//! Daily trigger loop.
//!
//! Fires the photo job once per day at a configured UTC wall-clock time.
//! A failed run is logged and the loop keeps going; retry policy beyond
//! "try again tomorrow" is deliberately absent.

use chrono::{DateTime, Duration as ChronoDuration, NaiveTime, Utc};

use crate::job::PhotoJob;

/// Parses an `HH:MM` posting time.
pub fn parse_post_time(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M").ok()
}

/// Computes the next firing instant at `post_time` UTC, strictly after
/// `now`. Rolls over to tomorrow when today's slot has passed.
pub fn next_fire_time(now: DateTime<Utc>, post_time: NaiveTime) -> DateTime<Utc> {
    let today = now.date_naive().and_time(post_time).and_utc();
    if today > now {
        today
    } else {
        today + ChronoDuration::days(1)
    }
}

/// Runs the job daily at the given UTC time, forever.
pub async fn run_daily(job: PhotoJob, post_time: NaiveTime) {
    loop {
        let now = Utc::now();
        let fire_at = next_fire_time(now, post_time);
        let wait = (fire_at - now)
            .to_std()
            .unwrap_or(std::time::Duration::ZERO);

        tracing::info!(fire_at = %fire_at, "Sleeping until next scheduled post");
        tokio::time::sleep(wait).await;

        if let Err(err) = job.execute().await {
            tracing::error!(error = %err, "Scheduled photo job failed");
        }
    }
}
