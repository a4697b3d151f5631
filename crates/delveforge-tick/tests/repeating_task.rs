//! Integration tests for the repeating task.
//!
//! Uses `start_paused = true` so Tokio auto-advances time and every
//! `sleep_until` resolves exactly on its deadline.

use std::time::Duration;

use delveforge_tick::{MissedTickPolicy, RepeatingTask, TaskConfig};
use tokio::time::Instant;

fn every_5s() -> TaskConfig {
    TaskConfig::every(Duration::from_secs(5))
}

// =========================================================================
// TaskConfig
// =========================================================================

#[test]
fn test_default_config_is_disabled() {
    let cfg = TaskConfig::default();
    assert_eq!(cfg.interval, None);
    assert_eq!(cfg.policy, MissedTickPolicy::Skip);
}

#[test]
fn test_every_ms_zero_is_disabled() {
    assert_eq!(TaskConfig::every_ms(0).interval, None);
    assert_eq!(
        TaskConfig::every_ms(5000).interval,
        Some(Duration::from_secs(5))
    );
}

#[test]
fn test_validated_clamps_tiny_interval() {
    let cfg = TaskConfig::every(Duration::from_millis(1)).validated();
    assert_eq!(cfg.interval, Some(TaskConfig::MIN_INTERVAL));
}

#[test]
fn test_validated_zero_interval_disables() {
    let cfg = TaskConfig::every(Duration::ZERO).validated();
    assert_eq!(cfg.interval, None);
}

// =========================================================================
// Creation and accessors
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_initial_state() {
    let task = RepeatingTask::new("sweep", every_5s());
    assert_eq!(task.name(), "sweep");
    assert_eq!(task.tick_count(), 0);
    assert_eq!(task.interval(), Some(Duration::from_secs(5)));
    assert!(!task.is_disabled());
    assert!(!task.is_paused());
    assert_eq!(task.metrics().total_runs, 0);
}

// =========================================================================
// Firing and cadence
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_first_tick_fires_after_one_interval() {
    let start = Instant::now();
    let mut task = RepeatingTask::new("sweep", every_5s());

    let info = task.wait_for_tick().await;

    assert_eq!(info.tick, 1);
    assert_eq!(info.missed, 0);
    assert_eq!(start.elapsed(), Duration::from_secs(5));
}

#[tokio::test(start_paused = true)]
async fn test_cadence_is_stable_across_ticks() {
    let start = Instant::now();
    let mut task = RepeatingTask::new("sweep", every_5s());

    for expected in 1..=4 {
        let info = task.wait_for_tick().await;
        assert_eq!(info.tick, expected);
        task.record_run_end();
    }

    assert_eq!(start.elapsed(), Duration::from_secs(20));
    assert_eq!(task.metrics().total_runs, 4);
}

#[tokio::test(start_paused = true)]
async fn test_disabled_task_never_fires() {
    let mut task = RepeatingTask::new("sweep", TaskConfig::default());
    assert!(task.is_disabled());

    let result = tokio::time::timeout(Duration::from_secs(60), task.wait_for_tick()).await;
    assert!(result.is_err(), "disabled task should pend forever");
}

#[tokio::test(start_paused = true)]
async fn test_skip_policy_reschedules_from_wakeup() {
    let mut task = RepeatingTask::new("sweep", every_5s());
    task.wait_for_tick().await;

    // Block the task for 12s past its next due time.
    tokio::time::advance(Duration::from_secs(17)).await;
    let info = task.wait_for_tick().await;
    assert_eq!(info.missed, 2);
    assert_eq!(task.metrics().total_missed, 2);

    // Next run is a full interval after the late wakeup.
    let before = Instant::now();
    task.wait_for_tick().await;
    assert_eq!(before.elapsed(), Duration::from_secs(5));
}

#[tokio::test(start_paused = true)]
async fn test_fixed_policy_keeps_original_cadence() {
    let start = Instant::now();
    let mut task = RepeatingTask::new(
        "sweep",
        TaskConfig {
            policy: MissedTickPolicy::Fixed,
            ..every_5s()
        },
    );
    task.wait_for_tick().await;

    tokio::time::advance(Duration::from_secs(7)).await;
    task.wait_for_tick().await;

    // Due at 15s on the original grid, already 12s elapsed.
    task.wait_for_tick().await;
    assert_eq!(start.elapsed(), Duration::from_secs(15));
}

// =========================================================================
// Pause / Resume
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_pause_prevents_ticks() {
    let mut task = RepeatingTask::new("sweep", every_5s());
    task.wait_for_tick().await;

    task.pause();
    assert!(task.is_paused());

    let result = tokio::time::timeout(Duration::from_secs(30), task.wait_for_tick()).await;
    assert!(result.is_err(), "paused task should pend");
    assert_eq!(task.tick_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_resume_waits_full_interval() {
    let mut task = RepeatingTask::new("sweep", every_5s());
    task.pause();
    tokio::time::advance(Duration::from_secs(60)).await;
    task.resume();

    let before = Instant::now();
    let info = task.wait_for_tick().await;

    assert_eq!(info.tick, 1);
    assert_eq!(info.missed, 0);
    assert_eq!(before.elapsed(), Duration::from_secs(5));
}

#[tokio::test]
async fn test_pause_resume_idempotent() {
    let mut task = RepeatingTask::new("sweep", every_5s());
    task.pause();
    task.pause();
    assert!(task.is_paused());
    task.resume();
    task.resume();
    assert!(!task.is_paused());
}

// =========================================================================
// Metrics
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_record_run_end_without_wait_is_noop() {
    let mut task = RepeatingTask::new("sweep", every_5s());
    task.record_run_end();
    assert_eq!(task.metrics().max_run_time, Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_record_run_end_tracks_run_time() {
    let mut task = RepeatingTask::new("sweep", every_5s());
    task.wait_for_tick().await;
    // Run time is measured on the std clock, which test-util does not pause.
    std::thread::sleep(Duration::from_micros(50));
    task.record_run_end();

    assert!(task.metrics().max_run_time > Duration::ZERO);
    assert_eq!(task.metrics().last_run_time, task.metrics().max_run_time);
}

// =========================================================================
// select! loop pattern (mirrors the instance service)
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_select_loop_runs_once_per_interval() {
    let mut task = RepeatingTask::new("sweep", every_5s());
    let (tx, mut rx) = tokio::sync::mpsc::channel::<&str>(4);

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(16_000)).await;
        tx.send("stop").await.ok();
    });

    let mut runs = 0u64;
    loop {
        tokio::select! {
            Some(cmd) = rx.recv() => {
                assert_eq!(cmd, "stop");
                break;
            }
            info = task.wait_for_tick() => {
                runs += 1;
                assert_eq!(info.tick, runs);
                task.record_run_end();
            }
        }
    }

    assert_eq!(runs, 3);
}
