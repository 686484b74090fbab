//! # Telemetry Blackboard
//!
//! Thread-safe progress tracking for an enrichment run.
//! Uses atomic counters that can be cheaply updated from the pipeline while a
//! background heartbeat thread periodically reports progress.

use std::io::{self, IsTerminal, Write};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::info;

use crate::error::{EnrichError, Result};

/// Processing stage for high-level progress tracking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Stage {
    Initializing = 0,
    LoadingData = 1,
    ResolvingOverlaps = 2,
    BinningGenesets = 3,
    Permuting = 4,
    WritingOutput = 5,
    Complete = 6,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Initializing => "Initializing",
            Stage::LoadingData => "Loading Data",
            Stage::ResolvingOverlaps => "Resolving Overlaps",
            Stage::BinningGenesets => "Binning Genesets",
            Stage::Permuting => "Permuting",
            Stage::WritingOutput => "Writing Output",
            Stage::Complete => "Complete",
        }
    }

    fn from_u64(val: u64) -> Self {
        match val {
            0 => Stage::Initializing,
            1 => Stage::LoadingData,
            2 => Stage::ResolvingOverlaps,
            3 => Stage::BinningGenesets,
            4 => Stage::Permuting,
            5 => Stage::WritingOutput,
            _ => Stage::Complete,
        }
    }
}

/// Shared run progress.
///
/// All counters use relaxed ordering; the heartbeat only needs approximate values.
pub struct TelemetryBlackboard {
    stage: AtomicU64,
    columns_done: AtomicU64,
    total_columns: AtomicU64,
    trials_done: AtomicU64,
    start_time: Instant,
    last_progress_nanos: AtomicU64,
    shutdown: AtomicBool,
}

impl TelemetryBlackboard {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    #[inline]
    pub fn set_stage(&self, stage: Stage) {
        self.stage.store(stage as u64, Ordering::Relaxed);
        self.touch_progress();
    }

    #[inline]
    pub fn stage(&self) -> Stage {
        Stage::from_u64(self.stage.load(Ordering::Relaxed))
    }

    pub fn set_total_columns(&self, n: u64) {
        self.total_columns.store(n, Ordering::Relaxed);
        self.columns_done.store(0, Ordering::Relaxed);
    }

    /// Record a finished condition and the null sets it scored.
    #[inline]
    pub fn column_done(&self, trials: u64) {
        self.columns_done.fetch_add(1, Ordering::Relaxed);
        self.trials_done.fetch_add(trials, Ordering::Relaxed);
        self.touch_progress();
    }

    pub fn columns_done(&self) -> u64 {
        self.columns_done.load(Ordering::Relaxed)
    }

    pub fn trials_done(&self) -> u64 {
        self.trials_done.load(Ordering::Relaxed)
    }

    #[inline]
    fn touch_progress(&self) {
        let elapsed = self.start_time.elapsed().as_nanos() as u64;
        self.last_progress_nanos.store(elapsed, Ordering::Relaxed);
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.start_time.elapsed().as_secs_f64()
    }

    fn snapshot(&self) -> TelemetrySnapshot {
        TelemetrySnapshot {
            stage: self.stage(),
            columns_done: self.columns_done(),
            total_columns: self.total_columns.load(Ordering::Relaxed),
            trials_done: self.trials_done(),
            elapsed_secs: self.elapsed_secs(),
            last_progress_nanos: self.last_progress_nanos.load(Ordering::Relaxed),
            current_nanos: self.start_time.elapsed().as_nanos() as u64,
        }
    }

    fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    fn signal_shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }
}

impl Default for TelemetryBlackboard {
    fn default() -> Self {
        Self {
            stage: AtomicU64::new(Stage::Initializing as u64),
            columns_done: AtomicU64::new(0),
            total_columns: AtomicU64::new(0),
            trials_done: AtomicU64::new(0),
            start_time: Instant::now(),
            last_progress_nanos: AtomicU64::new(0),
            shutdown: AtomicBool::new(false),
        }
    }
}

struct TelemetrySnapshot {
    stage: Stage,
    columns_done: u64,
    total_columns: u64,
    trials_done: u64,
    elapsed_secs: f64,
    last_progress_nanos: u64,
    current_nanos: u64,
}

/// Heartbeat output configuration
pub struct HeartbeatConfig {
    /// Interval between heartbeats (seconds)
    pub interval_secs: u64,
    /// Stall warning threshold (seconds with no progress)
    pub stall_threshold_secs: u64,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            interval_secs: 30,
            stall_threshold_secs: 300,
        }
    }
}

/// Handle to the heartbeat thread
pub struct HeartbeatHandle {
    handle: Option<JoinHandle<()>>,
    blackboard: Arc<TelemetryBlackboard>,
}

impl HeartbeatHandle {
    pub fn spawn(blackboard: Arc<TelemetryBlackboard>, config: HeartbeatConfig) -> Result<Self> {
        let bb = blackboard.clone();
        let is_tty = io::stderr().is_terminal();

        let handle = thread::Builder::new()
            .name("heartbeat".to_string())
            .spawn(move || heartbeat_loop(bb, config, is_tty))
            .map_err(|e| EnrichError::config(format!("Failed to spawn heartbeat thread: {}", e)))?;

        Ok(Self {
            handle: Some(handle),
            blackboard,
        })
    }

    /// Signal shutdown and wait for the thread to finish
    pub fn shutdown(mut self) {
        self.blackboard.signal_shutdown();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for HeartbeatHandle {
    fn drop(&mut self) {
        self.blackboard.signal_shutdown();
    }
}

fn format_duration(secs: f64) -> String {
    if secs < 60.0 {
        format!("{:.0}s", secs)
    } else if secs < 3600.0 {
        let mins = (secs / 60.0).floor();
        let remaining_secs = secs % 60.0;
        format!("{:.0}m{:.0}s", mins, remaining_secs)
    } else {
        format!("{:.1}h", secs / 3600.0)
    }
}

fn heartbeat_loop(bb: Arc<TelemetryBlackboard>, config: HeartbeatConfig, is_tty: bool) {
    let tick = Duration::from_millis(200);
    let interval = Duration::from_secs(config.interval_secs);
    let mut last_report = Instant::now();

    loop {
        thread::sleep(tick);
        if bb.is_shutdown() {
            break;
        }
        if last_report.elapsed() < interval {
            continue;
        }
        last_report = Instant::now();

        let snap = bb.snapshot();
        let stall_secs = snap.current_nanos.saturating_sub(snap.last_progress_nanos) / 1_000_000_000;
        let is_stalled = stall_secs > config.stall_threshold_secs;

        let eta = if snap.columns_done > 0 && snap.total_columns > snap.columns_done {
            let per_col = snap.elapsed_secs / snap.columns_done as f64;
            format_duration(per_col * (snap.total_columns - snap.columns_done) as f64)
        } else {
            "unknown".to_string()
        };

        if is_tty {
            let pct = if snap.total_columns > 0 {
                snap.columns_done as f64 / snap.total_columns as f64 * 100.0
            } else {
                0.0
            };
            eprint!(
                "\r{:>5.1}% | {} | conditions {}/{} | {} | ETA: {}{}    \x1b[K",
                pct,
                snap.stage.as_str(),
                snap.columns_done,
                snap.total_columns,
                format_duration(snap.elapsed_secs),
                eta,
                if is_stalled { " [STALLED]" } else { "" }
            );
            let _ = io::stderr().flush();
        } else {
            info!(
                stage = snap.stage.as_str(),
                columns = snap.columns_done,
                total_columns = snap.total_columns,
                trials = snap.trials_done,
                eta = eta.as_str(),
                stalled = is_stalled,
                "heartbeat"
            );
        }
    }

    if is_tty {
        eprint!("\r\x1b[K");
        let _ = io::stderr().flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_roundtrip() {
        for stage in [
            Stage::Initializing,
            Stage::LoadingData,
            Stage::ResolvingOverlaps,
            Stage::BinningGenesets,
            Stage::Permuting,
            Stage::WritingOutput,
            Stage::Complete,
        ] {
            assert_eq!(Stage::from_u64(stage as u64), stage);
        }
    }

    #[test]
    fn test_column_counters() {
        let bb = TelemetryBlackboard::new();
        bb.set_stage(Stage::Permuting);
        bb.set_total_columns(3);
        bb.column_done(1000);
        bb.column_done(0);
        assert_eq!(bb.stage(), Stage::Permuting);
        assert_eq!(bb.columns_done(), 2);
        assert_eq!(bb.trials_done(), 1000);
    }

    #[test]
    fn test_heartbeat_shuts_down() {
        let bb = TelemetryBlackboard::new();
        let hb = HeartbeatHandle::spawn(bb.clone(), HeartbeatConfig::default()).unwrap();
        hb.shutdown();
        assert!(bb.is_shutdown());
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(30.0), "30s");
        assert_eq!(format_duration(90.0), "1m30s");
        assert_eq!(format_duration(3661.0), "1.0h");
    }
}
