//! Session statistics for the touch feed.
//!
//! Counters are atomic so a display or status thread can read them while the
//! tick loop updates them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Running counters for the current session.
#[derive(Debug)]
pub struct SessionStats {
    /// Ticks processed
    frames: AtomicU64,
    /// Ticks whose scan held no points
    empty_frames: AtomicU64,
    /// Raw touches detected
    touches: AtomicU64,
    /// Clusters detected
    clusters: AtomicU64,
    /// Messages handed to the transport
    messages: AtomicU64,
    /// Session start time
    session_start: DateTime<Utc>,
}

impl SessionStats {
    pub fn new() -> Self {
        Self {
            frames: AtomicU64::new(0),
            empty_frames: AtomicU64::new(0),
            touches: AtomicU64::new(0),
            clusters: AtomicU64::new(0),
            messages: AtomicU64::new(0),
            session_start: Utc::now(),
        }
    }

    /// Record one processed tick.
    pub fn record_frame(&self, scan_points: usize, touches: usize, clusters: usize) {
        self.frames.fetch_add(1, Ordering::Relaxed);
        if scan_points == 0 {
            self.empty_frames.fetch_add(1, Ordering::Relaxed);
        }
        self.touches.fetch_add(touches as u64, Ordering::Relaxed);
        self.clusters.fetch_add(clusters as u64, Ordering::Relaxed);
    }

    /// Record messages sent during a tick.
    pub fn record_messages(&self, count: usize) {
        self.messages.fetch_add(count as u64, Ordering::Relaxed);
    }

    /// Get the current statistics.
    pub fn snapshot(&self) -> StatsSnapshot {
        let elapsed_ms = (Utc::now() - self.session_start).num_milliseconds().max(0) as u64;
        let frames = self.frames.load(Ordering::Relaxed);
        let frame_rate = if elapsed_ms > 0 {
            frames as f64 * 1000.0 / elapsed_ms as f64
        } else {
            0.0
        };

        StatsSnapshot {
            frames,
            empty_frames: self.empty_frames.load(Ordering::Relaxed),
            touches: self.touches.load(Ordering::Relaxed),
            clusters: self.clusters.load(Ordering::Relaxed),
            messages: self.messages.load(Ordering::Relaxed),
            session_start: self.session_start,
            session_duration_secs: elapsed_ms / 1000,
            frame_rate: (frame_rate * 10.0).floor() / 10.0,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.snapshot();
        format!(
            "Session Statistics:\n\
             - Frames processed: {} ({} empty)\n\
             - Touches detected: {}\n\
             - Clusters detected: {}\n\
             - Messages sent: {}\n\
             - Average frame rate: {:.1} fps\n\
             - Session duration: {} seconds",
            stats.frames,
            stats.empty_frames,
            stats.touches,
            stats.clusters,
            stats.messages,
            stats.frame_rate,
            stats.session_duration_secs
        )
    }
}

impl Default for SessionStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of the session counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub frames: u64,
    pub empty_frames: u64,
    pub touches: u64,
    pub clusters: u64,
    pub messages: u64,
    pub session_start: DateTime<Utc>,
    pub session_duration_secs: u64,
    /// Frames per second, floored to one decimal
    pub frame_rate: f64,
}

/// Thread-safe shared statistics.
pub type SharedSessionStats = Arc<SessionStats>;

/// Create new shared statistics.
pub fn create_shared_stats() -> SharedSessionStats {
    Arc::new(SessionStats::new())
}
