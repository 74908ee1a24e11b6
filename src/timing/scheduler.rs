//! The playback cursor.
//!
//! The scheduler walks the grid one column per tick. Ticks fire from a
//! wall-clock timer and each trigger is stamped with the synth's clock
//! reading at tick time, so note onsets inherit the host timer's jitter.
//! There is no look-ahead against the audio clock.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::tempo::{tick_interval, validate_bpm};
use crate::audio::{DEFAULT_DURATION, Synth};
use crate::error::{Error, Result};
use crate::grid::Grid;
use crate::pitch::PitchTable;

/// What a tempo change does to the playback position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TempoPolicy {
    /// Stop and start again: the pattern restarts from the first column.
    #[default]
    Restart,
    /// Re-arm the timer at the new interval and keep the current column.
    PreservePosition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Stopped,
    Playing,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackState {
    pub is_playing: bool,
    pub current_column: usize,
    pub bpm: f64,
}

/// The single recurring timer. Deadlines advance by whole intervals so the
/// cadence does not drift with loop latency.
#[derive(Debug, Clone, Copy)]
struct Timer {
    interval: Duration,
    next: Instant,
}

impl Timer {
    /// `None` when the first deadline is past what an [`Instant`] can hold.
    fn arm(interval: Duration, now: Instant) -> Option<Self> {
        Some(Self {
            interval,
            next: now.checked_add(interval)?,
        })
    }

    fn is_due(&self, now: Instant) -> bool {
        now >= self.next
    }

    fn advance(&mut self, now: Instant) -> Option<()> {
        let next = self.next.checked_add(self.interval)?;
        // Missed deadlines are skipped, not replayed in a burst.
        self.next = if next <= now {
            now.checked_add(self.interval)?
        } else {
            next
        };
        Some(())
    }
}

#[derive(Debug)]
pub struct PlaybackScheduler {
    transport: Transport,
    current_column: usize,
    bpm: f64,
    note_duration: f64,
    policy: TempoPolicy,
    timer: Option<Timer>,
}

impl PlaybackScheduler {
    pub fn new(bpm: f64) -> Result<Self> {
        Ok(Self {
            transport: Transport::Stopped,
            current_column: 0,
            bpm: validate_bpm(bpm)?,
            note_duration: DEFAULT_DURATION,
            policy: TempoPolicy::default(),
            timer: None,
        })
    }

    pub fn with_policy(mut self, policy: TempoPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_note_duration(mut self, secs: f64) -> Self {
        self.note_duration = secs;
        self
    }

    pub fn transport(&self) -> Transport {
        self.transport
    }

    pub fn is_playing(&self) -> bool {
        self.transport == Transport::Playing
    }

    pub fn current_column(&self) -> usize {
        self.current_column
    }

    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    pub fn policy(&self) -> TempoPolicy {
        self.policy
    }

    pub fn note_duration(&self) -> f64 {
        self.note_duration
    }

    pub fn tick_interval(&self) -> Duration {
        tick_interval(self.bpm)
    }

    pub fn state(&self) -> PlaybackState {
        PlaybackState {
            is_playing: self.is_playing(),
            current_column: self.current_column,
            bpm: self.bpm,
        }
    }

    /// Play/pause toggle: stops when playing, otherwise starts from the
    /// current column.
    pub fn start(&mut self) {
        self.start_at(Instant::now());
    }

    pub fn start_at(&mut self, now: Instant) {
        if self.is_playing() {
            self.stop();
            return;
        }
        let interval = self.tick_interval();
        let Some(timer) = Timer::arm(interval, now) else {
            warn!(bpm = self.bpm, "tick interval out of range, playback not started");
            return;
        };
        self.transport = Transport::Playing;
        self.timer = Some(timer);
        info!(
            bpm = self.bpm,
            interval_ms = interval.as_secs_f64() * 1000.0,
            column = self.current_column,
            "playback started"
        );
    }

    /// Cancels the timer and rewinds. Safe to call repeatedly.
    pub fn stop(&mut self) {
        if self.timer.take().is_some() {
            info!("playback stopped");
        }
        self.transport = Transport::Stopped;
        self.current_column = 0;
    }

    pub fn set_tempo(&mut self, bpm: f64) -> Result<()> {
        self.set_tempo_at(bpm, Instant::now())
    }

    /// Always leaves playback running at the new tempo. Under
    /// [`TempoPolicy::Restart`] the cursor returns to column 0.
    pub fn set_tempo_at(&mut self, bpm: f64, now: Instant) -> Result<()> {
        let bpm = validate_bpm(bpm)?;
        let timer = Timer::arm(tick_interval(bpm), now).ok_or(Error::InvalidTempo(bpm))?;

        let column = self.current_column;
        self.stop();
        if self.policy == TempoPolicy::PreservePosition {
            self.current_column = column;
        }
        self.bpm = bpm;
        self.transport = Transport::Playing;
        self.timer = Some(timer);
        debug!(bpm, policy = ?self.policy, "tempo changed");
        Ok(())
    }

    /// When the next tick is due, if playing.
    pub fn deadline(&self) -> Option<Instant> {
        self.timer.map(|t| t.next)
    }

    /// Fires a tick if the timer is due at `now`. Returns the column played.
    pub fn poll<S: Synth + ?Sized>(
        &mut self,
        now: Instant,
        grid: &Grid,
        pitches: &PitchTable,
        synth: &mut S,
    ) -> Option<usize> {
        let timer = self.timer.as_mut()?;
        if !timer.is_due(now) {
            return None;
        }
        if timer.advance(now).is_none() {
            warn!(bpm = self.bpm, "next tick out of range, stopping");
            self.stop();
            return None;
        }
        self.tick(grid, pitches, synth)
    }

    /// Plays the current column and moves the cursor on. The wrap point is
    /// the grid's column count at this moment, so a resize takes effect from
    /// the next tick. Returns the column played, or `None` when stopped.
    pub fn tick<S: Synth + ?Sized>(
        &mut self,
        grid: &Grid,
        pitches: &PitchTable,
        synth: &mut S,
    ) -> Option<usize> {
        if !self.is_playing() {
            return None;
        }

        let column = self.current_column;
        let t0 = synth.now();
        for (row, instrument) in grid.active_in_column(column) {
            if let Some(frequency) = pitches.frequency(row) {
                synth.trigger(frequency, instrument, t0, self.note_duration);
            }
        }

        self.current_column = (column + 1).checked_rem(grid.columns()).unwrap_or(0);
        Some(column)
    }
}
