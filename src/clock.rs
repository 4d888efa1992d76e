//! Pull-driven frame clock: the host feeds it monotonic timestamps and the
//! clock decides whether each tick is delivered. No timers are owned, so
//! stopping cannot leave a stray callback behind.

use std::collections::VecDeque;

/// Delivered-cadence samples kept for the rolling FPS estimate.
const FPS_WINDOW: usize = 30;
/// Slack when comparing against the target frame interval, so a tick
/// arriving a hair early (scheduler jitter) still counts as on-time.
const THROTTLE_EPSILON: f64 = 1e-4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RunState {
    Stopped,
    Running,
    Paused,
}

/// One delivered tick: the current animation time and the (speed-scaled)
/// time advanced since the previous delivered tick. `delta` is 0 right
/// after start/resume and while frozen.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tick {
    pub time: f64,
    pub delta: f64,
}

/// Host-visible snapshot of the clock.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct AnimationState {
    pub time: f64,
    pub is_running: bool,
    pub is_frozen: bool,
    pub current_fps: f64,
}

#[derive(Debug)]
pub struct AnimationClock {
    state: RunState,
    /// Orthogonal to the run state: ticks are still delivered (so live
    /// parameter edits repaint) but `time` does not advance.
    frozen: bool,
    time: f64,
    speed: f64,
    target_fps: Option<f64>,
    last_delivered: Option<f64>,
    cadence: VecDeque<f64>,
}

impl Default for AnimationClock {
    fn default() -> Self {
        Self::new()
    }
}

impl AnimationClock {
    pub fn new() -> Self {
        Self {
            state: RunState::Stopped,
            frozen: false,
            time: 0.0,
            speed: 1.0,
            target_fps: None,
            last_delivered: None,
            cadence: VecDeque::with_capacity(FPS_WINDOW),
        }
    }

    /// Transitions to Running from Stopped or Paused; idempotent while
    /// already Running.
    pub fn start(&mut self) {
        if self.state != RunState::Running {
            self.state = RunState::Running;
            self.last_delivered = None;
        }
    }

    /// Transitions to Stopped and resets elapsed-time bookkeeping. The
    /// visible `time` is owned by the caller via [`reset`](Self::reset) and
    /// is left untouched.
    pub fn stop(&mut self) {
        self.state = RunState::Stopped;
        self.last_delivered = None;
        self.cadence.clear();
    }

    /// Suspends tick delivery without losing elapsed time.
    pub fn pause(&mut self) {
        if self.state == RunState::Running {
            self.state = RunState::Paused;
        }
    }

    pub fn resume(&mut self) {
        if self.state == RunState::Paused {
            self.state = RunState::Running;
            self.last_delivered = None;
        }
    }

    /// Sets visible time back to 0 without changing the run state.
    pub fn reset(&mut self) {
        self.time = 0.0;
    }

    pub fn set_frozen(&mut self, frozen: bool) {
        self.frozen = frozen;
    }

    /// Speed multiplier applied to every delivered delta. Non-finite or
    /// negative values are ignored.
    pub fn set_speed(&mut self, speed: f64) {
        if speed.is_finite() && speed >= 0.0 {
            self.speed = speed;
        }
    }

    /// `None` disables throttling. Zero/negative/non-finite targets are
    /// treated as `None`.
    pub fn set_target_fps(&mut self, target: Option<f64>) {
        self.target_fps = target.filter(|t| t.is_finite() && *t > 0.0);
    }

    pub fn is_running(&self) -> bool {
        self.state == RunState::Running
    }

    pub fn is_paused(&self) -> bool {
        self.state == RunState::Paused
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    /// Rolling FPS measured from actual delivered-tick cadence, not from
    /// the requested target.
    pub fn current_fps(&self) -> f64 {
        if self.cadence.is_empty() {
            return 0.0;
        }
        let mean: f64 = self.cadence.iter().sum::<f64>() / self.cadence.len() as f64;
        if mean > 0.0 { 1.0 / mean } else { 0.0 }
    }

    pub fn snapshot(&self) -> AnimationState {
        AnimationState {
            time: self.time,
            is_running: self.is_running(),
            is_frozen: self.frozen,
            current_fps: self.current_fps(),
        }
    }

    /// Feeds one host timestamp (seconds, monotonic). Returns the tick to
    /// render, or `None` when the clock is not running or the tick arrived
    /// before `1/target_fps` seconds have elapsed since the last delivery.
    pub fn tick(&mut self, now: f64) -> Option<Tick> {
        if self.state != RunState::Running || !now.is_finite() {
            return None;
        }

        let since_last = self.last_delivered.map(|last| (now - last).max(0.0));

        if let (Some(target), Some(elapsed)) = (self.target_fps, since_last)
            && elapsed + THROTTLE_EPSILON < 1.0 / target
        {
            return None;
        }

        let raw = since_last.unwrap_or(0.0);
        let delta = if self.frozen { 0.0 } else { raw * self.speed };
        self.time += delta;

        if let Some(elapsed) = since_last
            && elapsed > 0.0
        {
            if self.cadence.len() == FPS_WINDOW {
                self.cadence.pop_front();
            }
            self.cadence.push_back(elapsed);
        }
        self.last_delivered = Some(now);

        Some(Tick {
            time: self.time,
            delta,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drive(clock: &mut AnimationClock, start: f64, step: f64, count: usize) -> Vec<Tick> {
        (0..count)
            .filter_map(|i| clock.tick(start + i as f64 * step))
            .collect()
    }

    #[test]
    fn stopped_clock_never_delivers() {
        let mut clock = AnimationClock::new();
        assert!(clock.tick(0.0).is_none());
        clock.start();
        assert!(clock.tick(0.0).is_some());
        clock.stop();
        for i in 0..10 {
            assert!(clock.tick(1.0 + i as f64).is_none());
        }
    }

    #[test]
    fn time_advances_with_speed_multiplier() {
        let mut clock = AnimationClock::new();
        clock.set_speed(2.0);
        clock.start();
        clock.tick(0.0);
        let tick = clock.tick(0.5).unwrap();
        assert!((tick.time - 1.0).abs() < 1e-12);
        assert!((tick.delta - 1.0).abs() < 1e-12);
    }

    #[test]
    fn reset_zeroes_time_without_changing_run_state() {
        let mut clock = AnimationClock::new();
        clock.start();
        drive(&mut clock, 0.0, 0.1, 5);
        assert!(clock.time() > 0.0);
        clock.reset();
        assert_eq!(clock.time(), 0.0);
        assert!(clock.is_running());

        clock.stop();
        clock.reset();
        assert!(!clock.is_running());
    }

    #[test]
    fn stop_preserves_visible_time() {
        let mut clock = AnimationClock::new();
        clock.start();
        drive(&mut clock, 0.0, 0.1, 5);
        let t = clock.time();
        clock.stop();
        assert_eq!(clock.time(), t);
    }

    #[test]
    fn pause_resume_does_not_jump_time() {
        let mut clock = AnimationClock::new();
        clock.start();
        clock.tick(0.0);
        clock.tick(0.1);
        let before = clock.time();
        clock.pause();
        assert!(clock.tick(5.0).is_none());
        clock.resume();
        // First tick after resume carries delta 0: the 5 s gap is not
        // injected into animation time.
        let tick = clock.tick(10.0).unwrap();
        assert_eq!(tick.delta, 0.0);
        assert!((tick.time - before).abs() < 1e-12);
    }

    #[test]
    fn frozen_delivers_ticks_but_time_holds() {
        let mut clock = AnimationClock::new();
        clock.start();
        clock.tick(0.0);
        clock.tick(0.1);
        let before = clock.time();
        clock.set_frozen(true);
        let tick = clock.tick(0.2).unwrap();
        assert_eq!(tick.delta, 0.0);
        assert_eq!(tick.time, before);
        clock.set_frozen(false);
        let tick = clock.tick(0.3).unwrap();
        assert!(tick.delta > 0.0);
    }

    #[test]
    fn throttle_caps_delivery_rate() {
        let mut clock = AnimationClock::new();
        clock.set_target_fps(Some(30.0));
        clock.start();
        // 1 second of 120 Hz ticks: at most ~30 deliveries (+1 for the
        // initial tick).
        let delivered = drive(&mut clock, 0.0, 1.0 / 120.0, 121);
        assert!(delivered.len() <= 31, "delivered {}", delivered.len());
        assert!(delivered.len() >= 29);
    }

    #[test]
    fn throttle_never_exceeds_target_interval() {
        let mut clock = AnimationClock::new();
        clock.set_target_fps(Some(60.0));
        clock.start();
        let mut last: Option<f64> = None;
        for i in 0..500 {
            let now = i as f64 / 240.0;
            if clock.tick(now).is_some() {
                if let Some(prev) = last {
                    assert!(now - prev + THROTTLE_EPSILON >= 1.0 / 60.0);
                }
                last = Some(now);
            }
        }
    }

    #[test]
    fn fps_is_measured_from_delivered_cadence() {
        let mut clock = AnimationClock::new();
        clock.set_target_fps(Some(30.0));
        clock.start();
        drive(&mut clock, 0.0, 1.0 / 60.0, 121);
        let fps = clock.current_fps();
        // Delivered every other 60 Hz tick => ~30 fps measured.
        assert!((fps - 30.0).abs() < 2.0, "fps {fps}");
    }

    #[test]
    fn start_is_idempotent_while_running() {
        let mut clock = AnimationClock::new();
        clock.start();
        clock.tick(0.0);
        clock.tick(1.0);
        let t = clock.time();
        clock.start();
        // Re-entrant start is a no-op: the delta baseline survives.
        let tick = clock.tick(2.0).unwrap();
        assert!((tick.time - (t + 1.0)).abs() < 1e-12);
    }

    #[test]
    fn snapshot_reflects_state() {
        let mut clock = AnimationClock::new();
        clock.start();
        clock.set_frozen(true);
        let s = clock.snapshot();
        assert!(s.is_running);
        assert!(s.is_frozen);
        assert_eq!(s.time, 0.0);
    }
}
