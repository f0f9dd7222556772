use core::time::Duration;

use bevy::prelude::*;

use crate::puzzle::PuzzleOutcome;

/// Marks the text node showing the remaining time.
#[derive(Component)]
pub struct TimerText;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CountdownTick {
    /// Not running; nothing happened.
    Stopped,
    /// Running, but no whole second elapsed this tick.
    Running,
    /// One or more seconds elapsed; carries the new remaining value.
    Ticked(u32),
    /// Reached zero on this tick. Reported once; the countdown is stopped.
    Expired,
}

/// Whole-second countdown. Ticking is driven by frame deltas; a repeating
/// one-second timer decides when a second has passed.
#[derive(Resource, Debug)]
pub struct Countdown {
    initial_secs: u32,
    remaining_secs: u32,
    second: Timer,
    running: bool,
}

impl Countdown {
    pub fn new(initial_secs: u32) -> Self {
        Self {
            initial_secs,
            remaining_secs: initial_secs,
            second: Timer::new(Duration::from_secs(1), TimerMode::Repeating),
            running: false,
        }
    }

    pub fn start(&mut self) {
        if self.remaining_secs == 0 {
            return;
        }
        self.second.reset();
        self.running = true;
    }

    /// Safe to call when already stopped.
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Stops and restores the starting value.
    pub fn reset(&mut self) {
        self.stop();
        self.remaining_secs = self.initial_secs;
        self.second.reset();
    }

    pub fn tick(&mut self, delta: Duration) -> CountdownTick {
        if !self.running {
            return CountdownTick::Stopped;
        }
        self.second.tick(delta);
        let seconds = self.second.times_finished_this_tick();
        if seconds == 0 {
            return CountdownTick::Running;
        }

        self.remaining_secs = self.remaining_secs.saturating_sub(seconds);
        if self.remaining_secs == 0 {
            self.stop();
            CountdownTick::Expired
        } else {
            CountdownTick::Ticked(self.remaining_secs)
        }
    }

    pub const fn is_running(&self) -> bool {
        self.running
    }

    pub const fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    pub const fn elapsed_secs(&self) -> u32 {
        self.initial_secs - self.remaining_secs
    }

    pub fn display(&self) -> String {
        format_remaining(self.remaining_secs)
    }
}

pub fn format_remaining(seconds: u32) -> String {
    format!("Time Remaining: {}:{:02}", seconds / 60, seconds % 60)
}

pub fn tick_countdown(
    time: Res<Time>,
    mut countdown: ResMut<Countdown>,
    mut outcomes: EventWriter<PuzzleOutcome>,
) {
    if countdown.tick(time.delta()) == CountdownTick::Expired {
        info!("Countdown expired");
        outcomes.send(PuzzleOutcome::TimedOut);
    }
}

pub fn update_timer_text(
    countdown: Res<Countdown>,
    mut texts: Query<&mut Text, With<TimerText>>,
) {
    if !countdown.is_changed() {
        return;
    }
    let Ok(mut text) = texts.get_single_mut() else {
        warn!("Timer display not found");
        return;
    };
    let display = countdown.display();
    if text.0 != display {
        text.0 = display;
    }
}
