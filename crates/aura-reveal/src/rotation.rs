//! Automatic provider rotation.
//!
//! Once two or more providers have finished loading, the displayed provider
//! cycles through them in ping-pong order after an initial delay. A manual
//! provider pick stops rotation until the next load.

use std::time::{Duration, Instant};

use aura_core::ImageProvider;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationState {
    /// Fewer than two providers available.
    Idle,
    /// Waiting out the initial delay.
    Scheduled,
    Running,
    /// Stopped by a manual selection or reduced motion.
    Disabled,
}

#[derive(Debug, Clone)]
pub struct RotationController {
    available: Vec<ImageProvider>,
    position: usize,
    forward: bool,
    state: RotationState,
    next_at: Option<Instant>,
    delay: Duration,
    interval: Duration,
    reduced_motion: bool,
}

impl RotationController {
    pub fn new(delay: Duration, interval: Duration, reduced_motion: bool) -> Self {
        Self {
            available: Vec::new(),
            position: 0,
            forward: true,
            state: if reduced_motion {
                RotationState::Disabled
            } else {
                RotationState::Idle
            },
            next_at: None,
            delay,
            interval,
            reduced_motion,
        }
    }

    pub const fn state(&self) -> RotationState {
        self.state
    }

    /// Providers that have finished loading, in completion order.
    pub fn available(&self) -> &[ImageProvider] {
        &self.available
    }

    /// When `poll` should next be called.
    pub const fn next_due(&self) -> Option<Instant> {
        self.next_at
    }

    /// Note that `provider` finished loading.
    pub fn mark_available(&mut self, provider: ImageProvider, now: Instant) {
        if !self.available.contains(&provider) {
            self.available.push(provider);
        }
        if self.state == RotationState::Idle && self.available.len() >= 2 {
            debug!(delay_ms = self.delay.as_millis(), "Scheduling provider rotation");
            self.state = RotationState::Scheduled;
            self.next_at = Some(now + self.delay);
        }
    }

    /// A user picked a provider. Rotation stays off for the rest of the load.
    pub fn manual_select(&mut self) {
        if self.state != RotationState::Disabled {
            debug!("Rotation disabled by manual selection");
        }
        self.state = RotationState::Disabled;
        self.next_at = None;
    }

    /// Advance if due, returning the provider to display next.
    pub fn poll(&mut self, now: Instant, current: ImageProvider) -> Option<ImageProvider> {
        if !matches!(
            self.state,
            RotationState::Scheduled | RotationState::Running
        ) {
            return None;
        }
        let due = self.next_at?;
        if now < due || self.available.len() < 2 {
            return None;
        }
        if let Some(i) = self.available.iter().position(|p| *p == current) {
            self.position = i;
        }
        self.step();
        self.state = RotationState::Running;
        self.next_at = Some(now + self.interval);
        Some(self.available[self.position])
    }

    /// Forget everything for a new load.
    pub fn reset(&mut self) {
        *self = Self::new(self.delay, self.interval, self.reduced_motion);
    }

    fn step(&mut self) {
        let last = self.available.len() - 1;
        if self.forward {
            if self.position >= last {
                self.forward = false;
                self.position = last.saturating_sub(1);
            } else {
                self.position += 1;
            }
        } else if self.position == 0 {
            self.forward = true;
            self.position = 1;
        } else {
            self.position -= 1;
        }
    }
}
