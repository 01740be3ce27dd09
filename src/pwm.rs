/*
 * This file is part of vcool.
 *
 * Copyright (C) 2025 vcool contributors
 *
 * vcool is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * vcool is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with vcool. If not, see <https://www.gnu.org/licenses/>.
 */

//! Software PWM signal generator
//!
//! A dedicated thread toggles the fan line with a fixed 20 Hz period split
//! into an active phase and an inactive phase. The duty cycle is fixed for the
//! lifetime of a generator; changing it means stopping this one and starting a
//! new one.
//!
//! Cancellation is a shared flag checked at every phase boundary. No phase is
//! longer than one period, so a stop request is observed within 50 ms. A
//! cancelled generator performs no further pin write; the owner decides what
//! level the line holds afterwards.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, error};

use crate::constants::timing::PWM_PERIOD_US;
use crate::gpio::{GpioLine, Level};
use crate::types::DutyCycle;

/// One PWM period split into its active and inactive phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PwmTiming {
    pub high_us: u64,
    pub low_us: u64,
}

impl PwmTiming {
    pub fn for_duty(duty: DutyCycle) -> Self {
        let high_us = PWM_PERIOD_US * u64::from(duty.percent()) / 100;
        Self {
            high_us,
            low_us: PWM_PERIOD_US - high_us,
        }
    }

    pub fn period_us(&self) -> u64 {
        self.high_us + self.low_us
    }
}

/// Handle to a running generator thread. Dropping it stops the thread.
pub struct PwmGenerator {
    duty: DutyCycle,
    cancel: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl PwmGenerator {
    /// Spawn a generator driving `line` at `duty`.
    ///
    /// Fails only if the thread cannot be created.
    pub fn start(line: Arc<dyn GpioLine>, duty: DutyCycle) -> io::Result<Self> {
        let timing = PwmTiming::for_duty(duty);
        let cancel = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancel);
        let thread = thread::Builder::new()
            .name(format!("vcool-pwm-{}", duty.percent()))
            .spawn(move || generate(line.as_ref(), timing, &flag))?;

        debug!(duty = duty.percent(), high_us = timing.high_us, low_us = timing.low_us, "PWM generator started");
        Ok(Self {
            duty,
            cancel,
            thread: Some(thread),
        })
    }

    pub fn duty(&self) -> DutyCycle {
        self.duty
    }

    /// True once the generator thread has exited, e.g. after a write failure.
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().map_or(true, |t| t.is_finished())
    }

    /// Request cancellation and block until the thread has exited.
    pub fn stop(mut self) {
        self.cancel_and_join();
    }

    fn cancel_and_join(&mut self) {
        self.cancel.store(true, Ordering::Release);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!(duty = self.duty.percent(), "PWM generator thread panicked");
            } else {
                debug!(duty = self.duty.percent(), "PWM generator stopped");
            }
        }
    }
}

impl Drop for PwmGenerator {
    fn drop(&mut self) {
        self.cancel_and_join();
    }
}

fn generate(line: &dyn GpioLine, timing: PwmTiming, cancel: &AtomicBool) {
    let phases = [(Level::Active, timing.high_us), (Level::Inactive, timing.low_us)];
    'run: loop {
        for (level, micros) in phases {
            if micros == 0 {
                continue;
            }
            if cancel.load(Ordering::Acquire) {
                break 'run;
            }
            if let Err(e) = line.set_level(level) {
                error!(error = %e, "PWM generator write failed, stopping");
                break 'run;
            }
            thread::sleep(Duration::from_micros(micros));
        }
    }
}
