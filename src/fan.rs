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

//! Fan controller: the single owner of the fan duty cycle and PWM generator
//!
//! [`FanController::set_duty`] is the only way hardware output changes. A
//! change always stops and joins the running generator before anything else
//! touches the line, so at most one thread ever drives the pin. The controller
//! is not meant for concurrent callers; keep it on the control-loop thread.

use std::sync::Arc;

use tracing::{debug, info, warn};
use vc_error::{ControlError, GpioError};

use crate::gpio::{GpioLine, Level};
use crate::pwm::PwmGenerator;
use crate::types::{DutyCycle, Temperature};

/// Externally visible controller state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanState {
    /// No duty cycle applied yet
    Unset,
    /// Duty 0, line held inactive
    Idle,
    /// Generator running at the given duty
    Driving(DutyCycle),
    /// A non-zero duty was requested but no generator is running
    Stalled(DutyCycle),
    /// Generator joined and line released
    ShutDown,
}

pub struct FanController {
    line: Arc<dyn GpioLine>,
    current: Option<DutyCycle>,
    generator: Option<PwmGenerator>,
    generator_starts: u64,
    shut_down: bool,
}

impl FanController {
    pub fn new(line: Arc<dyn GpioLine>) -> Self {
        Self {
            line,
            current: None,
            generator: None,
            generator_starts: 0,
            shut_down: false,
        }
    }

    /// Last duty cycle requested, `None` before the first `set_duty`.
    pub fn current_duty(&self) -> Option<DutyCycle> {
        self.current
    }

    /// Number of generator threads started over the controller's lifetime.
    pub fn generator_starts(&self) -> u64 {
        self.generator_starts
    }

    pub fn is_generating(&self) -> bool {
        self.generator.as_ref().is_some_and(|g| !g.is_finished())
    }

    pub fn state(&self) -> FanState {
        if self.shut_down {
            return FanState::ShutDown;
        }
        match self.current {
            None => FanState::Unset,
            Some(d) if d.is_off() => FanState::Idle,
            Some(d) if self.is_generating() => FanState::Driving(d),
            Some(d) => FanState::Stalled(d),
        }
    }

    /// Move the fan to `duty`.
    ///
    /// Requesting the duty already in effect does nothing. Otherwise the
    /// running generator is stopped and joined, then a new one is started for a
    /// non-zero duty, or the line is set inactive for duty 0. The temperatures
    /// are only used for the change record, which is skipped when both are
    /// unknown (forced duty).
    ///
    /// If the generator cannot be started the fan is left off and the
    /// attempted duty is kept; the next call with the same duty retries.
    pub fn set_duty(&mut self, duty: DutyCycle, cpu: Temperature, gpu: Temperature) -> Result<(), ControlError> {
        if self.shut_down {
            return Err(GpioError::Released.into());
        }
        if self.current == Some(duty) && (duty.is_off() || self.is_generating()) {
            return Ok(());
        }

        if let Some(generator) = self.generator.take() {
            generator.stop();
        }
        self.current = Some(duty);

        if duty.is_off() {
            if let Err(e) = self.line.set_level(Level::Inactive) {
                // Line state unknown; force a fresh transition next time.
                self.current = None;
                return Err(e.into());
            }
        } else {
            let generator = PwmGenerator::start(Arc::clone(&self.line), duty).map_err(ControlError::StartFailed)?;
            self.generator = Some(generator);
            self.generator_starts += 1;
        }

        if cpu.is_known() || gpu.is_known() {
            info!(cpu = %cpu, gpu = %gpu, duty = duty.percent(), "Fan duty changed");
        } else {
            debug!(duty = duty.percent(), "Fan duty forced");
        }
        Ok(())
    }

    /// Stop the generator and release the line to its resting mode.
    ///
    /// Safe to call more than once; only the first call touches hardware.
    pub fn shutdown(&mut self) -> Result<(), GpioError> {
        if self.shut_down {
            debug!("Fan controller already shut down");
            return Ok(());
        }
        self.shut_down = true;
        if let Some(generator) = self.generator.take() {
            generator.stop();
        }
        self.line.release()
    }
}

impl Drop for FanController {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            warn!(error = %e, "Failed to release fan line");
        }
    }
}
