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

//! GPIO line ownership
//!
//! The fan is driven from a single GPIO line requested through the Linux
//! GPIO character device. While the daemon runs the line is an output; on
//! release it is handed back as an input with pull-up, the safe resting state
//! the board has before the daemon starts.

use std::path::{Path, PathBuf};

use gpiocdev::line::{Bias, Value};
use gpiocdev::Request;
use parking_lot::Mutex;
use tracing::{debug, info, warn};
use vc_error::GpioError;

/// Logical fan drive level, independent of the pin polarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    /// Fan driven
    Active,
    /// Fan not driven
    Inactive,
}

/// An output line the fan controller and PWM generator write to.
pub trait GpioLine: Send + Sync {
    /// Drive the line to `level`.
    fn set_level(&self, level: Level) -> Result<(), GpioError>;

    /// Return the line to its safe resting mode. Calling this again after a
    /// release must be a no-op.
    fn release(&self) -> Result<(), GpioError>;
}

enum LineState {
    Output(Request),
    Input(Request),
    Released,
}

/// A GPIO line requested from a character-device chip.
pub struct GpioResource {
    chip: PathBuf,
    offset: u32,
    active_low: bool,
    state: Mutex<LineState>,
}

impl GpioResource {
    /// Request `offset` on `chip` as an output, initially inactive.
    ///
    /// With `active_low` the fan is driven when the pin is physically low.
    pub fn acquire(chip: impl Into<PathBuf>, offset: u32, active_low: bool) -> Result<Self, GpioError> {
        let chip = chip.into();
        let initial = physical_value(Level::Inactive, active_low);
        let request = Request::builder()
            .on_chip(&chip)
            .with_consumer(crate::constants::gpio::CONSUMER)
            .with_line(offset)
            .as_output(initial)
            .request()
            .map_err(|e| request_error(&chip, offset, e))?;

        info!(chip = %chip.display(), line = offset, active_low, "GPIO line acquired as output");
        Ok(Self {
            chip,
            offset,
            active_low,
            state: Mutex::new(LineState::Output(request)),
        })
    }

    pub fn chip(&self) -> &Path {
        &self.chip
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Whether the line is still held as an output.
    pub fn is_output(&self) -> bool {
        matches!(*self.state.lock(), LineState::Output(_))
    }

    fn request_input_pull_up(&self) -> Result<Request, GpioError> {
        Request::builder()
            .on_chip(&self.chip)
            .with_consumer(crate::constants::gpio::CONSUMER)
            .with_line(self.offset)
            .as_input()
            .with_bias(Bias::PullUp)
            .request()
            .map_err(|e| request_error(&self.chip, self.offset, e))
    }
}

impl GpioLine for GpioResource {
    fn set_level(&self, level: Level) -> Result<(), GpioError> {
        let state = self.state.lock();
        match &*state {
            LineState::Output(request) => request
                .set_value(self.offset, physical_value(level, self.active_low))
                .map_err(|e| GpioError::Write {
                    offset: self.offset,
                    reason: e.to_string(),
                }),
            _ => Err(GpioError::Released),
        }
    }

    fn release(&self) -> Result<(), GpioError> {
        let mut state = self.state.lock();
        if !matches!(*state, LineState::Output(_)) {
            debug!(line = self.offset, "GPIO line already released");
            return Ok(());
        }

        // The output request must be dropped before the line can be requested again.
        *state = LineState::Released;
        let input = self.request_input_pull_up()?;
        *state = LineState::Input(input);
        info!(line = self.offset, "GPIO line released to input with pull-up");
        Ok(())
    }
}

impl Drop for GpioResource {
    fn drop(&mut self) {
        if self.is_output() {
            if let Err(e) = self.release() {
                warn!(line = self.offset, error = %e, "Failed to release GPIO line on drop");
            }
        }
    }
}

fn physical_value(level: Level, active_low: bool) -> Value {
    match (level, active_low) {
        (Level::Active, false) | (Level::Inactive, true) => Value::Active,
        (Level::Active, true) | (Level::Inactive, false) => Value::Inactive,
    }
}

fn request_error(chip: &Path, offset: u32, e: gpiocdev::Error) -> GpioError {
    GpioError::Request {
        chip: chip.to_path_buf(),
        offset,
        reason: e.to_string(),
    }
}
