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

//! Sensor-driven control loop
//!
//! Each poll reads both sensors, re-reads the strategy file, and hands the
//! duty of the first matching rule (or 0 when nothing matches) to the fan
//! controller. Sensor, strategy and transition failures are logged and the
//! loop carries on at the next poll.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};
use vc_error::ControlError;

use crate::constants::timing::SHUTDOWN_CHECK;
use crate::fan::FanController;
use crate::sensors::TemperatureSource;
use crate::strategy::{load_rules, select_duty};
use crate::types::{DutyCycle, Sensor, Temperature};

pub struct ControlLoop<S: TemperatureSource> {
    sensors: S,
    strategy_file: PathBuf,
    interval: Duration,
}

impl<S: TemperatureSource> ControlLoop<S> {
    pub fn new(sensors: S, strategy_file: impl Into<PathBuf>, interval: Duration) -> Self {
        Self {
            sensors,
            strategy_file: strategy_file.into(),
            interval,
        }
    }

    /// Duty cycle the strategy file asks for at these temperatures.
    pub fn target_duty(&self, cpu: Temperature, gpu: Temperature) -> DutyCycle {
        match load_rules(&self.strategy_file) {
            Ok(rules) => select_duty(&rules, cpu, gpu).unwrap_or(DutyCycle::OFF),
            Err(e) => {
                warn!(path = %self.strategy_file.display(), error = %e, "Could not read strategy file");
                DutyCycle::OFF
            }
        }
    }

    /// One poll: read sensors, pick a duty, apply it.
    pub fn run_once(&self, fan: &mut FanController) -> Result<DutyCycle, ControlError> {
        let cpu = self.sensors.read(Sensor::Cpu);
        let gpu = self.sensors.read(Sensor::Gpu);
        let duty = self.target_duty(cpu, gpu);
        debug!(cpu = %cpu, gpu = %gpu, duty = duty.percent(), "Poll");
        fan.set_duty(duty, cpu, gpu)?;
        Ok(duty)
    }

    /// Poll until `shutdown` is set.
    pub fn run(&self, fan: &mut FanController, shutdown: &AtomicBool) {
        info!(
            strategy = %self.strategy_file.display(),
            interval_ms = self.interval.as_millis() as u64,
            "Control loop started"
        );
        while !shutdown.load(Ordering::SeqCst) {
            if let Err(e) = self.run_once(fan) {
                error!(error = %e, "Fan update failed, retrying next poll");
            }
            if sleep_unless_shutdown(self.interval, shutdown) {
                break;
            }
        }
        info!("Control loop stopped");
    }
}

/// Sleep for `duration`, waking early if `shutdown` is set.
///
/// Returns true when shutdown was requested.
pub fn sleep_unless_shutdown(duration: Duration, shutdown: &AtomicBool) -> bool {
    let deadline = Instant::now() + duration;
    loop {
        if shutdown.load(Ordering::SeqCst) {
            return true;
        }
        let now = Instant::now();
        if now >= deadline {
            return false;
        }
        thread::sleep(SHUTDOWN_CHECK.min(deadline - now));
    }
}

/// Block until `shutdown` is set.
pub fn wait_for_shutdown(shutdown: &AtomicBool) {
    while !sleep_unless_shutdown(Duration::from_secs(60), shutdown) {}
}
