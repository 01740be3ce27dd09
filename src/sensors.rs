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

//! Temperature sensor access
//!
//! Readings come from thermal-zone files holding one integer in millidegrees
//! Celsius. A sensor that cannot be read yields [`Temperature::Unknown`]; this
//! is logged and never fatal.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::types::{Sensor, Temperature};

/// Source of the current CPU and GPU temperatures
#[cfg_attr(test, mockall::automock)]
pub trait TemperatureSource {
    fn read(&self, sensor: Sensor) -> Temperature;
}

/// Sysfs thermal zones for the CPU and GPU
#[derive(Debug, Clone)]
pub struct ThermalZones {
    cpu: PathBuf,
    gpu: PathBuf,
}

impl ThermalZones {
    pub fn new(cpu: impl Into<PathBuf>, gpu: impl Into<PathBuf>) -> Self {
        Self {
            cpu: cpu.into(),
            gpu: gpu.into(),
        }
    }

    pub fn path(&self, sensor: Sensor) -> &Path {
        match sensor {
            Sensor::Cpu => &self.cpu,
            Sensor::Gpu => &self.gpu,
        }
    }
}

impl TemperatureSource for ThermalZones {
    fn read(&self, sensor: Sensor) -> Temperature {
        let path = self.path(sensor);
        match read_millidegrees(path) {
            Ok(milli) => Temperature::from_millidegrees(milli),
            Err(e) => {
                warn!(sensor = %sensor, path = %path.display(), error = %e, "Could not read temperature");
                Temperature::Unknown
            }
        }
    }
}

/// Read a millidegree value from a thermal-zone style file.
pub fn read_millidegrees(path: &Path) -> io::Result<i64> {
    let mut s = String::new();
    fs::File::open(path)?.read_to_string(&mut s)?;
    let raw = s.trim();
    raw.parse::<i64>().map_err(|e| {
        io::Error::new(io::ErrorKind::InvalidData, format!("invalid reading '{}': {}", raw, e))
    })
}
