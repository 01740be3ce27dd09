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

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use vc_error::{Result, VcoolError};

use crate::constants::{gpio, paths, timing};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct DaemonConfig {
    /// GPIO character device driving the fan
    pub gpio_chip: PathBuf,
    pub gpio_line: u32,
    /// Fan runs while the pin is physically low
    pub active_low: bool,
    pub strategy_file: PathBuf,
    pub cpu_temp_file: PathBuf,
    pub gpu_temp_file: PathBuf,
    pub pid_file: PathBuf,
    pub poll_interval_ms: u64,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            gpio_chip: PathBuf::from(gpio::CHIP),
            gpio_line: gpio::LINE,
            active_low: true,
            strategy_file: PathBuf::from(paths::STRATEGY_FILE),
            cpu_temp_file: PathBuf::from(paths::CPU_TEMP_FILE),
            gpu_temp_file: PathBuf::from(paths::GPU_TEMP_FILE),
            pid_file: PathBuf::from(paths::PID_FILE),
            poll_interval_ms: timing::DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl DaemonConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Config file location, honouring `VCOOL_CONFIG`.
pub fn config_path() -> PathBuf {
    match env::var(paths::CONFIG_ENV) {
        Ok(p) if !p.is_empty() => PathBuf::from(p),
        _ => PathBuf::from(paths::CONFIG_FILE),
    }
}

/// Load the daemon config. A missing file means defaults.
pub fn load_config(path: &Path) -> Result<DaemonConfig> {
    let data = match fs::read_to_string(path) {
        Ok(d) => d,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(DaemonConfig::default()),
        Err(e) => return Err(e.into()),
    };
    let cfg: DaemonConfig = serde_json::from_str(&data)?;
    validate_config(&cfg)?;
    Ok(cfg)
}

fn check_path(field: &str, p: &Path) -> Result<()> {
    if p.as_os_str().is_empty() {
        return Err(VcoolError::config(format!("{} must not be empty", field)));
    }
    if !p.is_absolute() {
        return Err(VcoolError::config(format!("{} must be an absolute path", field)));
    }
    Ok(())
}

pub fn validate_config(cfg: &DaemonConfig) -> Result<()> {
    check_path("gpio_chip", &cfg.gpio_chip)?;
    check_path("strategy_file", &cfg.strategy_file)?;
    check_path("cpu_temp_file", &cfg.cpu_temp_file)?;
    check_path("gpu_temp_file", &cfg.gpu_temp_file)?;
    check_path("pid_file", &cfg.pid_file)?;
    if !(timing::MIN_POLL_INTERVAL_MS..=timing::MAX_POLL_INTERVAL_MS).contains(&cfg.poll_interval_ms) {
        return Err(VcoolError::config(format!(
            "poll_interval_ms must be within {}..={}",
            timing::MIN_POLL_INTERVAL_MS,
            timing::MAX_POLL_INTERVAL_MS
        )));
    }
    Ok(())
}
