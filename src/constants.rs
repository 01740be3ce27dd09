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

//! Constants and defaults for vcool
//!
//! Paths and timing values used when no configuration file overrides them.

/// Default filesystem locations
pub mod paths {
    /// Optional daemon configuration file
    pub const CONFIG_FILE: &str = "/etc/vcool/config.json";

    /// Environment variable overriding [`CONFIG_FILE`]
    pub const CONFIG_ENV: &str = "VCOOL_CONFIG";

    /// Rule file, one `<condition> <action>` per line
    pub const STRATEGY_FILE: &str = "/etc/vcool/vcool.stg";

    pub const PID_FILE: &str = "/var/run/vcool.pid";

    /// Thermal zone reporting the CPU temperature in millidegrees
    pub const CPU_TEMP_FILE: &str = "/sys/devices/virtual/thermal/thermal_zone0/temp";

    /// Thermal zone reporting the GPU temperature in millidegrees
    pub const GPU_TEMP_FILE: &str = "/sys/devices/virtual/thermal/thermal_zone1/temp";

    /// Present when systemd-journald is accepting native log records
    pub const JOURNALD_SOCKET: &str = "/run/systemd/journal/socket";
}

/// GPIO line defaults (GPIO4_D1 on the reference board)
pub mod gpio {
    pub const CHIP: &str = "/dev/gpiochip4";
    pub const LINE: u32 = 25;

    /// Consumer label shown by `gpioinfo`
    pub const CONSUMER: &str = "vcool";
}

/// Timing values
pub mod timing {
    use std::time::Duration;

    /// Software PWM period in microseconds (20 Hz)
    pub const PWM_PERIOD_US: u64 = 50_000;

    pub const DEFAULT_POLL_INTERVAL_MS: u64 = 3_000;
    pub const MIN_POLL_INTERVAL_MS: u64 = 100;
    pub const MAX_POLL_INTERVAL_MS: u64 = 600_000;

    /// Granularity at which sleeping loops check for shutdown
    pub const SHUTDOWN_CHECK: Duration = Duration::from_millis(50);

    /// Grace period after signalling a previous instance
    pub const INSTANCE_KILL_WAIT: Duration = Duration::from_secs(1);
}

/// Logging
pub mod log {
    /// Environment variable holding the tracing filter
    pub const LEVEL_ENV: &str = "VCOOL_LOG";
    pub const DEFAULT_LEVEL: &str = "info";
}
