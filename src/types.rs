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

//! Core value types shared by the rule engine and the fan controller

use std::fmt;

/// Temperature sensor identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sensor {
    Cpu,
    Gpu,
}

impl Sensor {
    /// Letter used for this sensor in strategy-file conditions
    pub fn letter(self) -> char {
        match self {
            Sensor::Cpu => 'C',
            Sensor::Gpu => 'G',
        }
    }

    pub fn from_letter(c: char) -> Option<Self> {
        match c {
            'C' => Some(Sensor::Cpu),
            'G' => Some(Sensor::Gpu),
            _ => None,
        }
    }
}

impl fmt::Display for Sensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sensor::Cpu => write!(f, "CPU"),
            Sensor::Gpu => write!(f, "GPU"),
        }
    }
}

/// A temperature reading in whole degrees Celsius.
///
/// `Unknown` stands for "no real reading" (unreadable sensor, or a forced
/// duty cycle in test mode). It never compares against a threshold: every
/// comparison involving it is itself unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Temperature {
    Celsius(i32),
    #[default]
    Unknown,
}

impl Temperature {
    /// Convert a thermal-zone millidegree value, truncating toward zero.
    pub fn from_millidegrees(milli: i64) -> Self {
        let degrees = milli / 1000;
        match i32::try_from(degrees) {
            Ok(d) => Temperature::Celsius(d),
            Err(_) => Temperature::Unknown,
        }
    }

    pub fn celsius(self) -> Option<i32> {
        match self {
            Temperature::Celsius(c) => Some(c),
            Temperature::Unknown => None,
        }
    }

    pub fn is_known(self) -> bool {
        matches!(self, Temperature::Celsius(_))
    }

    /// Three-valued `self >= threshold`; `None` when the reading is unknown.
    pub fn at_least(self, threshold: i32) -> Option<bool> {
        self.celsius().map(|c| c >= threshold)
    }
}

impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Temperature::Celsius(c) => write!(f, "{}°C", c),
            Temperature::Unknown => write!(f, "n/a"),
        }
    }
}

/// Fan duty cycle as a whole percentage in `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct DutyCycle(u8);

impl DutyCycle {
    pub const OFF: DutyCycle = DutyCycle(0);
    pub const FULL: DutyCycle = DutyCycle(100);

    /// `None` when `percent` is above 100.
    pub fn new(percent: u8) -> Option<Self> {
        (percent <= 100).then_some(DutyCycle(percent))
    }

    /// Clamp an arbitrary integer into `0..=100`.
    pub fn clamped(value: i64) -> Self {
        DutyCycle(value.clamp(0, 100) as u8)
    }

    pub fn percent(self) -> u8 {
        self.0
    }

    pub fn is_off(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for DutyCycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}
