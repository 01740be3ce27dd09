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

//! Trigger conditions and their evaluation against a pair of temperatures

use std::fmt;

use crate::types::{Sensor, Temperature};

/// Single threshold test: the named sensor is at or above `threshold` °C.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Term {
    pub sensor: Sensor,
    pub threshold: i32,
}

impl Term {
    pub fn new(sensor: Sensor, threshold: i32) -> Self {
        Self { sensor, threshold }
    }

    /// `None` when the sensor this term reads has no real value.
    fn check(&self, cpu: Temperature, gpu: Temperature) -> Option<bool> {
        let reading = match self.sensor {
            Sensor::Cpu => cpu,
            Sensor::Gpu => gpu,
        };
        reading.at_least(self.threshold)
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.sensor.letter(), self.threshold)
    }
}

/// Rule trigger: one term, or two terms joined by `|` or `&`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    Simple(Term),
    Or(Term, Term),
    And(Term, Term),
}

impl Condition {
    /// True only if the condition is definitely satisfied.
    ///
    /// An unknown reading makes its term unknown, and an unknown term never
    /// satisfies anything: `Or` needs one term known-true, `And` needs both.
    pub fn evaluate(&self, cpu: Temperature, gpu: Temperature) -> bool {
        let holds = |t: &Term| t.check(cpu, gpu) == Some(true);
        match self {
            Condition::Simple(t) => holds(t),
            Condition::Or(a, b) => holds(a) || holds(b),
            Condition::And(a, b) => holds(a) && holds(b),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Simple(t) => write!(f, "{}", t),
            Condition::Or(a, b) => write!(f, "{}|{}", a, b),
            Condition::And(a, b) => write!(f, "{}&{}", a, b),
        }
    }
}

/// Evaluate `condition` against the current CPU and GPU readings.
pub fn evaluate(condition: &Condition, cpu: Temperature, gpu: Temperature) -> bool {
    condition.evaluate(cpu, gpu)
}
