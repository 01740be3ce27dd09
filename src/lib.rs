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


//! vcool - threshold-driven GPIO fan control
//!
//! Reads CPU and GPU temperatures, matches them against a rule file, and
//! drives a fan line with a software PWM signal at the duty cycle of the first
//! matching rule.

pub mod cli;
pub mod condition;
pub mod config;
pub mod constants;
pub mod control;
pub mod fan;
pub mod gpio;
pub mod instance;
pub mod logger;
pub mod pwm;
pub mod sensors;
pub mod strategy;
pub mod types;

#[cfg(test)]
pub mod test_utils;
