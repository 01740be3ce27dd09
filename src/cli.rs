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

//! Command-line handling
//!
//! ```text
//! vcool            run the daemon
//! vcool kill       stop a running instance and exit
//! vcool force      replace a running instance
//! vcool 50         hold the fan at 50% (test mode)
//! vcool 100 force  replace a running instance and hold 100%
//! ```

use tracing::warn;

use crate::instance::Directive;
use crate::types::DutyCycle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Help,
    Version,
    /// Terminate a running instance and exit
    Kill,
    Run {
        force: bool,
        /// Fixed duty for test mode; `None` for sensor-driven control
        test_duty: Option<DutyCycle>,
    },
}

impl Action {
    pub fn directive(&self) -> Directive {
        match self {
            Action::Kill => Directive::Kill,
            Action::Run { force: true, .. } => Directive::Force,
            _ => Directive::Normal,
        }
    }
}

/// Parse arguments (without the program name).
///
/// `kill` wins over everything else; a duty given alongside it is ignored.
/// If several numbers are given the last one is used. Numbers are clamped to
/// `0..=100`.
pub fn parse_args<I, S>(args: I) -> Result<Action, String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut kill = false;
    let mut force = false;
    let mut test_duty = None;

    for arg in args {
        let arg = arg.as_ref();
        match arg {
            "-h" | "--help" => return Ok(Action::Help),
            "-v" | "--version" => return Ok(Action::Version),
            "kill" => kill = true,
            "force" => force = true,
            other => match other.parse::<i64>() {
                Ok(n) => test_duty = Some(DutyCycle::clamped(n)),
                Err(_) => return Err(format!("Unknown argument: {}", other)),
            },
        }
    }

    if kill {
        if let Some(duty) = test_duty {
            warn!(duty = duty.percent(), "Ignoring test duty cycle given with kill");
        }
        return Ok(Action::Kill);
    }
    Ok(Action::Run { force, test_duty })
}

pub fn usage(program: &str) -> String {
    format!(
        "{0} {1} - GPIO fan control daemon\n\
         \n\
         USAGE:\n\
         \x20   {0}              run the daemon\n\
         \x20   {0} kill         stop a running instance\n\
         \x20   {0} force        replace a running instance\n\
         \x20   {0} <0-100>      test mode: hold the given duty cycle\n\
         \x20   {0} -v|--version print version\n\
         \x20   {0} -h|--help    print this help\n\
         \n\
         ENVIRONMENT:\n\
         \x20   VCOOL_LOG      log filter (trace, debug, info, warn, error)\n\
         \x20   VCOOL_CONFIG   configuration file (default /etc/vcool/config.json)",
        program,
        env!("CARGO_PKG_VERSION")
    )
}
