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


use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info, warn};

use vcool::cli::{self, Action};
use vcool::config::{config_path, load_config, DaemonConfig};
use vcool::control::{wait_for_shutdown, ControlLoop};
use vcool::fan::FanController;
use vcool::gpio::GpioResource;
use vcool::instance::{resolve_previous, PidFile, Startup};
use vcool::logger;
use vcool::sensors::ThermalZones;
use vcool::types::{DutyCycle, Temperature};

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn install_panic_hook() {
    std::panic::set_hook(Box::new(|panic_info| {
        let location = panic_info
            .location()
            .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
            .unwrap_or_else(|| "unknown".to_string());

        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        eprintln!("PANIC at {}: {}", location, message);
    }));
}

fn main() -> anyhow::Result<()> {
    install_panic_hook();

    let mut args = std::env::args();
    let program = args.next().unwrap_or_else(|| "vcool".to_string());

    let sink = logger::init_logging();
    info!("{} {} starting, logging to {}", program, VERSION, sink);

    // SAFETY: geteuid has no preconditions and cannot fail.
    if unsafe { libc::geteuid() } != 0 {
        warn!("Not running as root; PID file and GPIO access will probably fail");
    }

    let action = match cli::parse_args(args) {
        Ok(action) => action,
        Err(msg) => {
            eprintln!("{}", msg);
            eprintln!("{}", cli::usage(&program));
            process::exit(1);
        }
    };

    let test_duty = match action {
        Action::Help => {
            println!("{}", cli::usage(&program));
            return Ok(());
        }
        Action::Version => {
            println!("vcool {}", VERSION);
            return Ok(());
        }
        Action::Kill => None,
        Action::Run { test_duty, .. } => test_duty,
    };

    let cfg_path = config_path();
    let cfg = match load_config(&cfg_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(path = %cfg_path.display(), "Invalid configuration: {}", e);
            process::exit(1);
        }
    };

    let pid_file = PidFile::new(&cfg.pid_file);
    match resolve_previous(&pid_file, action.directive(), &program) {
        Ok(Startup::Proceed) => {}
        Ok(Startup::Exit) => return Ok(()),
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    }

    if let Err(e) = pid_file.write_current() {
        error!("Could not write PID file: {}", e);
        process::exit(1);
    }

    let result = run(&cfg, test_duty);
    pid_file.remove_if_owned();
    if let Err(e) = result {
        error!("{:#}", e);
        process::exit(1);
    }
    info!("Exit");
    Ok(())
}

fn run(cfg: &DaemonConfig, test_duty: Option<DutyCycle>) -> anyhow::Result<()> {
    let line = GpioResource::acquire(&cfg.gpio_chip, cfg.gpio_line, cfg.active_low)
        .context("Failed to acquire fan GPIO line")?;
    info!("Fan on {} line {}", line.chip().display(), line.offset());

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = Arc::clone(&shutdown);
        if let Err(e) = ctrlc::set_handler(move || {
            shutdown.store(true, Ordering::SeqCst);
        }) {
            warn!("Failed to set signal handler: {}. Shutdown via signals may not work cleanly.", e);
        }
    }

    let mut fan = FanController::new(Arc::new(line));

    match test_duty {
        Some(duty) => {
            info!("Test mode: set fan duty cycle to {}", duty);
            if let Err(e) = fan.set_duty(duty, Temperature::Unknown, Temperature::Unknown) {
                error!("Failed to set test duty cycle: {}", e);
            }
            wait_for_shutdown(&shutdown);
        }
        None => {
            let sensors = ThermalZones::new(&cfg.cpu_temp_file, &cfg.gpu_temp_file);
            ControlLoop::new(sensors, &cfg.strategy_file, cfg.poll_interval()).run(&mut fan, &shutdown);
        }
    }

    info!("Termination requested, stopping fan");
    fan.shutdown().context("Failed to release fan GPIO line")?;
    Ok(())
}
