/*
 * Integration tests for vcool
 *
 * These drive the control loop end to end: rule files and thermal-zone files
 * live in a temp directory, and the fan line is a fake that records levels.
 */

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use vc_error::GpioError;
use vcool::control::ControlLoop;
use vcool::fan::{FanController, FanState};
use vcool::gpio::{GpioLine, Level};
use vcool::sensors::ThermalZones;
use vcool::strategy::{parse_rules, select_duty};
use vcool::types::{DutyCycle, Temperature};

// Test utilities
#[derive(Default)]
struct FakeLine {
    levels: Mutex<Vec<Level>>,
    released: AtomicBool,
    releases: Mutex<usize>,
}

impl FakeLine {
    fn levels(&self) -> Vec<Level> {
        self.levels.lock().clone()
    }

    fn releases(&self) -> usize {
        *self.releases.lock()
    }
}

impl GpioLine for FakeLine {
    fn set_level(&self, level: Level) -> Result<(), GpioError> {
        if self.released.load(Ordering::SeqCst) {
            return Err(GpioError::Released);
        }
        self.levels.lock().push(level);
        Ok(())
    }

    fn release(&self) -> Result<(), GpioError> {
        if !self.released.swap(true, Ordering::SeqCst) {
            *self.releases.lock() += 1;
        }
        Ok(())
    }
}

struct Board {
    dir: tempfile::TempDir,
    cpu: PathBuf,
    gpu: PathBuf,
    strategy: PathBuf,
}

impl Board {
    fn new(strategy: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let cpu = dir.path().join("cpu_temp");
        let gpu = dir.path().join("gpu_temp");
        let strategy_path = dir.path().join("vcool.stg");
        fs::write(&strategy_path, strategy).unwrap();
        let board = Self {
            dir,
            cpu,
            gpu,
            strategy: strategy_path,
        };
        board.set_temps(40, 40);
        board
    }

    /// Write thermal-zone files in millidegrees, like sysfs does.
    fn set_temps(&self, cpu_c: i32, gpu_c: i32) {
        fs::write(&self.cpu, format!("{}\n", cpu_c * 1000)).unwrap();
        fs::write(&self.gpu, format!("{}\n", gpu_c * 1000)).unwrap();
    }

    fn control(&self) -> ControlLoop<ThermalZones> {
        ControlLoop::new(
            ThermalZones::new(&self.cpu, &self.gpu),
            &self.strategy,
            Duration::from_millis(100),
        )
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }
}

fn duty(pct: u8) -> DutyCycle {
    DutyCycle::new(pct).unwrap()
}

fn fan() -> (Arc<FakeLine>, FanController) {
    let line = Arc::new(FakeLine::default());
    let fan = FanController::new(line.clone());
    (line, fan)
}

#[test]
fn test_cpu_thresholds_first_match() {
    let board = Board::new("C80 F100\nC60 F50\n");
    let control = board.control();
    let (_line, mut fan) = fan();

    board.set_temps(85, 30);
    assert_eq!(control.run_once(&mut fan).unwrap(), DutyCycle::FULL);
    assert_eq!(fan.state(), FanState::Driving(DutyCycle::FULL));

    board.set_temps(65, 30);
    assert_eq!(control.run_once(&mut fan).unwrap(), duty(50));
    assert_eq!(fan.state(), FanState::Driving(duty(50)));

    board.set_temps(50, 30);
    assert_eq!(control.run_once(&mut fan).unwrap(), DutyCycle::OFF);
    assert_eq!(fan.state(), FanState::Idle);
    assert_eq!(fan.generator_starts(), 2);
}

#[test]
fn test_or_condition_either_sensor() {
    let board = Board::new("C70|G70 F80\n");
    let control = board.control();
    let (_line, mut fan) = fan();

    for (cpu, gpu, expected) in [(75, 20, 80), (20, 75, 80), (69, 69, 0), (70, 70, 80)] {
        board.set_temps(cpu, gpu);
        assert_eq!(control.run_once(&mut fan).unwrap(), duty(expected), "cpu={} gpu={}", cpu, gpu);
    }
}

#[test]
fn test_and_condition_needs_both_sensors() {
    let board = Board::new("C70&G70 F80\n");
    let control = board.control();
    let (_line, mut fan) = fan();

    for (cpu, gpu, expected) in [(75, 20, 0), (20, 75, 0), (70, 70, 80), (90, 71, 80)] {
        board.set_temps(cpu, gpu);
        assert_eq!(control.run_once(&mut fan).unwrap(), duty(expected), "cpu={} gpu={}", cpu, gpu);
    }
}

#[test]
fn test_malformed_lines_do_not_block_later_rules() {
    let board = Board::new("# profile\n\nC70|G80&C90 F100\nX50 F20\nC50 F\nC50 F60 extra\nC50 F40\n");
    let control = board.control();
    let (_line, mut fan) = fan();

    board.set_temps(55, 30);
    assert_eq!(control.run_once(&mut fan).unwrap(), duty(40));
}

#[test]
fn test_unreadable_sensor_never_matches() {
    let board = Board::new("C0 F100\nG30 F50\n");
    let control = board.control();
    let (_line, mut fan) = fan();

    fs::write(&board.cpu, "not a number\n").unwrap();
    assert_eq!(control.run_once(&mut fan).unwrap(), duty(50));

    fs::write(&board.gpu, "").unwrap();
    assert_eq!(control.run_once(&mut fan).unwrap(), DutyCycle::OFF);
}

#[test]
fn test_missing_strategy_file_keeps_fan_off() {
    let board = Board::new("C10 F100\n");
    fs::remove_file(&board.strategy).unwrap();
    let control = board.control();
    let (line, mut fan) = fan();

    board.set_temps(95, 95);
    assert_eq!(control.run_once(&mut fan).unwrap(), DutyCycle::OFF);
    assert_eq!(line.levels(), vec![Level::Inactive]);
}

#[test]
fn test_strategy_file_is_reread_every_poll() {
    let board = Board::new("C60 F30\n");
    let control = board.control();
    let (_line, mut fan) = fan();

    board.set_temps(65, 20);
    assert_eq!(control.run_once(&mut fan).unwrap(), duty(30));

    fs::write(board.path().join("vcool.stg"), "C60 F75\n").unwrap();
    assert_eq!(control.run_once(&mut fan).unwrap(), duty(75));
}

#[test]
fn test_repeated_polls_start_one_generator() {
    let board = Board::new("G50 F60\n");
    let control = board.control();
    let (line, mut fan) = fan();

    board.set_temps(30, 55);
    for _ in 0..4 {
        control.run_once(&mut fan).unwrap();
    }
    assert_eq!(fan.generator_starts(), 1);

    thread::sleep(Duration::from_millis(120));
    let levels = line.levels();
    assert!(levels.contains(&Level::Active));
    assert!(levels.contains(&Level::Inactive));
}

#[test]
fn test_shutdown_releases_line_once() {
    let board = Board::new("C50 F90\n");
    let control = board.control();
    let (line, mut fan) = fan();

    board.set_temps(60, 20);
    control.run_once(&mut fan).unwrap();
    fan.shutdown().unwrap();
    let written = line.levels().len();

    fan.shutdown().unwrap();
    drop(fan);
    thread::sleep(Duration::from_millis(60));
    assert_eq!(line.releases(), 1);
    assert_eq!(line.levels().len(), written);
}

#[test]
fn test_run_loop_follows_temperature_until_shutdown() {
    let board = Board::new("C80 F100\nC60 F50\n");
    let control = board.control();
    let (_line, mut fan) = fan();
    board.set_temps(85, 20);

    let shutdown = Arc::new(AtomicBool::new(false));
    let driver = {
        let shutdown = Arc::clone(&shutdown);
        let cpu = board.cpu.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(150));
            fs::write(&cpu, "65000\n").unwrap();
            thread::sleep(Duration::from_millis(300));
            shutdown.store(true, Ordering::SeqCst);
        })
    };

    control.run(&mut fan, &shutdown);
    driver.join().unwrap();

    assert_eq!(fan.state(), FanState::Driving(duty(50)));
    assert_eq!(fan.generator_starts(), 2);
    fan.shutdown().unwrap();
}

#[test]
fn test_sentinel_temperatures_never_select_a_rule() {
    let rules = parse_rules("C-100 F100\nG-100|C-100 F90\nC-100&G-100 F80\n");
    assert_eq!(rules.len(), 3);
    assert_eq!(select_duty(&rules, Temperature::Unknown, Temperature::Unknown), None);
}
