/*
 * Test utilities and fakes for vcool
 *
 * Hardware stand-ins shared by the unit test modules: a GPIO line that
 * records every write and a temperature source with settable readings.
 */

#[cfg(test)]
pub mod test_utils {
    use std::fs;
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use parking_lot::Mutex;
    use vc_error::GpioError;

    use crate::gpio::{GpioLine, Level};
    use crate::sensors::TemperatureSource;
    use crate::types::{Sensor, Temperature};

    /// GPIO line that records writes instead of touching hardware
    #[derive(Default)]
    pub struct RecordingLine {
        writes: Mutex<Vec<Level>>,
        released: AtomicBool,
        releases: AtomicUsize,
        fail: AtomicBool,
    }

    impl RecordingLine {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn writes(&self) -> Vec<Level> {
            self.writes.lock().clone()
        }

        pub fn last_write(&self) -> Option<Level> {
            self.writes.lock().last().copied()
        }

        /// Number of times the line actually went back to its resting mode
        pub fn releases(&self) -> usize {
            self.releases.load(Ordering::SeqCst)
        }

        pub fn is_released(&self) -> bool {
            self.released.load(Ordering::SeqCst)
        }

        pub fn fail_writes(&self, fail: bool) {
            self.fail.store(fail, Ordering::SeqCst);
        }
    }

    impl GpioLine for RecordingLine {
        fn set_level(&self, level: Level) -> Result<(), GpioError> {
            if self.is_released() {
                return Err(GpioError::Released);
            }
            if self.fail.load(Ordering::SeqCst) {
                return Err(GpioError::Write {
                    offset: 0,
                    reason: "injected failure".to_string(),
                });
            }
            self.writes.lock().push(level);
            Ok(())
        }

        fn release(&self) -> Result<(), GpioError> {
            if !self.released.swap(true, Ordering::SeqCst) {
                self.releases.fetch_add(1, Ordering::SeqCst);
            }
            Ok(())
        }
    }

    /// Temperature source returning whatever the test last set
    pub struct FixedTemps {
        cpu: Mutex<Temperature>,
        gpu: Mutex<Temperature>,
    }

    impl FixedTemps {
        pub fn new(cpu: Temperature, gpu: Temperature) -> Self {
            Self {
                cpu: Mutex::new(cpu),
                gpu: Mutex::new(gpu),
            }
        }

        pub fn celsius(cpu: i32, gpu: i32) -> Self {
            Self::new(Temperature::Celsius(cpu), Temperature::Celsius(gpu))
        }
    }

    impl TemperatureSource for FixedTemps {
        fn read(&self, sensor: Sensor) -> Temperature {
            match sensor {
                Sensor::Cpu => *self.cpu.lock(),
                Sensor::Gpu => *self.gpu.lock(),
            }
        }
    }

    /// Writes a strategy file into `dir` and returns its path
    pub fn write_strategy(dir: &Path, contents: &str) -> PathBuf {
        let path = dir.join("vcool.stg");
        fs::write(&path, contents).unwrap();
        path
    }
}
