//! Hardware abstraction traits

use crate::model::PowerReading;

/// Trait for power monitor sensors
pub trait PowerSensor {
    /// Sample all measurement registers
    fn read(&mut self) -> Result<PowerReading, &'static str>;
}

/// Trait for line-oriented serial inputs
pub trait LineSource {
    /// Read bytes into `buf` until a newline arrives or the bounded wait
    /// runs out. Returns the number of bytes captured, delimiter excluded.
    fn read_line(&mut self, buf: &mut [u8]) -> Result<usize, &'static str>;
}
