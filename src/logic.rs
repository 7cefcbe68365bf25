//! Business logic layer (hardware-independent)

use crate::model::PowerReading;
use crate::traits::PowerSensor;
use core::fmt::Write;

/// Edge detector for an active-low push button.
///
/// Holds the previous pin sample so a press (HIGH -> LOW transition) fires
/// exactly once, no matter how long the button is held.
pub struct ButtonEdge {
    last_low: bool,
}

impl ButtonEdge {
    /// An unpressed button reads HIGH through the pull-up.
    pub fn new() -> Self {
        Self { last_low: false }
    }

    /// Feed one pin sample; returns true exactly on the HIGH -> LOW edge.
    pub fn update(&mut self, is_low: bool) -> bool {
        let pressed = !self.last_low && is_low;
        self.last_low = is_low;
        pressed
    }
}

/// Turn a captured serial line into a publishable payload.
///
/// Surrounding whitespace (including the CR of a CRLF terminator) is
/// stripped. Returns `None` for an empty or whitespace-only line, and for
/// bytes that are not valid UTF-8.
pub fn payload_from_line(line: &[u8]) -> Option<&str> {
    let text = core::str::from_utf8(line).ok()?;
    let trimmed = text.trim();
    if trimmed.is_empty() { None } else { Some(trimmed) }
}

/// Format one report block: four labeled values and a separator line.
pub fn format_power_report(reading: &PowerReading) -> heapless::String<160> {
    let mut out = heapless::String::new();
    let _ = writeln!(out, "Bus (V-):       {:.3}", reading.bus_v);
    let _ = writeln!(out, "Load Voltage:   {:.3}", reading.load_voltage_v());
    let _ = writeln!(out, "Current (mA):   {:.3}", reading.current_ma);
    let _ = writeln!(out, "Power (mW):     {:.3}", reading.power_mw);
    let _ = write!(out, "-----------------------------");
    out
}

/// Sample the sensor once and print a full report block to `out`.
pub fn run_report_cycle<S: PowerSensor, W: Write>(
    sensor: &mut S,
    out: &mut W,
) -> Result<(), &'static str> {
    let reading = sensor.read()?;
    writeln!(out, "{}", format_power_report(&reading)).map_err(|_| "console write failed")?;
    Ok(())
}
