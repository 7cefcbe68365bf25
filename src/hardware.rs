use esp_hal::gpio::AnyPin;
use esp_hal::{
    delay::Delay,
    i2c::master::{Config as I2cConfig, I2c},
    peripherals::{I2C0, UART1},
    time::Rate,
    uart::{Config as UartConfig, Uart},
};

use crate::model::PowerReading;
use crate::traits::{LineSource, PowerSensor};

const INA219_ADDRESS: u8 = 0x40;

// Config register value after power-on reset, used to confirm the chip is there.
const INA219_POR_CONFIG: u16 = 0x399F;

#[derive(Debug, Clone, Copy)]
struct Calibration {
    cal_value: u16,
    current_divider_ma: f32,
    power_multiplier_mw: f32,
}

pub struct Ina219Hardware<'a> {
    i2c: I2c<'a, esp_hal::Blocking>,
    calibration: Option<Calibration>,
    address: u8,
}

impl<'a> Ina219Hardware<'a> {
    pub fn new<SDA, SCL>(i2c_periph: I2C0<'a>, sda: SDA, scl: SCL) -> Self
    where
        SDA: Into<AnyPin<'a>>,
        SCL: Into<AnyPin<'a>>,
    {
        let i2c = I2c::new(
            i2c_periph,
            I2cConfig::default().with_frequency(Rate::from_khz(100)),
        )
        .unwrap()
        .with_sda(sda.into())
        .with_scl(scl.into());

        Self {
            i2c,
            calibration: None,
            address: INA219_ADDRESS,
        }
    }

    fn write_register(&mut self, reg: u8, value: u16) -> Result<(), &'static str> {
        let bytes = value.to_be_bytes();
        self.i2c
            .write(self.address, &[reg, bytes[0], bytes[1]])
            .map_err(|_| "i2c write failed")
    }

    fn read_register(&mut self, reg: u8) -> Result<u16, &'static str> {
        let mut buf = [0u8; 2];
        self.i2c
            .write_read(self.address, &[reg], &mut buf)
            .map_err(|_| "i2c read failed")?;
        Ok(u16::from_be_bytes(buf))
    }

    pub fn read_config(&mut self) -> Result<u16, &'static str> {
        self.read_register(0x00)
    }

    pub fn init(&mut self) -> Result<(), &'static str> {
        let delay = Delay::new();

        // Soft reset (RST bit of the config register)
        self.write_register(0x00, 0x8000)
            .map_err(|_| "Failed to reset sensor")?;

        delay.delay_millis(1);

        // After reset the chip must answer with its power-on configuration
        let config = self.read_config()?;
        esp_println::println!("[INA219] Config after reset: 0x{:04X}", config);
        if config != INA219_POR_CONFIG {
            return Err("Unexpected config register value");
        }

        Ok(())
    }

    /// Finer calibration for low-voltage, low-current systems: 16 V full
    /// scale, 400 mA max expected current, 50 uA current LSB.
    pub fn set_calibration_16v_400ma(&mut self) -> Result<(), &'static str> {
        let calibration = Calibration {
            cal_value: 8192,
            current_divider_ma: 20.0, // raw counts per mA
            power_multiplier_mw: 1.0, // mW per raw count
        };

        // Calibration register must be set before the first current read
        self.write_register(0x05, calibration.cal_value)
            .map_err(|_| "Failed to write calibration register")?;

        // Config: 16V bus range, gain /1 (40mV), 12-bit ADCs,
        // shunt and bus continuous (0x019F)
        self.write_register(0x00, 0x019F)
            .map_err(|_| "Failed to configure sensor")?;

        self.calibration = Some(calibration);

        Ok(())
    }

    /// Shunt voltage in millivolts, 10 uV per bit, signed.
    pub fn read_shunt_voltage_mv(&mut self) -> Result<f32, &'static str> {
        let raw = self.read_register(0x01)? as i16;
        Ok(raw as f32 * 0.01)
    }

    /// Bus voltage in volts. The register keeps flag bits in the low three
    /// bits; the value field is 4 mV per bit.
    pub fn read_bus_voltage_v(&mut self) -> Result<f32, &'static str> {
        let raw = self.read_register(0x02)?;
        Ok((raw >> 3) as f32 * 0.004)
    }

    /// Current in milliamps, scaled by the active calibration, signed.
    pub fn read_current_ma(&mut self) -> Result<f32, &'static str> {
        let calibration = self.calibration.ok_or("Sensor not calibrated")?;
        let raw = self.read_register(0x04)? as i16;
        Ok(raw as f32 / calibration.current_divider_ma)
    }

    /// Power in milliwatts, scaled by the active calibration.
    pub fn read_power_mw(&mut self) -> Result<f32, &'static str> {
        let calibration = self.calibration.ok_or("Sensor not calibrated")?;
        let raw = self.read_register(0x03)?;
        Ok(raw as f32 * calibration.power_multiplier_mw)
    }
}

impl PowerSensor for Ina219Hardware<'_> {
    fn read(&mut self) -> Result<PowerReading, &'static str> {
        let shunt_mv = self.read_shunt_voltage_mv()?;
        let bus_v = self.read_bus_voltage_v()?;
        let current_ma = self.read_current_ma()?;
        let power_mw = self.read_power_mw()?;

        Ok(PowerReading {
            shunt_mv,
            bus_v,
            current_ma,
            power_mw,
        })
    }
}

const PEER_BAUD: u32 = 9600;

// Longest wait for one line and the poll interval inside it. The peer
// pushes a reading every couple of seconds, so half a second is plenty.
const LINE_WAIT_MS: u32 = 500;
const LINE_POLL_MS: u32 = 10;

/// Serial link to the peer device that emits newline-terminated readings.
pub struct UartLink<'a> {
    uart: Uart<'a, esp_hal::Blocking>,
}

impl<'a> UartLink<'a> {
    pub fn new<TX, RX>(uart_periph: UART1<'a>, tx: TX, rx: RX) -> Self
    where
        TX: Into<AnyPin<'a>>,
        RX: Into<AnyPin<'a>>,
    {
        let uart = Uart::new(
            uart_periph,
            UartConfig::default().with_baudrate(PEER_BAUD),
        )
        .unwrap()
        .with_tx(tx.into())
        .with_rx(rx.into());

        Self { uart }
    }
}

impl LineSource for UartLink<'_> {
    fn read_line(&mut self, buf: &mut [u8]) -> Result<usize, &'static str> {
        let delay = Delay::new();
        let timeout_cycles = LINE_WAIT_MS / LINE_POLL_MS;
        let mut filled = 0;

        for _ in 0..=timeout_cycles {
            let mut byte = [0u8; 1];
            loop {
                match self.uart.read_buffered(&mut byte) {
                    Ok(0) => break,
                    Ok(_) => {
                        if byte[0] == b'\n' {
                            return Ok(filled);
                        }
                        // An oversized line is truncated to the buffer
                        if filled < buf.len() {
                            buf[filled] = byte[0];
                            filled += 1;
                        }
                    }
                    Err(_) => return Err("uart read failed"),
                }
            }
            delay.delay_millis(LINE_POLL_MS);
        }

        // Wait exhausted without a terminator; hand back what arrived
        Ok(filled)
    }
}
