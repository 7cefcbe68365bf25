//! I2C bus bring-up diagnostic.
//!
//! Walks every 7-bit address on the sensor bus and reports which ones
//! answer. Used when wiring up the power monitor: the INA219 with its
//! address pins grounded must show up at 0x40.
//!
//! Following pins are used:
//! - SDA => GPIO8
//! - SCL => GPIO9

#![no_std]
#![no_main]

use embassy_executor::Spawner;
use embassy_time::{Duration, Timer};
use esp_backtrace as _;
use esp_hal::{
    i2c::master::{Config, I2c},
    time::Rate,
    timer::timg::TimerGroup,
};

const INA219_ADDRESS: u8 = 0x40;

esp_bootloader_esp_idf::esp_app_desc!();

#[esp_rtos::main]
async fn main(_spawner: Spawner) {
    let peripherals = esp_hal::init(esp_hal::Config::default());
    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    let mut i2c0 = I2c::new(
        peripherals.I2C0,
        Config::default().with_frequency(Rate::from_khz(100)),
    )
    .unwrap()
    .with_sda(peripherals.GPIO8)
    .with_scl(peripherals.GPIO9)
    .into_async();

    esp_println::println!("I2C scan start");
    let mut found = heapless::Vec::<u8, 16>::new();
    for address in 0x03..0x78 {
        let mut buf = [0u8; 1];
        if i2c0.write_read_async(address, &[], &mut buf).await.is_ok() {
            esp_println::println!("Found device at address 0x{:02X}", address);
            let _ = found.push(address);
        }
    }
    esp_println::println!("I2C scan done, {} device(s) found", found.len());

    if found.contains(&INA219_ADDRESS) {
        esp_println::println!("INA219 answering at 0x{:02X}", INA219_ADDRESS);
    } else {
        esp_println::println!(
            "No response at 0x{:02X} - check the INA219 wiring and address pins",
            INA219_ADDRESS
        );
    }

    loop {
        Timer::after(Duration::from_millis(100)).await;
    }
}
