#![no_std]
#![no_main]

use embassy_executor::Spawner;
use embassy_time::{Duration, Timer};
use esp_backtrace as _;
use esp_hal::timer::timg::TimerGroup;

use fieldnode::{hardware::Ina219Hardware, logic::run_report_cycle};

const REPORT_INTERVAL_MS: u64 = 1_000;

esp_bootloader_esp_idf::esp_app_desc!();

#[esp_rtos::main]
async fn main(_spawner: Spawner) {
    esp_println::logger::init_logger_from_env();
    let peripherals = esp_hal::init(esp_hal::Config::default());

    esp_println::println!("=== Fieldnode Power Monitor ===");

    // Initialize RTOS timer for embassy
    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    // Let the console settle before the first real line goes out
    Timer::after(Duration::from_millis(100)).await;

    // INA219 on I2C0, SDA GPIO8 / SCL GPIO9
    let mut ina219 = Ina219Hardware::new(peripherals.I2C0, peripherals.GPIO8, peripherals.GPIO9);

    if let Err(e) = ina219.init() {
        esp_println::println!("[ERROR] Failed to find INA219 chip: {}", e);
        // No recovery path without a hardware reset
        loop {
            Timer::after(Duration::from_secs(1)).await;
        }
    }

    if let Err(e) = ina219.set_calibration_16v_400ma() {
        esp_println::println!("[ERROR] INA219 calibration failed: {}", e);
        loop {
            Timer::after(Duration::from_secs(1)).await;
        }
    }

    esp_println::println!("INA219 sensor ready with 16V/400mA calibration");

    loop {
        if let Err(e) = run_report_cycle(&mut ina219, &mut esp_println::Printer) {
            esp_println::println!("[INA219] Read error: {}", e);
        }

        Timer::after(Duration::from_millis(REPORT_INTERVAL_MS)).await;
    }
}
