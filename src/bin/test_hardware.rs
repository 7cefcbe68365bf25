#![no_std]
#![no_main]

use embassy_executor::Spawner;
use embassy_time::{Duration, Timer};
use esp_backtrace as _;
use esp_hal::timer::timg::TimerGroup;

use fieldnode::hardware::Ina219Hardware;
use fieldnode::logic::{format_power_report, payload_from_line, run_report_cycle, ButtonEdge};
use fieldnode::model::PowerReading;
use fieldnode::traits::PowerSensor;

esp_bootloader_esp_idf::esp_app_desc!();

// Test result tracking
struct TestResults {
    passed: u32,
    failed: u32,
    total: u32,
}

impl TestResults {
    fn new() -> Self {
        Self {
            passed: 0,
            failed: 0,
            total: 0,
        }
    }

    fn assert(&mut self, condition: bool, test_name: &str) {
        self.total += 1;
        if condition {
            self.passed += 1;
            esp_println::println!("  ✓ {}", test_name);
        } else {
            self.failed += 1;
            esp_println::println!("  ✗ {} FAILED", test_name);
        }
    }

    fn assert_eq<T: PartialEq + core::fmt::Debug>(&mut self, left: T, right: T, test_name: &str) {
        self.total += 1;
        if left == right {
            self.passed += 1;
            esp_println::println!("  ✓ {}", test_name);
        } else {
            self.failed += 1;
            esp_println::println!("  ✗ {} FAILED: {:?} != {:?}", test_name, left, right);
        }
    }

    fn assert_close(&mut self, value: f32, expected: f32, tolerance: f32, test_name: &str) {
        self.total += 1;
        if (value - expected).abs() < tolerance {
            self.passed += 1;
            esp_println::println!("  ✓ {}", test_name);
        } else {
            self.failed += 1;
            esp_println::println!(
                "  ✗ {} FAILED: {:.3} not close to {:.3} (tolerance: {:.3})",
                test_name,
                value,
                expected,
                tolerance
            );
        }
    }

    fn print_summary(&self) {
        esp_println::println!("\n==========================================");
        esp_println::println!("Test Summary:");
        esp_println::println!("  Total:  {}", self.total);
        esp_println::println!("  Passed: {}", self.passed);
        esp_println::println!("  Failed: {}", self.failed);
        if self.failed == 0 {
            esp_println::println!("\n✓ ALL TESTS PASSED!");
        } else {
            esp_println::println!("\n✗ SOME TESTS FAILED");
        }
        esp_println::println!("==========================================");
    }
}

/// Canned sensor for exercising the report cycle without hardware.
struct MockPowerSensor {
    reading_count: u32,
}

impl PowerSensor for MockPowerSensor {
    fn read(&mut self) -> Result<PowerReading, &'static str> {
        self.reading_count += 1;
        Ok(PowerReading {
            shunt_mv: 5.0,
            bus_v: 3.3,
            current_ma: 125.0,
            power_mw: 412.5,
        })
    }
}

fn test_button_edge(results: &mut TestResults) {
    esp_println::println!("\n[TEST] Button Edge Detection Tests");

    // Single press fires once
    let mut edge = ButtonEdge::new();
    results.assert(!edge.update(false), "no edge while unpressed");
    results.assert(edge.update(true), "edge fires on HIGH to LOW");

    // Holding the button must not re-trigger
    results.assert(!edge.update(true), "no edge while held (1)");
    results.assert(!edge.update(true), "no edge while held (2)");

    // Release then press fires again
    results.assert(!edge.update(false), "no edge on release");
    results.assert(edge.update(true), "edge fires on second press");

    // Exactly one fire across an arbitrary hold
    let mut edge = ButtonEdge::new();
    let samples = [false, false, true, true, true, false, true, true];
    let fires = samples.iter().filter(|&&low| edge.update(low)).count();
    results.assert_eq(fires, 2, "two presses in sample sequence fire twice");
}

fn test_payload_trimming(results: &mut TestResults) {
    esp_println::println!("\n[TEST] Payload Trimming Tests");

    results.assert_eq(
        payload_from_line(b"  23.5,61.2  "),
        Some("23.5,61.2"),
        "surrounding whitespace trimmed",
    );
    results.assert_eq(
        payload_from_line(b"23.5,61.2\r"),
        Some("23.5,61.2"),
        "CR of a CRLF line trimmed",
    );
    results.assert_eq(payload_from_line(b""), None, "empty line yields no payload");
    results.assert_eq(
        payload_from_line(b"   \t  "),
        None,
        "whitespace-only line yields no payload",
    );
    results.assert_eq(
        payload_from_line(&[0xFF, 0xFE]),
        None,
        "non-UTF8 bytes yield no payload",
    );
}

fn test_power_report(results: &mut TestResults) {
    esp_println::println!("\n[TEST] Power Report Tests");

    let reading = PowerReading {
        shunt_mv: 5.0,
        bus_v: 3.3,
        current_ma: 125.0,
        power_mw: 412.5,
    };

    results.assert_close(reading.load_voltage_v(), 3.305, 0.0005, "load voltage derivation");

    let report = format_power_report(&reading);
    results.assert(report.contains("Bus (V-):       3.300"), "bus line formatted");
    results.assert(
        report.contains("Load Voltage:   3.305"),
        "load voltage printed with three decimals",
    );
    results.assert(
        report.contains("Current (mA):   125.000"),
        "current line formatted",
    );
    results.assert(
        report.contains("Power (mW):     412.500"),
        "power line formatted",
    );
    results.assert(
        report.contains("-----------------------------"),
        "separator line present",
    );

    // Rounding, not truncation
    let reading = PowerReading {
        shunt_mv: 0.0,
        bus_v: 0.0,
        current_ma: 12.3456,
        power_mw: 0.0,
    };
    let report = format_power_report(&reading);
    results.assert(report.contains("12.346"), "three-decimal rounding");
}

fn test_report_cycle(results: &mut TestResults) {
    esp_println::println!("\n[TEST] Report Cycle Tests");

    let mut sensor = MockPowerSensor { reading_count: 0 };
    let mut out = heapless::String::<256>::new();

    results.assert(
        run_report_cycle(&mut sensor, &mut out).is_ok(),
        "report cycle succeeds",
    );
    results.assert_eq(sensor.reading_count, 1, "one read per cycle");
    results.assert(out.contains("Load Voltage:   3.305"), "cycle output formatted");

    // A second cycle is a fresh sample, not a cached one
    let mut out = heapless::String::<256>::new();
    let _ = run_report_cycle(&mut sensor, &mut out);
    results.assert_eq(sensor.reading_count, 2, "second cycle samples again");
}

async fn test_ina219_sensor<SDA, SCL>(
    results: &mut TestResults,
    i2c0: esp_hal::peripherals::I2C0<'static>,
    sda: SDA,
    scl: SCL,
) where
    SDA: Into<esp_hal::gpio::AnyPin<'static>>,
    SCL: Into<esp_hal::gpio::AnyPin<'static>>,
{
    esp_println::println!("\n[TEST] INA219 Sensor Tests");

    let mut ina219 = Ina219Hardware::new(i2c0, sda, scl);

    match ina219.init() {
        Ok(_) => {
            results.assert(true, "INA219 initialization");

            results.assert(
                ina219.set_calibration_16v_400ma().is_ok(),
                "16V/400mA calibration applied",
            );

            match ina219.read_config() {
                Ok(config) => results.assert_eq(config, 0x019F, "config register matches profile"),
                Err(_) => results.assert(false, "read config register"),
            }

            let config_before = ina219.read_config().ok();

            // A burst of reads should stay plausible for a 16V/400mA setup
            esp_println::println!("  Reading power samples (5 bursts)...");
            let mut ok_reads = 0;
            for i in 0..5 {
                Timer::after(Duration::from_millis(100)).await;
                match ina219.read() {
                    Ok(reading) => {
                        esp_println::println!(
                            "    Sample {}: bus={:.3}V load={:.3}V current={:.3}mA power={:.3}mW",
                            i + 1,
                            reading.bus_v,
                            reading.load_voltage_v(),
                            reading.current_ma,
                            reading.power_mw
                        );
                        results.assert(
                            reading.bus_v >= 0.0 && reading.bus_v < 16.0,
                            "bus voltage in range",
                        );
                        results.assert(
                            reading.current_ma.abs() <= 400.0,
                            "current within calibration range",
                        );
                        ok_reads += 1;
                    }
                    Err(e) => {
                        esp_println::println!("    Read failed: {}", e);
                    }
                }
            }
            results.assert_eq(ok_reads, 5, "collected 5 power samples");

            // Reading must not mutate calibration or configuration
            let config_after = ina219.read_config().ok();
            results.assert_eq(config_before, config_after, "reads leave config untouched");
        }
        Err(e) => {
            esp_println::println!("  Failed to initialize INA219: {}", e);
            results.assert(false, "INA219 initialization");
        }
    }
}

#[esp_rtos::main]
async fn main(_spawner: Spawner) {
    esp_println::logger::init_logger_from_env();
    let peripherals = esp_hal::init(esp_hal::Config::default());

    esp_println::println!("\n==========================================");
    esp_println::println!("=== Hardware Unit Test Runner ===");
    esp_println::println!("==========================================");

    let mut results = TestResults::new();

    // Run tests that don't need hardware
    test_button_edge(&mut results);
    test_payload_trimming(&mut results);
    test_power_report(&mut results);
    test_report_cycle(&mut results);

    // Extract the peripherals we need before initializing RTOS timer
    let i2c0 = peripherals.I2C0;
    let gpio8 = peripherals.GPIO8;
    let gpio9 = peripherals.GPIO9;

    // Initialize RTOS timer for embassy (this consumes TIMG0)
    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    // Run hardware tests
    test_ina219_sensor(&mut results, i2c0, gpio8, gpio9).await;

    // Print summary
    results.print_summary();

    esp_println::println!("\nTest run complete. Looping...");
    loop {
        if results.failed == 0 {
            Timer::after(Duration::from_millis(200)).await;
        } else {
            Timer::after(Duration::from_millis(1000)).await;
        }
    }
}
