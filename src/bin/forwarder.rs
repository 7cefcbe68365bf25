#![no_std]
#![no_main]

use embassy_executor::Spawner;
use embassy_time::{Duration, Timer};
use esp_backtrace as _;
use esp_hal::{
    gpio::{Input, InputConfig, Pull},
    timer::timg::TimerGroup,
};

use fieldnode::{
    cloud::CloudChannel,
    hardware::UartLink,
    logic::{payload_from_line, ButtonEdge},
    traits::LineSource,
    wifi,
};

const NODE_NAME: &str = "node-3";
const EVENT_NAME: &str = "send_data";

// Let the peer device and the host link settle before polling starts
const STARTUP_DELAY_MS: u64 = 3_000;
const DEBOUNCE_MS: u64 = 50;

esp_bootloader_esp_idf::esp_app_desc!();

macro_rules! mk_static {
    ($t:ty,$val:expr) => {{
        static STATIC_CELL: static_cell::StaticCell<$t> = static_cell::StaticCell::new();
        #[deny(unused_attributes)]
        let x = STATIC_CELL.uninit().write(($val));
        x
    }};
}

#[esp_rtos::main]
async fn main(spawner: Spawner) {
    esp_println::logger::init_logger_from_env();
    let peripherals = esp_hal::init(esp_hal::Config::default());

    esp_println::println!("=== Fieldnode Forwarder ({}) ===", NODE_NAME);

    // The radio needs a heap
    esp_alloc::heap_allocator!(size: 96 * 1024);

    // Initialize RTOS timer for embassy
    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    let radio_controller = mk_static!(
        esp_radio::Controller<'static>,
        esp_radio::init().expect("Failed to initialize radio controller")
    );

    let stack = wifi::start(spawner, peripherals.WIFI, radio_controller).await;
    wifi::wait_for_network(stack).await;

    let mut cloud = CloudChannel::new(stack);

    // Button active LOW
    let config = InputConfig::default().with_pull(Pull::Up);
    let button = Input::new(peripherals.GPIO12, config);

    // UART from the peer sensor board
    let mut link = UartLink::new(peripherals.UART1, peripherals.GPIO17, peripherals.GPIO18);

    Timer::after(Duration::from_millis(STARTUP_DELAY_MS)).await;
    esp_println::println!("Ready to forward peer sensor data on button press");

    let mut edge = ButtonEdge::new();
    let mut line_buf = [0u8; 128];

    loop {
        if edge.update(button.is_low()) {
            // Button pressed -> grab latest UART payload
            match link.read_line(&mut line_buf) {
                Ok(len) => match payload_from_line(&line_buf[..len]) {
                    Some(payload) => {
                        match cloud.publish(EVENT_NAME, payload, true).await {
                            Ok(()) => {
                                esp_println::println!("Published (button press): {}", payload)
                            }
                            Err(e) => esp_println::println!("[CLOUD] Publish failed: {}", e),
                        }
                    }
                    None => {
                        esp_println::println!("Button pressed, but no UART data available")
                    }
                },
                Err(e) => esp_println::println!("[UART] Read error: {}", e),
            }
        }

        Timer::after(Duration::from_millis(DEBOUNCE_MS)).await; // Debounce
    }
}
