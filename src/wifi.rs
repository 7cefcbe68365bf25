//! Wi-Fi station bring-up for the cloud-connected binaries.

use embassy_executor::Spawner;
use embassy_net::{Runner, Stack, StackResources};
use embassy_time::{Duration, Timer};
use esp_hal::rng::Rng;
use esp_radio::wifi::{
    ClientConfig, ModeConfig, WifiController, WifiDevice, WifiEvent, WifiStaState,
};

macro_rules! mk_static {
    ($t:ty,$val:expr) => {{
        static STATIC_CELL: static_cell::StaticCell<$t> = static_cell::StaticCell::new();
        #[deny(unused_attributes)]
        let x = STATIC_CELL.uninit().write(($val));
        x
    }};
}

const WIFI_SSID: &str = env!("WIFI_SSID");
const WIFI_PSK: &str = env!("WIFI_PSK");

const RECONNECT_DELAY_MS: u64 = 5_000;

/// Start the Wi-Fi station and the network stack. Returns the stack handle;
/// the connection itself is supervised by a background task.
pub async fn start(
    spawner: Spawner,
    device: esp_hal::peripherals::WIFI<'static>,
    radio_controller: &'static esp_radio::Controller<'static>,
) -> Stack<'static> {
    let (wifi_controller, wifi_interfaces) =
        esp_radio::wifi::new(radio_controller, device, Default::default())
            .expect("Failed to initialize Wi-Fi controller");

    let dhcp_config = embassy_net::Config::dhcpv4(Default::default());

    let rng = Rng::new();

    let (net_stack, net_runner) = embassy_net::new(
        wifi_interfaces.sta,
        dhcp_config,
        mk_static!(StackResources<3>, StackResources::<3>::new()),
        (rng.random() as u64) << 32 | rng.random() as u64,
    );

    spawner.spawn(wifi_connection_task(wifi_controller)).ok();
    spawner.spawn(net_task(net_runner)).ok();

    net_stack
}

/// Block until the link is up and DHCP has handed out an address.
pub async fn wait_for_network(stack: Stack<'static>) {
    stack.wait_link_up().await;
    stack.wait_config_up().await;

    if let Some(config) = stack.config_v4() {
        esp_println::println!("[WIFI] Got IP: {}", config.address);
    }
}

#[embassy_executor::task]
async fn wifi_connection_task(mut controller: WifiController<'static>) {
    loop {
        if esp_radio::wifi::sta_state() == WifiStaState::Connected {
            // wait until we're no longer connected
            controller.wait_for_event(WifiEvent::StaDisconnected).await;
            Timer::after(Duration::from_millis(RECONNECT_DELAY_MS)).await
        }
        if !matches!(controller.is_started(), Ok(true)) {
            let station_config = ModeConfig::Client(
                ClientConfig::default()
                    .with_ssid(WIFI_SSID.into())
                    .with_password(WIFI_PSK.into()),
            );
            controller.set_config(&station_config).unwrap();
            esp_println::println!("[WIFI] Starting controller");
            controller.start_async().await.unwrap();
        }

        match controller.connect_async().await {
            Ok(_) => esp_println::println!("[WIFI] Connected to {}", WIFI_SSID),
            Err(e) => {
                esp_println::println!("[WIFI] Failed to connect: {:?}", e);
                Timer::after(Duration::from_millis(RECONNECT_DELAY_MS)).await
            }
        }
    }
}

#[embassy_executor::task]
async fn net_task(mut runner: Runner<'static, WifiDevice<'static>>) {
    runner.run().await
}
