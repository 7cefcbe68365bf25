use std::env;

// Wi-Fi credentials and the cloud endpoint are baked in at build time.
// A `.env` file in the project root is the usual place to set them; plain
// environment variables work too. Unset values default to empty so the
// tree still builds on a machine without node configuration.
const CONFIG_KEYS: [&str; 4] = ["WIFI_SSID", "WIFI_PSK", "CLOUD_HOST", "CLOUD_TOKEN"];

fn main() {
    let _ = dotenvy::dotenv();

    for key in CONFIG_KEYS {
        let value = env::var(key).unwrap_or_default();
        println!("cargo:rustc-env={key}={value}");
        println!("cargo:rerun-if-env-changed={key}");
    }
    println!("cargo:rerun-if-changed=.env");
}
