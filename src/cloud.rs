//! Event publishing to the cloud webhook endpoint.
//!
//! Each publish is one short-lived TCP connection carrying a single HTTP
//! POST. The response is not consumed; delivery is fire-and-forget and the
//! caller only learns whether the request went out.

use core::fmt::Write as _;

use embassy_net::dns::DnsQueryType;
use embassy_net::tcp::TcpSocket;
use embassy_net::Stack;
use embassy_time::Duration;
use embedded_io_async::Write;

const CLOUD_HOST: &str = env!("CLOUD_HOST");
const CLOUD_TOKEN: &str = env!("CLOUD_TOKEN");
const CLOUD_PORT: u16 = 80;

const SOCKET_TIMEOUT_SECS: u64 = 10;

pub struct CloudChannel {
    stack: Stack<'static>,
}

impl CloudChannel {
    pub fn new(stack: Stack<'static>) -> Self {
        Self { stack }
    }

    /// Publish one named event with a text payload.
    pub async fn publish(
        &mut self,
        name: &str,
        data: &str,
        private: bool,
    ) -> Result<(), &'static str> {
        let addrs = self
            .stack
            .dns_query(CLOUD_HOST, DnsQueryType::A)
            .await
            .map_err(|_| "dns lookup failed")?;
        let addr = *addrs.first().ok_or("host has no address")?;

        let mut rx_buffer = [0u8; 1024];
        let mut tx_buffer = [0u8; 1024];
        let mut socket = TcpSocket::new(self.stack, &mut rx_buffer, &mut tx_buffer);
        socket.set_timeout(Some(Duration::from_secs(SOCKET_TIMEOUT_SECS)));

        socket
            .connect((addr, CLOUD_PORT))
            .await
            .map_err(|_| "connect failed")?;

        let mut body = heapless::String::<256>::new();
        write!(body, "name={}&data={}&private={}", name, data, private)
            .map_err(|_| "payload too long")?;

        let mut request = heapless::String::<512>::new();
        write!(
            request,
            "POST /v1/events HTTP/1.1\r\n\
             Host: {}\r\n\
             Authorization: Bearer {}\r\n\
             Content-Type: application/x-www-form-urlencoded\r\n\
             Content-Length: {}\r\n\
             Connection: close\r\n\
             \r\n\
             {}",
            CLOUD_HOST,
            CLOUD_TOKEN,
            body.len(),
            body
        )
        .map_err(|_| "request too long")?;

        socket
            .write_all(request.as_bytes())
            .await
            .map_err(|_| "send failed")?;
        socket.flush().await.map_err(|_| "send failed")?;
        socket.close();

        Ok(())
    }
}
