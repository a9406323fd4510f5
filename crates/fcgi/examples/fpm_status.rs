//! Prints the php-fpm status page.
//!
//! php-fpm must expose it with `pm.status_path = /status`.
//!
//! ```text
//! cargo run --example fpm_status -- 127.0.0.1:9000
//! ```

use micro_fcgi::connection::{ClientConfig, FcgiClient};
use tokio::net::TcpStream;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

const DEFAULT_ADDRESS: &str = "127.0.0.1:9000";

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::DEBUG).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let address = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_ADDRESS.to_string());

    info!(%address, "connecting to php-fpm");
    let tcp_stream = match TcpStream::connect(&address).await {
        Ok(tcp_stream) => tcp_stream,
        Err(e) => {
            error!(cause = %e, "connect php-fpm error");
            return;
        }
    };

    let (reader, writer) = tcp_stream.into_split();
    let config = ClientConfig { keep_conn: true, ..ClientConfig::default() };
    let mut client = FcgiClient::with_config(reader, writer, config);

    match client.get_values(["FCGI_MAX_CONNS", "FCGI_MAX_REQS", "FCGI_MPXS_CONNS"]).await {
        Ok(values) => {
            for (name, value) in &values {
                info!(name, value, "management variable");
            }
        }
        Err(e) => warn!(cause = %e, "get values failed"),
    }

    let params = [
        ("GATEWAY_INTERFACE", "FastCGI/1.0"),
        ("REQUEST_METHOD", "GET"),
        ("SCRIPT_NAME", "/status"),
        ("SCRIPT_FILENAME", "/status"),
        ("QUERY_STRING", "full"),
        ("SERVER_SOFTWARE", "micro-fcgi"),
    ];

    let response = match client.request(params, b"").await {
        Ok(response) => response,
        Err(e) => {
            error!(cause = %e, "status request failed");
            return;
        }
    };

    info!(app_status = response.app_status(), protocol_status = ?response.protocol_status(), "status request finished");
    let (stdout, stderr) = response.into_parts();
    if !stderr.is_empty() {
        warn!(stderr = %String::from_utf8_lossy(&stderr), "php-fpm reported errors");
    }
    println!("{}", String::from_utf8_lossy(&stdout));

    if let Err(e) = client.close().await {
        warn!(cause = %e, "close connection error");
    }
}
