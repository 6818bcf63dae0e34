//! Survey converter web interface.

mod error;
mod logging;
mod server;
mod session;

use crate::logging::{LogConfig, init_logging};
use crate::server::AppState;

const BIND_ADDR: &str = "127.0.0.1:8787";

#[tokio::main]
async fn main() {
    init_logging(&LogConfig::default());

    if let Err(error) = server::run(AppState::new(), BIND_ADDR).await {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}
