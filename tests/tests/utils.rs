use serde_json::{json, Value};
use stampede::prelude::*;
use std::net::SocketAddr;
use std::sync::OnceLock;
use tracing::{error, Level};
use tracing_subscriber::FmtSubscriber;

/// Log to stdout once per test binary. Tests using `traced_test` skip this.
#[allow(unused)]
pub fn init() {
    static ONCE_LOCK: OnceLock<()> = OnceLock::new();

    ONCE_LOCK.get_or_init(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            default_panic(info);
            error!("Panic occurred: {info:?}");
        }));

        let _ = FmtSubscriber::builder()
            .with_max_level(Level::DEBUG)
            .with_env_filter("stampede=debug,mock_service=info")
            .try_init();
    });
}

/// Mock inference server on an ephemeral port, living as long as the test runtime.
#[allow(unused)]
pub async fn server() -> SocketAddr {
    mock_service::spawn().await.unwrap()
}

#[allow(unused)]
pub fn endpoint(addr: SocketAddr, path: &str) -> Endpoint {
    Endpoint::new(&addr.ip().to_string(), addr.port()).path(path)
}

#[allow(unused)]
pub fn chat(model: &str) -> Value {
    json!({
        "model": model,
        "messages": [{"role": "user", "content": "Why is the sky blue?"}],
        "stream": false,
    })
}
