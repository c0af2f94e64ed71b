//! # Application Example
//!
//! Two components talking through the application hub. The `clock` publishes
//! ticks from a background task; the `display` prints them. `LogWriter`
//! forwards `log/<level>` publications to `tracing`.
//!
//! Press Ctrl-C to stop; components are stopped in reverse start order.
//!
//! ## Run
//! ```bash
//! RUST_LOG=info cargo run --example application --features logging
//! ```

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use sigvisor::{Application, CallbackRef, Config, Invocation, SyncCallbackFn};

#[tokio::main]
async fn main() -> Result<(), sigvisor::RuntimeError> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut cfg = Config::default();
    cfg.grace = Duration::from_secs(5);
    let app = Arc::new(Application::builder(cfg).build());

    let show: CallbackRef = SyncCallbackFn::arc("show", |inv: Invocation| {
        println!("[display] tick {:?}", inv.arg(0));
        Ok(None)
    });
    let display = app.component("display").hub_memory("clock/tick", show).build()?;
    let clock = app.component("clock").build()?;

    let ticker = {
        let hub = app.hub().clone();
        let token = app.shutdown_token();
        tokio::spawn(async move {
            let mut n = 0u64;
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = tokio::time::sleep(Duration::from_millis(500)) => {}
                }
                n += 1;
                if let Err(err) = hub.publish("clock/tick", vec![json!(n)]).await {
                    let _ = hub.publish("log/error", vec![json!(err.to_string())]).await;
                }
                if n % 4 == 0 {
                    let _ = hub.publish("log/info", vec![json!("clock"), json!(n)]).await;
                }
            }
        })
    };

    let stopper = {
        let app = Arc::clone(&app);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            app.shutdown();
        })
    };

    app.run(vec![clock, display]).await?;
    let _ = ticker.await;
    stopper.abort();
    Ok(())
}
