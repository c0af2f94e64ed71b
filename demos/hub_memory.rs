//! # Hub Memory Example
//!
//! Shows how a component that starts late still receives the last value of
//! a topic it binds with the `memory` feature.
//!
//! ## Run
//! ```bash
//! cargo run --example hub_memory
//! ```

use serde_json::json;
use sigvisor::{CallbackRef, Component, Hub, Invocation, SyncCallbackFn};

fn printer(label: &'static str) -> CallbackRef {
    SyncCallbackFn::arc(label, move |inv: Invocation| {
        println!("[{label}] {} {:?}", inv.ty, inv.args);
        Ok(None)
    })
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), sigvisor::RuntimeError> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let hub = Hub::new();
    hub.publish("window/size", vec![json!(800), json!(600)]).await?;

    let early = Component::builder("early")
        .with_hub(hub.clone())
        .hub("window/size", printer("early"))
        .build()?;
    let late = Component::builder("late")
        .with_hub(hub.clone())
        .hub_memory("window/size", printer("late"))
        .build()?;

    // `early` only sees publications made after it started.
    early.start().await?;
    hub.publish("window/size", vec![json!(1024), json!(768)]).await?;

    // `late` gets the remembered 1024x768 on start, `early` is not called again.
    late.start().await?;
    println!("[peek] {:?}", hub.peek("window/size", vec![]));

    late.stop().await?;
    early.stop().await?;
    Ok(())
}
