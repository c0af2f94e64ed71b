//! # Lifecycle Example
//!
//! Walks a component through its phases and shows:
//! - the order of lifecycle signals and binding wiring
//! - a plumbing veto on `sig/add` (returning `false`)
//! - a custom signal and a one-shot local handler
//!
//! ## Run
//! ```bash
//! RUST_LOG=sigvisor=debug cargo run --example lifecycle
//! ```

use serde_json::{Value, json};
use sigvisor::{CallbackRef, Component, Invocation, SyncCallbackFn};

fn trace(label: &'static str) -> CallbackRef {
    SyncCallbackFn::arc(label, move |inv: Invocation| {
        println!("[{label}] {} args={:?}", inv.ty, inv.args);
        Ok(None)
    })
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), sigvisor::RuntimeError> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Refuse any local handler for "secret".
    let veto: CallbackRef = SyncCallbackFn::arc("veto", |inv: Invocation| {
        let secret = inv.arg(0).and_then(Value::as_str) == Some("on/secret");
        Ok(secret.then_some(json!(false)))
    });

    let widget = Component::builder("widget")
        .sig("initialize", trace("initialize"))
        .sig("start", trace("start"))
        .sig("stop", trace("stop"))
        .sig("finalize", trace("finalize"))
        .sig("add", veto)
        .sig("refresh", trace("refresh"))
        .on("resize", trace("resize"))
        .build()?;

    println!("phase: {}", widget.phase());
    widget.start().await?;
    println!("phase: {}", widget.phase());

    widget.emit("on/resize", vec![json!(640), json!(480)]).await?;
    widget.signal("refresh", vec![json!("manual")]).await?;

    let once = widget.one("on/ping", trace("ping"))?;
    println!("one/ping registered: {}", once.is_some());
    widget.emit("on/ping", vec![]).await?;
    widget.emit("on/ping", vec![]).await?;

    let vetoed = widget.on("on/secret", trace("secret"))?;
    println!("on/secret registered: {}", vetoed.is_some());

    widget.stop().await?;
    println!("phase: {}", widget.phase());
    Ok(())
}
