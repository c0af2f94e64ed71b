//! # Runners Example
//!
//! Emits the same event through the three runners to show how handler
//! results are combined:
//! - `Sequence` collects every defined result; `false` halts
//! - `Pipeline` feeds each result into the next handler
//! - per-emission runner override through [`Event::with_runner`]
//!
//! ## Run
//! ```bash
//! cargo run --example pipeline
//! ```

use serde_json::{Value, json};
use sigvisor::{
    CallbackFn, CallbackRef, Emitter, Event, HandlerResult, Invocation, Outcome, Pipeline,
    SyncCallbackFn,
};

fn double() -> CallbackRef {
    SyncCallbackFn::arc("double", |inv: Invocation| {
        Ok(inv.arg(0).and_then(Value::as_i64).map(|n| json!(n * 2)))
    })
}

fn slow_increment() -> CallbackRef {
    CallbackFn::arc("slow_increment", |inv: Invocation| async move {
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        let result: HandlerResult = Ok(inv.arg(0).and_then(Value::as_i64).map(|n| json!(n + 1)));
        result
    })
}

fn guard() -> CallbackRef {
    SyncCallbackFn::arc("guard", |inv: Invocation| {
        let too_big = inv.arg(0).and_then(Value::as_i64).is_some_and(|n| n > 100);
        Ok(too_big.then_some(json!(false)))
    })
}

fn report(label: &str, out: &Outcome) {
    match out {
        Outcome::Completed(args) => println!("[{label}] completed: {args:?}"),
        Outcome::Halted => println!("[{label}] halted"),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), sigvisor::RuntimeError> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let emitter = Emitter::new();
    emitter
        .on("value", double())?
        .on("value", slow_increment())?
        .on("value", guard())?;

    // Sequence: every handler sees the original args.
    let out = emitter.emit("value", vec![json!(10)]).await?;
    report("sequence", &out);

    // Pipeline: 10 → 20 → 21, guard passes the args through.
    let out = emitter
        .emit(Event::new("value").with_runner(Pipeline::arc()), vec![json!(10)])
        .await?;
    report("pipeline", &out);
    println!("[memory] {:?}", emitter.peek("value"));

    // Pipeline halted by the guard: 60 → 120 → 121 > 100.
    let out = emitter
        .emit(Event::new("value").with_runner(Pipeline::arc()), vec![json!(60)])
        .await?;
    report("pipeline", &out);
    println!("[memory] {:?} (unchanged by a halted run)", emitter.peek("value"));

    Ok(())
}
