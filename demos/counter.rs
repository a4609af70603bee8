//! A counter "app" with two views sharing one store.
//!
//! Run with `RUST_LOG=globstate=debug` to see the dispatch log.

use globstate::{create_store_with_enhancer, enhancer, Snapshot};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
enum Action {
    Increment,
    Decrement,
    SetStep(i64),
}

type State = Arc<Snapshot<&'static str, i64>>;

fn reducer(state: &State, action: &Action) -> State {
    let count = state.get(&"count").copied().unwrap_or_default();
    let step = state.get(&"step").copied().unwrap_or(1);
    let next = match action {
        Action::Increment => state.with(&"count", count + step),
        Action::Decrement => state.with(&"count", count - step),
        Action::SetStep(step) => state.with(&"step", *step),
    };
    next.unwrap_or_else(|_| Arc::clone(state))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let store = create_store_with_enhancer(
        reducer,
        [("count", 0), ("step", 1)],
        enhancer::logging("counter"),
    );

    let hooks = store.state_item_hooks();
    let counter_view = hooks.use_hook_with(&"count", |count| {
        println!("[counter view] count = {count}");
    })?;
    let _step_view = hooks.use_hook_with(&"step", |step| {
        println!("[step view] step = {step}");
    })?;

    store.dispatch(&Action::Increment)?;
    store.dispatch(&Action::Increment)?;
    store.dispatch(&Action::SetStep(5))?;
    store.dispatch(&Action::Decrement)?;

    // Writing through a hook bypasses the reducer.
    counter_view.updater().set(100)?;

    println!("final state: {:?}", store.get_state());
    println!("actions dispatched: {}", store.dispatched());
    Ok(())
}
