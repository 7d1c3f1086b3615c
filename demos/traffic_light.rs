//! Traffic light cycling on declarative timeouts.
//!
//! Run with: cargo run --example traffic_light

use hfsm::builder::{DefinitionBuilder, StateBuilder, TransitionBuilder};
use hfsm::state_ids;
use std::time::Duration;

state_ids! {
    RED = "red";
    GREEN = "green";
    YELLOW = "yellow";
    FLASHING = "flashing";
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .finish();

    let definition = DefinitionBuilder::<()>::new()
        .state(StateBuilder::normal(RED).timeout_transition(Duration::from_millis(300), GREEN))
        .state(StateBuilder::normal(GREEN).timeout_transition(Duration::from_millis(300), YELLOW))
        .state(StateBuilder::normal(YELLOW).timeout_transition(Duration::from_millis(100), RED))
        .state(StateBuilder::normal(FLASHING))
        .transition(TransitionBuilder::any("fault", FLASHING))
        .transition(TransitionBuilder::new(FLASHING, "repaired", RED))
        .initial(RED)
        .build()?;

    let machine = definition
        .machine(())
        .logger(subscriber)
        .on_state_change(|from, to| println!("{from} -> {to}"))
        .build()?;
    machine.start()?;

    tokio::time::sleep(Duration::from_millis(1500)).await;
    machine.send_and_wait("fault").await?;
    println!("timers while flashing: {:?}", machine.active_timers());

    machine.send_and_wait("repaired").await?;
    tokio::time::sleep(Duration::from_millis(400)).await;

    println!("visited: {:?}", machine.state_history().path());
    machine.stop();
    Ok(())
}
