//! Nested vehicle states with guards, a polling timeout and a scoped timer.
//!
//! Run with: cargo run --example vehicle

use hfsm::builder::{DefinitionBuilder, StateBuilder, TransitionBuilder};
use hfsm::Guard;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Default)]
struct Vehicle {
    kickstand_up: AtomicBool,
    dashboard_ready: AtomicBool,
    polls: AtomicUsize,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .finish();

    let definition = DefinitionBuilder::<Vehicle>::new()
        .state(StateBuilder::normal("vehicle").default_child("parked"))
        .state(
            StateBuilder::normal("parked")
                .parent("vehicle")
                .default_child("booting"),
        )
        .state(
            StateBuilder::<Vehicle>::normal("booting")
                .parent("parked")
                .timeout_transition(Duration::from_millis(50), "idle")
                .timeout_action(|ctx| {
                    let polls = ctx.data().polls.fetch_add(1, Ordering::SeqCst) + 1;
                    if polls < 3 {
                        return Err(format!("dashboard not ready after {polls} polls").into());
                    }
                    ctx.data().dashboard_ready.store(true, Ordering::SeqCst);
                    Ok(())
                }),
        )
        .state(StateBuilder::normal("idle").parent("parked"))
        .state(
            StateBuilder::<Vehicle>::normal("driving")
                .parent("vehicle")
                .timer("blink")
                .on_enter(|ctx| {
                    ctx.start_timer("blink", Duration::from_millis(100), "blink");
                    Ok(())
                }),
        )
        .transition(TransitionBuilder::new("parked", "ride", "driving").guards([
            Guard::<Vehicle>::new(|ctx| ctx.data().kickstand_up.load(Ordering::SeqCst)),
            Guard::<Vehicle>::new(|ctx| ctx.data().dashboard_ready.load(Ordering::SeqCst)),
        ]))
        // Re-entering "driving" restarts the blink timer from its entry callback.
        .transition(TransitionBuilder::new("driving", "blink", "driving").action(|_| {
            println!("blink");
            Ok(())
        }))
        .transition(TransitionBuilder::new("driving", "park", "parked"))
        .initial("vehicle")
        .build()?;

    let machine = definition
        .machine(Vehicle::default())
        .logger(subscriber)
        .on_state_change(|from, to| println!("{from} -> {to}"))
        .build()?;
    machine.start()?;

    machine.data().kickstand_up.store(true, Ordering::SeqCst);
    machine.send_and_wait("ride").await?;
    println!("riding before the dashboard is ready: {}", machine.is_in_state("driving"));

    tokio::time::sleep(Duration::from_millis(300)).await;
    machine.send_and_wait("ride").await?;
    println!("riding: {}", machine.is_in_state("driving"));

    tokio::time::sleep(Duration::from_millis(350)).await;
    machine.send_and_wait("park").await?;
    println!("blink timer after parking: {}", machine.timer_active("blink"));

    machine.stop();
    Ok(())
}
