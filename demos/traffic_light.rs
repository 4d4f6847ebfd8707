//! Traffic Light State Chart
//!
//! This example demonstrates a cyclic chart with a maintenance mode.
//!
//! Key concepts:
//! - Cyclic transitions inside a compound state
//! - Deep history resuming the cycle after maintenance
//! - Entry actions supplied through an `ActionTable`
//! - Observing configuration changes
//!
//! Run with: cargo run --example traffic_light
//! (set RUST_LOG=mindchart=debug to see every microstep)

use mindchart::builder::{simple_transition, ChartBuilder, StateBuilder};
use mindchart::engine::{ActionTable, GuardTable, StateChart};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "mindchart=info".into()),
        )
        .init();

    println!("=== Traffic Light State Chart ===\n");

    let chart = ChartBuilder::new("traffic_light")
        .state(
            StateBuilder::new("operating")
                .transition(simple_transition("fault", "maintenance"))
                .state(StateBuilder::deep_history("resume"))
                .state(
                    StateBuilder::new("red")
                        .on_entry("stop")
                        .transition(simple_transition("timer", "green")),
                )
                .state(
                    StateBuilder::new("green")
                        .on_entry("go")
                        .transition(simple_transition("timer", "yellow")),
                )
                .state(
                    StateBuilder::new("yellow")
                        .on_entry("caution")
                        .transition(simple_transition("timer", "red")),
                ),
        )
        .state(
            StateBuilder::new("maintenance")
                .on_entry("blink")
                .transition(simple_transition("repair", "resume")),
        )
        .build()
        .expect("traffic light chart is valid");

    let actions = ActionTable::new()
        .with_fn("stop", |_| println!("  Red    -> Stop"))
        .with_fn("go", |_| println!("  Green  -> Go!"))
        .with_fn("caution", |_| println!("  Yellow -> Caution"))
        .with_fn("blink", |_| println!("  Flashing yellow (maintenance)"));

    let mut light = StateChart::new(Arc::new(chart), GuardTable::new(), actions);
    light.on_change(|change| {
        println!("    exited {:?}, entered {:?}", change.exited, change.entered);
    });

    light.start().expect("chart starts");

    println!("\nTwo timer ticks:");
    for _ in 0..2 {
        light.submit("timer").expect("timer accepted");
    }

    println!("\nA fault interrupts the cycle:");
    light.submit("fault").expect("fault accepted");

    println!("\nRepair resumes where the cycle left off:");
    light.submit("repair").expect("repair accepted");
    println!("Active: {:?}", light.active_state_names());

    println!("\nKey Characteristics:");
    println!("- The cycle never reaches a final state");
    println!("- Deep history restores the exact lamp after maintenance");
    println!("- Entry actions are plain closures looked up by id");

    println!("\n=== Example Complete ===");
}
