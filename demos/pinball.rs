//! Pinball Table Logic
//!
//! This example models the rules of a small pinball table as one chart:
//! five letter lights, a hurry mode once every letter is lit, and a
//! jackpot while in hurry mode.
//!
//! Key concepts:
//! - Nested parallel regions (every letter light runs independently)
//! - Completion events (`done.state.letters`) when all lights are lit
//! - A custom `ActionExecutor` keeping the score
//! - Guards that query the active configuration
//! - Per-state activity watchers driving "lamps"
//!
//! Run with: cargo run --example pinball
//! (set RUST_LOG=mindchart=debug to see every microstep)

use mindchart::builder::{ChartBuilder, StateBuilder, TransitionBuilder};
use mindchart::core::ActionId;
use mindchart::engine::{ActionContext, ActionExecutor, ActionFault, GuardTable, StateChart};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const LETTERS: [char; 5] = ['C', 'R', 'A', 'Z', 'Y'];

const LAMPS: [&str; 8] = [
    "cLightOn",
    "rLightOn",
    "aLightOn",
    "zLightOn",
    "yLightOn",
    "hurryStateOn",
    "jackpotStateOn",
    "offState",
];

/// Keeps the score of the current and the best game.
#[derive(Debug, Default)]
struct Scoreboard {
    score: u64,
    high_score: u64,
}

impl ActionExecutor for Scoreboard {
    fn execute(
        &mut self,
        action: &ActionId,
        context: &mut ActionContext<'_>,
    ) -> Result<(), ActionFault> {
        match action.as_str() {
            "resetScore" => self.score = 0,
            "scoreLetter" if context.is_active("hurryStateOn") => self.score += 1_000,
            "scoreLetter" => self.score += 100,
            "scoreJackpot" => self.score += 100_000,
            "recordHighScore" => self.high_score = self.high_score.max(self.score),
            _ => return Err(ActionFault::UnknownAction(action.clone())),
        }
        Ok(())
    }
}

fn letter_light(letter: char) -> StateBuilder {
    let lower = letter.to_ascii_lowercase();
    StateBuilder::new(format!("{lower}Letter"))
        .state(
            StateBuilder::new(format!("{lower}LightOff")).transition(
                TransitionBuilder::on(format!("letterTriggered.{letter}"))
                    .to(format!("{lower}LightOn")),
            ),
        )
        .state(StateBuilder::final_state(format!("{lower}LightOn")))
}

fn pinball() -> mindchart::core::Chart {
    let letters = LETTERS
        .iter()
        .fold(StateBuilder::parallel("letters"), |region, &l| {
            region.state(letter_light(l))
        });

    ChartBuilder::new("pinball")
        .state(
            StateBuilder::new("offState")
                .on_entry("recordHighScore")
                .transition(TransitionBuilder::on("startTriggered").to("onState")),
        )
        .state(
            StateBuilder::parallel("onState")
                .on_entry("resetScore")
                .transition(TransitionBuilder::on("letterTriggered").action("scoreLetter"))
                .transition(TransitionBuilder::on("ballOutTriggered").to("offState"))
                .state(letters)
                .state(
                    StateBuilder::new("hurryState")
                        .state(
                            StateBuilder::new("hurryStateOff").transition(
                                TransitionBuilder::on("done.state.letters").to("hurryStateOn"),
                            ),
                        )
                        .state(StateBuilder::new("hurryStateOn")),
                )
                .state(
                    StateBuilder::new("jackpotState")
                        .state(
                            StateBuilder::new("jackpotStateOff").transition(
                                TransitionBuilder::on("letterTriggered")
                                    .when("inHurry")
                                    .to("jackpotStateOn"),
                            ),
                        )
                        .state(StateBuilder::new("jackpotStateOn").on_entry("scoreJackpot")),
                ),
        )
        .build()
        .expect("pinball chart is valid")
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "mindchart=info".into()),
        )
        .init();

    println!("=== Pinball State Chart ===\n");

    let guards = GuardTable::new().with("inHurry", |ctx| ctx.is_active("hurryStateOn"));
    let mut table = StateChart::new(Arc::new(pinball()), guards, Scoreboard::default());

    for lamp in LAMPS {
        table
            .on_state_active(lamp, move |on| {
                println!("  lamp {lamp:<15} {}", if on { "ON" } else { "off" });
            })
            .expect("lamp state exists");
    }

    table.start().expect("table starts");

    println!("\nStart button:");
    table.submit("startTriggered").expect("event accepted");

    for letter in LETTERS {
        println!("\nLetter {letter} hit:");
        table
            .submit(format!("letterTriggered.{letter}"))
            .expect("event accepted");
        println!("  score: {}", table.executor().score);
    }

    println!("\nLetter C hit during hurry mode:");
    table.submit("letterTriggered.C").expect("event accepted");
    println!("  score: {}", table.executor().score);

    println!("\nBall lost:");
    table.submit("ballOutTriggered").expect("event accepted");

    let board = table.executor();
    println!("\nFinal score: {}, high score: {}", board.score, board.high_score);
    println!("Active: {:?}", table.active_state_names());

    println!("\n=== Example Complete ===");
}
