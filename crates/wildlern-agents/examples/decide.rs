use std::io::{self, Read};

use serde::Serialize;
use wildlern_agents::{CardAgent, CardAgentConfig, CardObservation};
use wildlern_core::{Agent, Decision};

#[derive(Serialize)]
struct DecisionRecord {
    observation: CardObservation,
    decision: Decision<Vec<usize>>,
}

/// Reads a `CardObservation` as JSON from stdin and prints one decision.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut input = String::new();
    io::stdin().read_to_string(&mut input)?;

    let observation = if input.trim().is_empty() {
        CardObservation {
            enemy_cards: vec![0, 1, 2],
            hand: vec![0, 1, 2, 2],
        }
    } else {
        serde_json::from_str(&input)?
    };

    let mut agent = CardAgent::new(CardAgentConfig::default())?;
    let decision = agent.decide(&observation)?;

    let record = DecisionRecord {
        observation,
        decision,
    };
    serde_json::to_writer_pretty(io::stdout(), &record)?;
    println!();
    Ok(())
}
