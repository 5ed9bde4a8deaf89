//! Card table: deals hands, judges played cards, hands out rewards.

use std::cell::RefCell;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use wildlern_agents::CardAgentConfig;
use wildlern_core::{Classifier, CoreError};

use crate::error::{Result, SimError};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CardRewards {
    pub invalid: f32,
    pub lost: f32,
    pub tie: f32,
    pub won: f32,
}

impl Default for CardRewards {
    fn default() -> Self {
        Self {
            invalid: -2.0,
            lost: -1.0,
            tie: -0.1,
            won: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandOutcome {
    Won,
    Lost,
    Tie,
    /// More cards of some class were played than the hand holds.
    Invalid,
}

/// Ground truth of one turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deal {
    pub enemy_cards: Vec<usize>,
    pub hand: Vec<usize>,
}

/// The one higher class that class 0 still beats.
const UNDERDOG_TARGET: usize = 2;

/// Higher classes beat lower ones, and class 0 also beats class 2.
/// Equal classes never beat each other.
pub fn beats(a: usize, e: usize) -> bool {
    a != e && (a > e || (a == 0 && e == UNDERDOG_TARGET))
}

#[derive(Debug, Clone)]
pub struct CardTable {
    num_classes: usize,
    num_enemy_cards: usize,
    deck_size: usize,
    rewards: CardRewards,
    rng: StdRng,
}

impl CardTable {
    pub fn new(num_classes: usize, num_enemy_cards: usize, deck_size: usize) -> Result<Self> {
        if num_classes == 0 || num_enemy_cards == 0 || deck_size == 0 {
            return Err(CoreError::InvalidConfiguration(
                "card table needs positive sizes".into(),
            )
            .into());
        }
        Ok(Self {
            num_classes,
            num_enemy_cards,
            deck_size,
            rewards: CardRewards::default(),
            rng: StdRng::from_entropy(),
        })
    }

    pub fn for_agent(config: &CardAgentConfig) -> Result<Self> {
        Self::new(config.num_classes, config.num_enemy_cards, config.deck_size)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn with_rewards(mut self, rewards: CardRewards) -> Self {
        self.rewards = rewards;
        self
    }

    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    pub fn deal(&mut self) -> Deal {
        let classes = self.num_classes;
        let enemy_cards = (0..self.num_enemy_cards)
            .map(|_| self.rng.gen_range(0..classes))
            .collect();
        let hand = (0..self.deck_size)
            .map(|_| self.rng.gen_range(0..classes))
            .collect();
        Deal { enemy_cards, hand }
    }

    pub fn judge(&self, deal: &Deal, played: &[usize]) -> Result<HandOutcome> {
        if played.len() != deal.enemy_cards.len() {
            return Err(SimError::InvalidPlay(format!(
                "played {} cards against {} enemy cards",
                played.len(),
                deal.enemy_cards.len()
            )));
        }
        let mut held = vec![0usize; self.num_classes];
        for &card in &deal.hand {
            if let Some(count) = held.get_mut(card) {
                *count += 1;
            }
        }
        for &card in played {
            match held.get_mut(card) {
                Some(count) if *count > 0 => *count -= 1,
                _ => return Ok(HandOutcome::Invalid),
            }
        }

        let score: i32 = played
            .iter()
            .zip(&deal.enemy_cards)
            .map(|(&a, &e)| {
                if a == e {
                    0
                } else if beats(a, e) {
                    1
                } else {
                    -1
                }
            })
            .sum();
        Ok(match score {
            0 => HandOutcome::Tie,
            s if s > 0 => HandOutcome::Won,
            _ => HandOutcome::Lost,
        })
    }

    pub fn reward(&self, outcome: HandOutcome) -> f32 {
        match outcome {
            HandOutcome::Won => self.rewards.won,
            HandOutcome::Lost => self.rewards.lost,
            HandOutcome::Tie => self.rewards.tie,
            HandOutcome::Invalid => self.rewards.invalid,
        }
    }
}

/// Stands in for the image classifier: knows the true label and reports it,
/// except with probability `noise` where it reports a different class.
#[derive(Debug)]
pub struct NoisyOracle {
    num_classes: usize,
    noise: f32,
    rng: RefCell<StdRng>,
}

impl NoisyOracle {
    pub fn new(num_classes: usize, noise: f32) -> Result<Self> {
        if num_classes == 0 || !(0.0..=1.0).contains(&noise) {
            return Err(CoreError::InvalidConfiguration(format!(
                "oracle needs classes > 0 and noise in [0, 1], got {num_classes} / {noise}"
            ))
            .into());
        }
        Ok(Self {
            num_classes,
            noise,
            rng: RefCell::new(StdRng::from_entropy()),
        })
    }

    pub fn with_seed(self, seed: u64) -> Self {
        self.rng.replace(StdRng::seed_from_u64(seed));
        self
    }
}

impl Classifier for NoisyOracle {
    type Input = usize;

    fn scores(&self, label: &usize) -> Vec<f32> {
        let mut scores = vec![0.0; self.num_classes];
        let mut rng = self.rng.borrow_mut();
        let reported = if self.num_classes > 1 && rng.gen::<f32>() < self.noise {
            // shift by 1..num_classes so the label always changes
            (label + rng.gen_range(1..self.num_classes)) % self.num_classes
        } else {
            *label % self.num_classes
        };
        scores[reported] = 1.0;
        scores
    }
}
