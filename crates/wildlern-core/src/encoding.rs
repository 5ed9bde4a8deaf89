//! Mixed-radix state encoders.
//!
//! Every observable feature is a digit with a fixed radix. A tuple of digits is
//! folded left to right (`acc = acc * radix + digit`), so the first digit is the
//! most significant one. Decoding is the exact inverse.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MixedRadix {
    radixes: Vec<usize>,
    cardinality: usize,
}

impl MixedRadix {
    /// Builds an encoder for the given radixes. An empty radix list is valid and
    /// encodes exactly one tuple (the empty one).
    pub fn new(radixes: Vec<usize>) -> Result<Self> {
        let mut cardinality: usize = 1;
        for (position, &radix) in radixes.iter().enumerate() {
            if radix == 0 {
                return Err(CoreError::InvalidConfiguration(format!(
                    "radix at position {position} must be positive"
                )));
            }
            cardinality = cardinality.checked_mul(radix).ok_or_else(|| {
                CoreError::InvalidConfiguration("mixed-radix cardinality overflows usize".into())
            })?;
        }
        Ok(Self {
            radixes,
            cardinality,
        })
    }

    /// `len` digits sharing one radix.
    pub fn uniform(radix: usize, len: usize) -> Result<Self> {
        Self::new(vec![radix; len])
    }

    /// Number of distinct tuples, i.e. the exclusive upper bound of `encode`.
    pub fn cardinality(&self) -> usize {
        self.cardinality
    }

    pub fn digits(&self) -> usize {
        self.radixes.len()
    }

    pub fn encode(&self, digits: &[usize]) -> Result<usize> {
        if digits.len() != self.radixes.len() {
            return Err(CoreError::FeatureLength {
                expected: self.radixes.len(),
                got: digits.len(),
            });
        }
        let mut acc = 0;
        for (position, (&digit, &radix)) in digits.iter().zip(&self.radixes).enumerate() {
            if digit >= radix {
                return Err(CoreError::DigitOutOfRange {
                    position,
                    digit,
                    radix,
                });
            }
            acc = acc * radix + digit;
        }
        Ok(acc)
    }

    pub fn decode(&self, mut index: usize) -> Result<Vec<usize>> {
        if index >= self.cardinality {
            return Err(CoreError::StateOutOfRange {
                state: index,
                num_states: self.cardinality,
            });
        }
        let mut digits = vec![0; self.radixes.len()];
        for (slot, &radix) in digits.iter_mut().zip(&self.radixes).rev() {
            *slot = index % radix;
            index /= radix;
        }
        Ok(digits)
    }
}

/// Encodes the card game: the enemy's visible classes plus the player's own hand.
///
/// The hand is summarised as a count per class. Only the first
/// `num_classes - 1` counts are encoded because the last one follows from the
/// fixed deck size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardStateEncoder {
    num_classes: usize,
    deck_size: usize,
    enemy: MixedRadix,
    hand: MixedRadix,
    num_states: usize,
}

impl CardStateEncoder {
    pub fn new(num_classes: usize, num_enemy_cards: usize, deck_size: usize) -> Result<Self> {
        if num_classes == 0 || num_enemy_cards == 0 || deck_size == 0 {
            return Err(CoreError::InvalidConfiguration(format!(
                "card game needs positive sizes, got {num_classes} classes, \
                 {num_enemy_cards} enemy cards, deck {deck_size}"
            )));
        }
        let enemy = MixedRadix::uniform(num_classes, num_enemy_cards)?;
        let hand = MixedRadix::uniform(deck_size + 1, num_classes - 1)?;
        let num_states = enemy
            .cardinality()
            .checked_mul(hand.cardinality())
            .ok_or_else(|| CoreError::InvalidConfiguration("card state space overflows".into()))?;
        Ok(Self {
            num_classes,
            deck_size,
            enemy,
            hand,
            num_states,
        })
    }

    pub fn num_states(&self) -> usize {
        self.num_states
    }

    /// Number of enemy configurations, `num_classes ^ num_enemy_cards`.
    pub fn enemy_combinations(&self) -> usize {
        self.enemy.cardinality()
    }

    /// Number of hand summaries, `(deck_size + 1) ^ (num_classes - 1)`.
    pub fn hand_combinations(&self) -> usize {
        self.hand.cardinality()
    }

    /// Counts how many cards of each class the hand holds.
    pub fn count_hand(&self, hand: &[usize]) -> Result<Vec<usize>> {
        if hand.len() != self.deck_size {
            return Err(CoreError::FeatureLength {
                expected: self.deck_size,
                got: hand.len(),
            });
        }
        let mut counts = vec![0; self.num_classes];
        for (position, &label) in hand.iter().enumerate() {
            let count = counts.get_mut(label).ok_or(CoreError::DigitOutOfRange {
                position,
                digit: label,
                radix: self.num_classes,
            })?;
            *count += 1;
        }
        Ok(counts)
    }

    pub fn encode(&self, enemy_cards: &[usize], hand: &[usize]) -> Result<usize> {
        let enemy = self.enemy.encode(enemy_cards)?;
        let counts = self.count_hand(hand)?;
        let player = self.hand.encode(&counts[..self.num_classes - 1])?;
        Ok(enemy + player * self.enemy.cardinality())
    }
}

/// Encodes the maze: agent position plus the intact/broken flag of every
/// breakable cell.
///
/// Flags are read as a base-2 number, first flag most significant, with an
/// intact cell contributing a 1. The combined index is
/// `(row * cols + col) * 2^breakables + flags`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MazeStateEncoder {
    rows: usize,
    cols: usize,
    breakables: usize,
    num_states: usize,
}

impl MazeStateEncoder {
    pub fn new(rows: usize, cols: usize, breakables: usize) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(CoreError::InvalidConfiguration(format!(
                "maze needs positive dimensions, got {rows}x{cols}"
            )));
        }
        let num_states = u32::try_from(breakables)
            .ok()
            .and_then(|b| 1usize.checked_shl(b))
            .and_then(|flags| rows.checked_mul(cols)?.checked_mul(flags))
            .ok_or_else(|| {
                CoreError::InvalidConfiguration(format!(
                    "maze state space overflows with {breakables} breakables"
                ))
            })?;
        Ok(Self {
            rows,
            cols,
            breakables,
            num_states,
        })
    }

    pub fn num_states(&self) -> usize {
        self.num_states
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn breakables(&self) -> usize {
        self.breakables
    }

    fn flag_combinations(&self) -> usize {
        1 << self.breakables
    }

    pub fn encode(&self, row: usize, col: usize, intact: &[bool]) -> Result<usize> {
        if row >= self.rows || col >= self.cols {
            return Err(CoreError::PositionOutOfRange {
                row,
                col,
                rows: self.rows,
                cols: self.cols,
            });
        }
        if intact.len() != self.breakables {
            return Err(CoreError::FeatureLength {
                expected: self.breakables,
                got: intact.len(),
            });
        }
        let flags = intact
            .iter()
            .fold(0, |acc, &cell| (acc << 1) | usize::from(cell));
        let position = row * self.cols + col;
        Ok(position * self.flag_combinations() + flags)
    }

    /// Same as [`encode`](Self::encode) but takes the flags as a `0`/`1` string.
    pub fn encode_bits(&self, row: usize, col: usize, bits: &str) -> Result<usize> {
        let intact = parse_bits(bits)?;
        self.encode(row, col, &intact)
    }

    pub fn decode(&self, state: usize) -> Result<(usize, usize, Vec<bool>)> {
        if state >= self.num_states {
            return Err(CoreError::StateOutOfRange {
                state,
                num_states: self.num_states,
            });
        }
        let position = state / self.flag_combinations();
        let flags = state % self.flag_combinations();
        let intact = (0..self.breakables)
            .rev()
            .map(|shift| (flags >> shift) & 1 == 1)
            .collect();
        Ok((position / self.cols, position % self.cols, intact))
    }
}

/// Parses a `0`/`1` string into per-cell intact flags.
pub fn parse_bits(bits: &str) -> Result<Vec<bool>> {
    bits.chars()
        .map(|c| match c {
            '1' => Ok(true),
            '0' => Ok(false),
            _ => Err(CoreError::InvalidBitString(bits.to_string())),
        })
        .collect()
}

/// Renders intact flags as a `0`/`1` string, intact = `1`.
pub fn format_bits(intact: &[bool]) -> String {
    intact.iter().map(|&cell| if cell { '1' } else { '0' }).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mixed_radix_matches_positional_weights() {
        let radix = MixedRadix::new(vec![3, 5, 2]).unwrap();
        assert_eq!(radix.cardinality(), 30);
        // 2*10 + 4*2 + 1
        assert_eq!(radix.encode(&[2, 4, 1]).unwrap(), 29);
        assert_eq!(radix.decode(29).unwrap(), vec![2, 4, 1]);
    }

    #[test]
    fn mixed_radix_rejects_bad_input() {
        let radix = MixedRadix::uniform(3, 2).unwrap();
        assert_eq!(
            radix.encode(&[1]),
            Err(CoreError::FeatureLength {
                expected: 2,
                got: 1
            })
        );
        assert_eq!(
            radix.encode(&[1, 3]),
            Err(CoreError::DigitOutOfRange {
                position: 1,
                digit: 3,
                radix: 3
            })
        );
        assert!(radix.decode(9).is_err());
        assert!(MixedRadix::new(vec![2, 0]).is_err());
    }

    #[test]
    fn empty_radix_has_single_tuple() {
        let radix = MixedRadix::new(vec![]).unwrap();
        assert_eq!(radix.cardinality(), 1);
        assert_eq!(radix.encode(&[]).unwrap(), 0);
    }

    #[test]
    fn card_encoder_sizes() {
        let enc = CardStateEncoder::new(3, 3, 4).unwrap();
        assert_eq!(enc.enemy_combinations(), 27);
        assert_eq!(enc.hand_combinations(), 25);
        assert_eq!(enc.num_states(), 675);
    }

    #[test]
    fn card_encoder_combines_enemy_and_hand() {
        let enc = CardStateEncoder::new(3, 3, 4).unwrap();
        // enemy [2,0,1] -> 19; hand counts [1,2,1] -> 1*5 + 2 = 7
        let state = enc.encode(&[2, 0, 1], &[0, 1, 1, 2]).unwrap();
        assert_eq!(state, 19 + 7 * 27);
    }

    #[test]
    fn card_encoder_rejects_wrong_hand() {
        let enc = CardStateEncoder::new(3, 3, 4).unwrap();
        assert!(matches!(
            enc.encode(&[0, 0, 0], &[0, 1, 2]),
            Err(CoreError::FeatureLength { .. })
        ));
        assert!(matches!(
            enc.encode(&[0, 0, 0], &[0, 1, 2, 3]),
            Err(CoreError::DigitOutOfRange { .. })
        ));
        assert!(CardStateEncoder::new(0, 3, 4).is_err());
    }

    #[test]
    fn maze_encoder_reads_flags_as_binary() {
        let enc = MazeStateEncoder::new(8, 8, 6).unwrap();
        assert_eq!(enc.num_states(), 4096);
        assert_eq!(enc.encode_bits(0, 0, "111111").unwrap(), 63);
        assert_eq!(enc.encode_bits(0, 1, "000000").unwrap(), 64);
        assert_eq!(enc.encode_bits(7, 7, "111111").unwrap(), 4095);
        assert_eq!(enc.encode_bits(0, 0, "010100").unwrap(), 20);
    }

    #[test]
    fn maze_encoder_decode_inverts_encode() {
        let enc = MazeStateEncoder::new(3, 4, 2).unwrap();
        let state = enc.encode(2, 1, &[true, false]).unwrap();
        assert_eq!(enc.decode(state).unwrap(), (2, 1, vec![true, false]));
    }

    #[test]
    fn maze_encoder_rejects_bad_input() {
        let enc = MazeStateEncoder::new(8, 8, 6).unwrap();
        assert_eq!(
            enc.encode_bits(8, 0, "111111"),
            Err(CoreError::PositionOutOfRange {
                row: 8,
                col: 0,
                rows: 8,
                cols: 8
            })
        );
        assert!(enc.encode_bits(0, 0, "11111").is_err());
        assert_eq!(
            enc.encode_bits(0, 0, "11x111"),
            Err(CoreError::InvalidBitString("11x111".into()))
        );
        assert!(MazeStateEncoder::new(0, 8, 6).is_err());
        assert!(MazeStateEncoder::new(8, 8, 200).is_err());
    }

    #[test]
    fn bits_roundtrip_through_strings() {
        assert_eq!(format_bits(&parse_bits("1001").unwrap()), "1001");
    }
}
