//! Action codecs: index <-> structured action.

use serde::{Deserialize, Serialize};

use crate::encoding::MixedRadix;
use crate::error::{CoreError, Result};

pub trait ActionCodec {
    type Action;

    fn num_actions(&self) -> usize;
    fn decode(&self, index: usize) -> Result<Self::Action>;
    fn encode(&self, action: &Self::Action) -> Result<usize>;
}

/// Card game actions: one class per played slot, `num_classes ^ slots` in total.
/// Position 0 holds the most significant digit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardActionCodec {
    radix: MixedRadix,
}

impl CardActionCodec {
    pub fn new(num_classes: usize, slots: usize) -> Result<Self> {
        if num_classes == 0 || slots == 0 {
            return Err(CoreError::InvalidConfiguration(format!(
                "card actions need positive sizes (classes={num_classes}, slots={slots})"
            )));
        }
        Ok(Self {
            radix: MixedRadix::uniform(num_classes, slots)?,
        })
    }
}

impl ActionCodec for CardActionCodec {
    type Action = Vec<usize>;

    fn num_actions(&self) -> usize {
        self.radix.cardinality()
    }

    fn decode(&self, index: usize) -> Result<Vec<usize>> {
        self.radix.decode(index).map_err(|_| CoreError::ActionOutOfRange {
            action: index,
            num_actions: self.radix.cardinality(),
        })
    }

    fn encode(&self, action: &Vec<usize>) -> Result<usize> {
        self.radix.encode(action)
    }
}

/// Maze moves. Index order is fixed: 0 = +col, 1 = +row, 2 = -col, 3 = -row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Right,
    Up,
    Left,
    Down,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Right,
        Direction::Up,
        Direction::Left,
        Direction::Down,
    ];

    /// `(row, col)` step.
    pub fn delta(self) -> (isize, isize) {
        match self {
            Direction::Right => (0, 1),
            Direction::Up => (1, 0),
            Direction::Left => (0, -1),
            Direction::Down => (-1, 0),
        }
    }

    pub fn index(self) -> usize {
        match self {
            Direction::Right => 0,
            Direction::Up => 1,
            Direction::Left => 2,
            Direction::Down => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectionCodec;

impl ActionCodec for DirectionCodec {
    type Action = Direction;

    fn num_actions(&self) -> usize {
        Direction::ALL.len()
    }

    fn decode(&self, index: usize) -> Result<Direction> {
        Direction::ALL
            .get(index)
            .copied()
            .ok_or(CoreError::ActionOutOfRange {
                action: index,
                num_actions: Direction::ALL.len(),
            })
    }

    fn encode(&self, action: &Direction) -> Result<usize> {
        Ok(action.index())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn card_codec_decodes_most_significant_first() {
        let codec = CardActionCodec::new(3, 3).unwrap();
        assert_eq!(codec.num_actions(), 27);
        assert_eq!(codec.decode(13).unwrap(), vec![1, 1, 1]);
        assert_eq!(codec.decode(5).unwrap(), vec![0, 1, 2]);
        assert_eq!(codec.encode(&vec![1, 1, 1]).unwrap(), 13);
    }

    #[test]
    fn card_codec_rejects_out_of_range() {
        let codec = CardActionCodec::new(3, 3).unwrap();
        assert_eq!(
            codec.decode(27),
            Err(CoreError::ActionOutOfRange {
                action: 27,
                num_actions: 27
            })
        );
        assert!(codec.encode(&vec![0, 3, 0]).is_err());
        assert!(codec.encode(&vec![0, 0]).is_err());
    }

    #[test]
    fn direction_mapping_is_fixed() {
        let codec = DirectionCodec;
        assert_eq!(codec.decode(0).unwrap().delta(), (0, 1));
        assert_eq!(codec.decode(1).unwrap().delta(), (1, 0));
        assert_eq!(codec.decode(2).unwrap().delta(), (0, -1));
        assert_eq!(codec.decode(3).unwrap().delta(), (-1, 0));
        assert!(codec.decode(4).is_err());
    }

    #[test]
    fn direction_serializes_lowercase() {
        let json = serde_json::to_string(&Direction::Left).unwrap();
        assert_eq!(json, "\"left\"");
    }
}
