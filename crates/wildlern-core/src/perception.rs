//! Perception boundary.
//!
//! Classification of raw inputs (rendered cards, camera frames) happens outside
//! the engine. A [`Classifier`] hands back one score per class and the engine
//! only ever sees the winning label.

use crate::error::{CoreError, Result};

pub trait Classifier {
    type Input;

    /// One score per class.
    fn scores(&self, input: &Self::Input) -> Vec<f32>;

    fn classify(&self, input: &Self::Input) -> Result<usize> {
        argmax(&self.scores(input)).ok_or(CoreError::EmptyScores)
    }
}

/// Index of the largest score; the first one wins ties. `None` for an empty slice.
pub fn argmax(scores: &[f32]) -> Option<usize> {
    let (first, rest) = scores.split_first()?;
    let mut best = (0, *first);
    for (idx, &score) in rest.iter().enumerate() {
        if score > best.1 {
            best = (idx + 1, score);
        }
    }
    Some(best.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Vec<f32>);

    impl Classifier for Fixed {
        type Input = ();

        fn scores(&self, _input: &()) -> Vec<f32> {
            self.0.clone()
        }
    }

    #[test]
    fn argmax_picks_first_maximum() {
        assert_eq!(argmax(&[0.1, 0.7, 0.7]), Some(1));
        assert_eq!(argmax(&[-1.0]), Some(0));
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    fn classify_uses_argmax() {
        assert_eq!(Fixed(vec![0.2, 0.1, 0.9]).classify(&()).unwrap(), 2);
        assert_eq!(Fixed(vec![]).classify(&()), Err(CoreError::EmptyScores));
    }
}
