//! Probability vector → (class index, confidence).

use crate::error::{Result, SeriError};

/// Index and value of the largest probability.
///
/// Ties go to the lowest index. NaN entries are skipped; a vector with no
/// comparable entry is an error.
pub fn argmax(probabilities: &[f32]) -> Result<(usize, f32)> {
    let mut best: Option<(usize, f32)> = None;
    for (idx, &p) in probabilities.iter().enumerate() {
        if p.is_nan() {
            continue;
        }
        match best {
            Some((_, top)) if p <= top => {}
            _ => best = Some((idx, p)),
        }
    }
    best.ok_or_else(|| {
        SeriError::ModelOutput(format!(
            "no usable score in {}-element probability vector",
            probabilities.len()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_the_maximum() {
        assert_eq!(argmax(&[0.1, 0.7, 0.2]).unwrap(), (1, 0.7));
    }

    #[test]
    fn ties_go_to_the_lowest_index() {
        assert_eq!(argmax(&[0.2, 0.4, 0.4]).unwrap(), (1, 0.4));
        assert_eq!(argmax(&[0.5, 0.5]).unwrap(), (0, 0.5));
    }

    #[test]
    fn nan_is_skipped() {
        assert_eq!(argmax(&[f32::NAN, 0.3, 0.1]).unwrap(), (1, 0.3));
    }

    #[test]
    fn empty_or_all_nan_is_an_error() {
        assert!(matches!(argmax(&[]), Err(SeriError::ModelOutput(_))));
        assert!(matches!(
            argmax(&[f32::NAN, f32::NAN]),
            Err(SeriError::ModelOutput(_))
        ));
    }
}
