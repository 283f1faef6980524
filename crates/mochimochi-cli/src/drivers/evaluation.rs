use std::fmt;

use serde::Serialize;

/// Correct/total tally over a test set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Evaluation {
    pub correct: usize,
    pub total: usize,
}

impl Evaluation {
    pub fn record(&mut self, hit: bool) {
        self.total += 1;
        if hit {
            self.correct += 1;
        }
    }

    /// Accuracy in percent. An empty test set scores 0.
    pub fn accuracy(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        100.0 * self.correct as f64 / self.total as f64
    }
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Accuracy = {:.2}% ({}/{})",
            self.accuracy(),
            self.correct,
            self.total
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tally_and_format() {
        let mut eval = Evaluation::default();
        assert_eq!(eval.accuracy(), 0.0);
        eval.record(true);
        eval.record(false);
        eval.record(true);
        eval.record(true);
        assert_eq!(eval, Evaluation { correct: 3, total: 4 });
        assert_eq!(eval.to_string(), "Accuracy = 75.00% (3/4)");
    }
}
