// Copyright 2026 the Push VM Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Random-deletion genome simplification.
//!
//! [`GenomeSimplifier`] repeatedly deletes a few random genes and keeps the shorter genome only if
//! its total error does not exceed the best seen so far. The returned errors therefore never sum to
//! more than the baseline.

use rand::Rng;
use rand::seq::index;

use crate::atom::CodeBlock;
use crate::genome::{Genome, genome_to_code};

/// Scores a translated program, one error per training case.
pub trait ErrorFunction {
    /// Returns the error vector for `code`.
    fn errors(&mut self, code: &CodeBlock) -> Vec<f64>;
}

impl<F> ErrorFunction for F
where
    F: FnMut(&CodeBlock) -> Vec<f64>,
{
    fn errors(&mut self, code: &CodeBlock) -> Vec<f64> {
        self(code)
    }
}

/// Total error; NaN entries count as infinitely bad.
#[must_use]
pub fn total_error(errors: &[f64]) -> f64 {
    errors
        .iter()
        .map(|e| if e.is_nan() { f64::INFINITY } else { *e })
        .sum()
}

/// Simplification parameters.
#[derive(Clone, Debug)]
pub struct GenomeSimplifier {
    /// Deletion attempts.
    pub steps: usize,
    /// Most genes removed in one attempt.
    pub max_removals: usize,
    /// Point cap passed to translation.
    pub max_points: usize,
}

impl Default for GenomeSimplifier {
    fn default() -> Self {
        Self {
            steps: 100,
            max_removals: 3,
            max_points: 1000,
        }
    }
}

impl GenomeSimplifier {
    /// Creates a simplifier that makes `steps` attempts.
    pub fn new(steps: usize) -> Self {
        Self {
            steps,
            ..Self::default()
        }
    }

    /// Sets the translation point cap.
    #[must_use]
    pub fn with_max_points(mut self, max_points: usize) -> Self {
        self.max_points = max_points;
        self
    }

    /// Simplifies `genome`, whose errors are `baseline`.
    ///
    /// Returns the smallest accepted genome and its errors. If no deletion is accepted, returns the
    /// input genome and `baseline`.
    pub fn simplify<E, R>(
        &self,
        genome: &Genome,
        baseline: &[f64],
        eval: &mut E,
        rng: &mut R,
    ) -> (Genome, Vec<f64>)
    where
        E: ErrorFunction + ?Sized,
        R: Rng + ?Sized,
    {
        let mut best = genome.clone();
        let mut best_errors = baseline.to_vec();
        let mut best_total = total_error(baseline);

        for _ in 0..self.steps {
            if best.len() <= 1 {
                break;
            }
            let most = self.max_removals.min(best.len() - 1).max(1);
            let count = rng.gen_range(1..=most);
            let picked = index::sample(rng, best.len(), count).into_vec();
            let candidate = best.without(&picked);

            let errors = eval.errors(&genome_to_code(&candidate, self.max_points));
            let total = total_error(&errors);
            if total <= best_total {
                best = candidate;
                best_errors = errors;
                best_total = total;
            }
        }
        (best, best_errors)
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::atom::Atom;

    #[test]
    fn removes_genes_that_do_not_matter() {
        // Error is zero as long as the literal 7 is present.
        let genome: Genome = [1, 2, 7, 3, 4, 5].into_iter().map(Atom::int).collect();
        let mut eval = |code: &CodeBlock| {
            let has_seven = code.iter().any(|a| *a == Atom::int(7));
            vec![if has_seven { 0.0 } else { 1.0 }]
        };
        let mut rng = StdRng::seed_from_u64(7);
        let (g, e) = GenomeSimplifier::new(200).simplify(&genome, &[0.0], &mut eval, &mut rng);
        assert_eq!(e, vec![0.0]);
        let expected: Genome = [Atom::int(7)].into_iter().collect();
        assert_eq!(g, expected);
    }

    #[test]
    fn never_worsens() {
        let genome: Genome = (0..20).map(Atom::int).collect();
        // Longer programs score better, so no deletion is ever accepted.
        let mut eval = |code: &CodeBlock| vec![100.0 - code.len() as f64];
        let mut rng = StdRng::seed_from_u64(1);
        let (g, e) = GenomeSimplifier::new(50).simplify(&genome, &[80.0], &mut eval, &mut rng);
        assert_eq!(g, genome);
        assert_eq!(e, vec![80.0]);
    }

    #[test]
    fn nan_counts_as_infinite() {
        assert_eq!(total_error(&[1.0, f64::NAN]), f64::INFINITY);
        assert_eq!(total_error(&[1.0, 2.5]), 3.5);
    }
}
