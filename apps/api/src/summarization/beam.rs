//! Deterministic beam search over an abstract decoder step.
//!
//! The decoder is asked for next-token log-probabilities of every open beam;
//! no sampling is involved, so identical inputs always yield identical output.
//! Ties are broken by beam index, then token id.

use std::cmp::Ordering;

use tracing::debug;

use crate::summarization::GenerationError;

/// One forward step of an autoregressive decoder.
pub trait DecoderStep {
    /// Returns next-token log-probabilities for each beam, in beam order.
    /// All beams passed in share the same length.
    fn next_log_probs(&mut self, beams: &[Vec<u32>]) -> Result<Vec<Vec<f32>>, GenerationError>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeamSearchConfig {
    pub num_beams: usize,
    /// Maximum sequence length, counting `start_token`.
    pub max_length: usize,
    pub start_token: u32,
    pub end_token: u32,
    /// Exponent applied to the hypothesis length when normalizing scores.
    pub length_penalty: f32,
}

struct Beam {
    tokens: Vec<u32>,
    score: f32,
}

struct Hypothesis {
    tokens: Vec<u32>,
    score: f32,
}

impl Hypothesis {
    fn new(tokens: Vec<u32>, sum_log_probs: f32, length_penalty: f32) -> Self {
        let len = tokens.len().max(1) as f32;
        Self {
            score: sum_log_probs / len.powf(length_penalty),
            tokens,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    score: f32,
    beam: usize,
    token: u32,
}

/// Runs beam search and returns the best hypothesis without the start token.
///
/// Stops as soon as `num_beams` hypotheses have ended with `end_token`.
/// When `max_length` is hit first, open beams are finalized as they are.
pub fn beam_search<D: DecoderStep + ?Sized>(
    decoder: &mut D,
    config: &BeamSearchConfig,
) -> Result<Vec<u32>, GenerationError> {
    let num_beams = config.num_beams.max(1);
    let mut beams = vec![Beam {
        tokens: vec![config.start_token],
        score: 0.0,
    }];
    let mut finished: Vec<Hypothesis> = Vec::new();

    while !beams.is_empty() && beams[0].tokens.len() < config.max_length {
        let sequences: Vec<Vec<u32>> = beams.iter().map(|b| b.tokens.clone()).collect();
        let log_probs = decoder.next_log_probs(&sequences)?;
        if log_probs.len() != beams.len() {
            return Err(GenerationError::BeamShape {
                expected: beams.len(),
                got: log_probs.len(),
            });
        }

        let candidates = top_candidates(&beams, &log_probs, num_beams.saturating_mul(2));
        let mut next = Vec::with_capacity(num_beams.min(candidates.len()));

        for (rank, candidate) in candidates.iter().enumerate() {
            let parent = &beams[candidate.beam];
            if candidate.token == config.end_token {
                // Only ends ranked among the live beams count as finished.
                if rank < num_beams {
                    let mut tokens = parent.tokens[1..].to_vec();
                    tokens.push(candidate.token);
                    finished.push(Hypothesis::new(
                        tokens,
                        candidate.score,
                        config.length_penalty,
                    ));
                }
                continue;
            }

            let mut tokens = parent.tokens.clone();
            tokens.push(candidate.token);
            next.push(Beam {
                tokens,
                score: candidate.score,
            });
            if next.len() == num_beams {
                break;
            }
        }

        if finished.len() >= num_beams {
            debug!(
                "Beam search finished early at length {}",
                beams[0].tokens.len() + 1
            );
            return Ok(best(finished));
        }
        beams = next;
    }

    for beam in beams {
        finished.push(Hypothesis::new(
            beam.tokens[1..].to_vec(),
            beam.score,
            config.length_penalty,
        ));
    }

    Ok(best(finished))
}

fn best(hypotheses: Vec<Hypothesis>) -> Vec<u32> {
    let mut best: Option<Hypothesis> = None;
    for hyp in hypotheses {
        let better = match &best {
            Some(current) => hyp.score.total_cmp(&current.score) == Ordering::Greater,
            None => true,
        };
        if better {
            best = Some(hyp);
        }
    }
    best.map(|h| h.tokens).unwrap_or_default()
}

/// Best `k` (beam, token) extensions across all beams, highest score first.
fn top_candidates(beams: &[Beam], log_probs: &[Vec<f32>], k: usize) -> Vec<Candidate> {
    let mut candidates: Vec<Candidate> = beams
        .iter()
        .zip(log_probs)
        .enumerate()
        .flat_map(|(beam_idx, (beam, row))| {
            row_top_k(row, k)
                .into_iter()
                .map(move |(token, lp)| Candidate {
                    score: beam.score + lp,
                    beam: beam_idx,
                    token,
                })
        })
        .collect();

    candidates.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then(a.beam.cmp(&b.beam))
            .then(a.token.cmp(&b.token))
    });
    candidates.truncate(k);
    candidates
}

fn row_top_k(row: &[f32], k: usize) -> Vec<(u32, f32)> {
    let mut indexed: Vec<(u32, f32)> = row
        .iter()
        .enumerate()
        .map(|(i, &lp)| (i as u32, if lp.is_nan() { f32::NEG_INFINITY } else { lp }))
        .collect();

    let k = k.min(indexed.len());
    if k == 0 {
        return Vec::new();
    }

    let order = |a: &(u32, f32), b: &(u32, f32)| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0));
    if k < indexed.len() {
        indexed.select_nth_unstable_by(k - 1, order);
        indexed.truncate(k);
    }
    indexed.sort_by(order);
    indexed
}

#[cfg(test)]
mod tests {
    use super::*;

    const START: u32 = 0;
    const EOS: u32 = 1;
    const A: u32 = 2;
    const B: u32 = 3;

    /// Decoder whose distribution depends only on the tokens generated so far.
    struct Scripted<F: FnMut(&[u32]) -> [f32; 4]> {
        next: F,
        calls: usize,
    }

    impl<F: FnMut(&[u32]) -> [f32; 4]> DecoderStep for Scripted<F> {
        fn next_log_probs(
            &mut self,
            beams: &[Vec<u32>],
        ) -> Result<Vec<Vec<f32>>, GenerationError> {
            self.calls += 1;
            Ok(beams
                .iter()
                .map(|b| (self.next)(&b[1..]).iter().map(|p| p.ln()).collect())
                .collect())
        }
    }

    fn config(num_beams: usize, max_length: usize) -> BeamSearchConfig {
        BeamSearchConfig {
            num_beams,
            max_length,
            start_token: START,
            end_token: EOS,
            length_penalty: 0.0,
        }
    }

    // P(A)=0.6, P(B)=0.4 first; after A the end is weak, after B it is strong.
    fn garden_path(prefix: &[u32]) -> [f32; 4] {
        match prefix {
            [] => [1e-9, 1e-9, 0.6, 0.4],
            [A] => [1e-9, 0.4, 0.3, 0.3],
            [B] => [1e-9, 0.9, 0.05, 0.05],
            _ => [1e-9, 0.98, 0.01, 0.01],
        }
    }

    #[test]
    fn test_single_beam_is_greedy() {
        let mut decoder = Scripted {
            next: garden_path,
            calls: 0,
        };
        let tokens = beam_search(&mut decoder, &config(1, 10)).unwrap();
        assert_eq!(tokens, vec![A, EOS]);
    }

    #[test]
    fn test_two_beams_recover_better_sequence() {
        let mut decoder = Scripted {
            next: garden_path,
            calls: 0,
        };
        let tokens = beam_search(&mut decoder, &config(2, 10)).unwrap();
        // B,EOS has probability 0.36 versus 0.24 for A,EOS.
        assert_eq!(tokens, vec![B, EOS]);
        assert_eq!(decoder.calls, 2);
    }

    #[test]
    fn test_max_length_caps_output() {
        let mut decoder = Scripted {
            next: |_: &[u32]| [1e-9, 1e-6, 0.7, 0.3],
            calls: 0,
        };
        let tokens = beam_search(&mut decoder, &config(3, 5)).unwrap();
        assert_eq!(tokens, vec![A, A, A, A]);
        assert_eq!(decoder.calls, 4);
    }

    #[test]
    fn test_max_length_one_generates_nothing() {
        let mut decoder = Scripted {
            next: garden_path,
            calls: 0,
        };
        let tokens = beam_search(&mut decoder, &config(4, 1)).unwrap();
        assert!(tokens.is_empty());
        assert_eq!(decoder.calls, 0);
    }

    #[test]
    fn test_identical_inputs_give_identical_output() {
        let run = || {
            let mut decoder = Scripted {
                next: |prefix: &[u32]| match prefix.len() {
                    0..=2 => [1e-9, 1e-6, 0.45, 0.45],
                    _ => [1e-9, 0.8, 0.1, 0.1],
                },
                calls: 0,
            };
            beam_search(&mut decoder, &config(4, 12)).unwrap()
        };
        let first = run();
        assert_eq!(first, run());
        // A and B tie everywhere; the lower token id wins.
        assert_eq!(first[0], A);
    }

    #[test]
    fn test_length_penalty_favours_longer_hypotheses() {
        // Short: END at once (0.5). Long: A then END (0.5 * 0.9 = 0.45).
        let next = |prefix: &[u32]| match prefix {
            [] => [1e-9, 0.5, 0.5, 1e-9],
            [A] => [1e-9, 0.9, 0.05, 0.05],
            _ => [1e-9, 0.98, 0.01, 0.01],
        };
        let mut raw = Scripted { next, calls: 0 };
        assert_eq!(beam_search(&mut raw, &config(2, 10)).unwrap(), vec![EOS]);

        let mut normalized = Scripted { next, calls: 0 };
        let cfg = BeamSearchConfig {
            length_penalty: 1.0,
            ..config(2, 10)
        };
        assert_eq!(beam_search(&mut normalized, &cfg).unwrap(), vec![A, EOS]);
    }

    #[test]
    fn test_beam_count_beyond_vocabulary_stays_bounded() {
        let mut decoder = Scripted {
            next: garden_path,
            calls: 0,
        };
        let tokens = beam_search(&mut decoder, &config(1usize << 40, 3)).unwrap();
        assert_eq!(tokens, vec![B, EOS]);
        assert_eq!(decoder.calls, 2);
    }

    #[test]
    fn test_wrong_row_count_is_an_error() {
        struct Broken;
        impl DecoderStep for Broken {
            fn next_log_probs(
                &mut self,
                _beams: &[Vec<u32>],
            ) -> Result<Vec<Vec<f32>>, GenerationError> {
                Ok(vec![])
            }
        }

        let err = beam_search(&mut Broken, &config(2, 10)).unwrap_err();
        assert!(matches!(
            err,
            GenerationError::BeamShape {
                expected: 1,
                got: 0
            }
        ));
    }

    #[test]
    fn test_row_top_k_orders_and_ignores_nan() {
        let top = row_top_k(&[0.1, f32::NAN, 0.7, 0.7, 0.2], 3);
        assert_eq!(top, vec![(2, 0.7), (3, 0.7), (4, 0.2)]);
    }
}
