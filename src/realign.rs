//! Banded re-alignment (spec §4.C), active only under `--align`.
//!
//! Treats the input's aligned strings purely as a hint: strips them back to
//! their ungapped bases and recomputes a banded global alignment across the
//! same pair, overwriting `target_aligned`/`query_aligned` in place.
//! Coordinates are untouched.

use crate::alignment::{Alignment, GAP};
use bio::alignment::pairwise::banded::Aligner;
use bio::alignment::AlignmentOperation;

/// Band parameters, threaded in from the CLI (spec §4.C: "Band width is
/// fixed by the component's configuration").
#[derive(Debug, Clone, Copy)]
pub struct BandConfig {
    pub gap_open:   i32,
    pub gap_extend: i32,
    pub kmer_len:   usize,
    pub band_width: usize,
}

impl Default for BandConfig {
    fn default() -> Self {
        Self {
            gap_open:   -5,
            gap_extend: -1,
            kmer_len:   8,
            band_width: 6,
        }
    }
}

fn ungap(s: &[u8]) -> Vec<u8> {
    s.iter().copied().filter(|&b| b != GAP).collect()
}

fn match_fn(a: u8, b: u8) -> i32 {
    if a == b {
        1
    } else {
        -1
    }
}

/// Recomputes `aln`'s aligned strings with a banded global alignment of its
/// underlying ungapped query and target substrings.
pub fn realign(aln: &mut Alignment, cfg: &BandConfig) {
    let query = ungap(&aln.query_aligned);
    let target = ungap(&aln.target_aligned);

    if query.is_empty() || target.is_empty() {
        return;
    }

    let mut aligner = Aligner::new(cfg.gap_open, cfg.gap_extend, match_fn, cfg.kmer_len, cfg.band_width);
    let alignment = aligner.global(&query, &target);

    let mut query_aligned = Vec::with_capacity(alignment.operations.len());
    let mut target_aligned = Vec::with_capacity(alignment.operations.len());
    let mut xi = 0usize;
    let mut yi = 0usize;
    for op in &alignment.operations {
        match op {
            AlignmentOperation::Match | AlignmentOperation::Subst => {
                query_aligned.push(query[xi]);
                target_aligned.push(target[yi]);
                xi += 1;
                yi += 1;
            }
            AlignmentOperation::Del => {
                query_aligned.push(GAP);
                target_aligned.push(target[yi]);
                yi += 1;
            }
            AlignmentOperation::Ins => {
                query_aligned.push(query[xi]);
                target_aligned.push(GAP);
                xi += 1;
            }
            AlignmentOperation::Xclip(n) => xi += n,
            AlignmentOperation::Yclip(n) => yi += n,
        }
    }

    aln.query_aligned = query_aligned;
    aln.target_aligned = target_aligned;
}
