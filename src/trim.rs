//! End-trimming (spec §4.B, second half).

use crate::alignment::{Alignment, GAP};

fn non_gap_count(cols: &[u8]) -> usize {
    cols.iter().filter(|&&b| b != GAP).count()
}

/// Removes `trim_cols` aligned columns from both ends of `aln`, adjusting
/// the four coordinate fields by the number of non-gap characters removed
/// on each side. Returns `None` (the alignment is discarded) when
/// `2 * trim_cols >= aligned_len` (spec §4.B, §7 "degenerate alignment").
pub fn trim(aln: &Alignment, trim_cols: usize) -> Option<Alignment> {
    let len = aln.aligned_len();
    if 2 * trim_cols >= len {
        return None;
    }

    let left_removed_target = non_gap_count(&aln.target_aligned[..trim_cols]);
    let left_removed_query = non_gap_count(&aln.query_aligned[..trim_cols]);
    let right_removed_target = non_gap_count(&aln.target_aligned[len - trim_cols..]);
    let right_removed_query = non_gap_count(&aln.query_aligned[len - trim_cols..]);

    let mut out = aln.clone();
    out.target_aligned = aln.target_aligned[trim_cols..len - trim_cols].to_vec();
    out.query_aligned = aln.query_aligned[trim_cols..len - trim_cols].to_vec();
    out.target_start = aln.target_start + left_removed_target;
    out.target_end = aln.target_end - right_removed_target;
    out.query_start = aln.query_start + left_removed_query;
    out.query_end = aln.query_end - right_removed_query;

    Some(out)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::alignment::Strand;

    fn aln(query_aligned: &str, target_aligned: &str) -> Alignment {
        Alignment {
            query_id: "q".into(),
            query_len: 20,
            query_start: 0,
            query_end: query_aligned.bytes().filter(|&b| b != GAP).count(),
            query_strand: Strand::Plus,
            target_id: "t".into(),
            target_len: 20,
            target_start: 0,
            target_end: target_aligned.bytes().filter(|&b| b != GAP).count(),
            target_strand: Strand::Plus,
            target_aligned: target_aligned.as_bytes().to_vec(),
            query_aligned: query_aligned.as_bytes().to_vec(),
        }
    }

    #[test]
    fn trims_columns_from_both_ends() {
        let a = aln("ACGTACGTACGT", "ACGTACGTACGT");
        let trimmed = trim(&a, 2).unwrap();
        assert_eq!(trimmed.aligned_len(), 8);
        assert_eq!(trimmed.target_aligned, b"GTACGTAC");
        assert_eq!(trimmed.target_start, 2);
        assert_eq!(trimmed.target_end, 10);
    }

    #[test]
    fn adjusts_coordinates_by_non_gap_count_across_gapped_ends() {
        // First two columns on the query side contain one gap; only one
        // non-gap base should be trimmed off query_start.
        let a = aln("-AGTACGTACGT", "CAGTACGTACGT");
        let trimmed = trim(&a, 2).unwrap();
        assert_eq!(trimmed.query_start, 1);
        assert_eq!(trimmed.target_start, 2);
    }

    #[test]
    fn discards_when_twice_trim_meets_or_exceeds_length() {
        let a = aln("ACGT", "ACGT");
        assert!(trim(&a, 2).is_none());
        assert!(trim(&a, 3).is_none());
        assert!(trim(&a, 1).is_some());
    }

    #[test]
    fn is_monotonic_in_trim_amount() {
        let a = aln("ACGTACGTACGTACGT", "ACGTACGTACGTACGT");
        let t3 = trim(&a, 3).unwrap();
        let t4 = trim(&a, 4).unwrap();
        assert!(t4.aligned_len() <= t3.aligned_len());
    }
}
