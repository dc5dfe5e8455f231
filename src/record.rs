//! Record emitter (spec §4.G): formats one [`ConsensusResult`] as a single
//! FASTA-style text record, grounded on `original_source/main.cpp`'s
//! `boost::format(">%s/%d_%d\n%s\n")` call site.

use crate::dag::ConsensusResult;

/// Formats `result` as `>{target_id}/{start}_{end}\n{sequence}\n`. No
/// wrapping; the writer concatenates these verbatim (spec §4.G, §6).
pub fn format_record(target_id: &str, result: &ConsensusResult) -> String {
    format!(
        ">{}/{}_{}\n{}\n",
        target_id,
        result.start,
        result.end,
        String::from_utf8_lossy(&result.sequence)
    )
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn formats_header_and_sequence_with_no_wrapping() {
        let result = ConsensusResult { start: 0, end: 4, sequence: b"ACGT".to_vec() };
        assert_eq!(format_record("t1", &result), ">t1/0_4\nACGT\n");
    }
}
