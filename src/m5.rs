//! M5 alignment stream parsing and target/query grouping (spec §4.A).
//!
//! Grounded on `original_source/main.cpp`'s `Reader::operator()` and the
//! `BlasrM5AlnProvider`/`nextTarget` contract it drives: a lazy, one-record
//! lookahead grouping of an M5 stream into per-key batches, switching from
//! target-grouping to query-grouping if the first two records share a query
//! id instead of a target id.

use crate::alignment::{Alignment, Strand};
use crate::error::M5Error;
use std::collections::{HashSet, VecDeque};
use std::io::BufRead;
use std::str::FromStr;

/// All the alignments sharing one grouping key (ordinarily the target id;
/// see [`GroupMode`]).
#[derive(Debug, Clone)]
pub struct AlignmentBatch {
    pub key:        String,
    pub alignments: Vec<Alignment>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GroupMode {
    Target,
    Query,
}

const EXPECTED_FIELDS: usize = 19;

/// Decodes one M5 line into an [`Alignment`].
///
/// Returns a human-readable message on failure; the caller is responsible
/// for logging it with file/line context and dropping the record (spec
/// §4.A: a malformed record never aborts parsing).
pub fn parse_line(line: &str) -> Result<Alignment, String> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != EXPECTED_FIELDS {
        return Err(format!(
            "expected {EXPECTED_FIELDS} whitespace-delimited fields, found {}",
            fields.len()
        ));
    }

    let parse_usize = |idx: usize, name: &str| -> Result<usize, String> {
        fields[idx]
            .parse::<usize>()
            .map_err(|_| format!("field '{name}' is not a valid non-negative integer: '{}'", fields[idx]))
    };
    let parse_strand = |idx: usize, name: &str| -> Result<Strand, String> {
        Strand::from_str(fields[idx]).map_err(|_| format!("field '{name}' is not '+' or '-': '{}'", fields[idx]))
    };

    let query_id = fields[0].to_string();
    let query_len = parse_usize(1, "qlen")?;
    let query_start = parse_usize(2, "qstart")?;
    let query_end = parse_usize(3, "qend")?;
    let query_strand = parse_strand(4, "qstrand")?;

    let target_id = fields[5].to_string();
    let target_len = parse_usize(6, "tlen")?;
    let target_start = parse_usize(7, "tstart")?;
    let target_end = parse_usize(8, "tend")?;
    let target_strand = parse_strand(9, "tstrand")?;

    // score, nmatch, nmismatch, nins, ndel, mapqv: validated, then discarded
    // (spec §4.A "Decoding detail" -- they play no role in DAG construction).
    let _score = fields[10]
        .parse::<i64>()
        .map_err(|_| format!("field 'score' is not a valid integer: '{}'", fields[10]))?;
    for (idx, name) in [(11, "nmatch"), (12, "nmismatch"), (13, "nins"), (14, "ndel"), (15, "mapqv")] {
        parse_usize(idx, name)?;
    }

    let query_aligned = fields[16].as_bytes().to_ascii_uppercase();
    let target_aligned = fields[18].as_bytes().to_ascii_uppercase();
    if query_aligned.len() != target_aligned.len() {
        return Err(format!(
            "aligned query/target strings have unequal length ({} vs {})",
            query_aligned.len(),
            target_aligned.len()
        ));
    }

    Ok(Alignment {
        query_id,
        query_len,
        query_start,
        query_end,
        query_strand,
        target_id,
        target_len,
        target_start,
        target_end,
        target_strand,
        target_aligned,
        query_aligned,
    })
}

/// A lazy, fault-tolerant reader over an M5 stream producing one
/// [`AlignmentBatch`] per distinct grouping key.
pub struct M5Reader<R> {
    lines:       std::io::Lines<R>,
    source_name: String,
    line_no:     usize,
    mode:        GroupMode,
    pending:     VecDeque<Alignment>,
    closed_keys: HashSet<String>,
    current_key: Option<String>,
    current_batch: Vec<Alignment>,
    done:        bool,
}

impl<R: BufRead> M5Reader<R> {
    /// Builds a reader over `reader`, using `source_name` only for log
    /// context (typically the input file path, or `-` for standard input).
    pub fn new(reader: R, source_name: impl Into<String>) -> Self {
        let mut this = Self {
            lines: reader.lines(),
            source_name: source_name.into(),
            line_no: 0,
            mode: GroupMode::Target,
            pending: VecDeque::new(),
            closed_keys: HashSet::new(),
            current_key: None,
            current_batch: Vec::new(),
            done: false,
        };

        // Look at the first two successfully-parsed records to decide the
        // grouping mode, then feed them back in as the first two records of
        // the stream proper. The very first record is never held back (see
        // DESIGN.md "Open question resolution").
        let first = this.pull_record();
        let second = this.pull_record();
        if let (Some(a), Some(b)) = (&first, &second) {
            if a.target_id != b.target_id && a.query_id == b.query_id {
                this.mode = GroupMode::Query;
            }
        }
        if let Some(b) = second {
            this.pending.push_front(b);
        }
        if let Some(a) = first {
            this.pending.push_front(a);
        }

        this
    }

    fn key_of(&self, aln: &Alignment) -> String {
        match self.mode {
            GroupMode::Target => aln.target_id.clone(),
            GroupMode::Query => aln.query_id.clone(),
        }
    }

    /// Pulls the next successfully-parsed record, skipping and logging any
    /// malformed lines along the way. Does not consult `pending`.
    fn pull_record(&mut self) -> Option<Alignment> {
        loop {
            let line = self.lines.next()?;
            self.line_no += 1;
            let line = match line {
                Ok(l) => l,
                Err(e) => {
                    log::warn!(target: "m5", "{}: I/O error at line {}: {e}", self.source_name, self.line_no);
                    continue;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            match parse_line(&line) {
                Ok(aln) => return Some(aln),
                Err(msg) => {
                    log::warn!(target: "m5", "{}: malformed record at line {}: {msg}", self.source_name, self.line_no);
                    continue;
                }
            }
        }
    }

    fn next_record(&mut self) -> Option<Alignment> {
        if let Some(aln) = self.pending.pop_front() {
            return Some(aln);
        }
        self.pull_record()
    }
}

impl<R: BufRead> Iterator for M5Reader<R> {
    type Item = Result<AlignmentBatch, M5Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            let Some(rec) = self.next_record() else {
                self.done = true;
                return self.current_key.take().map(|key| {
                    Ok(AlignmentBatch {
                        key,
                        alignments: std::mem::take(&mut self.current_batch),
                    })
                });
            };

            let key = self.key_of(&rec);

            match &self.current_key {
                None => {
                    self.current_key = Some(key);
                    self.current_batch.push(rec);
                }
                Some(current) if *current == key => {
                    self.current_batch.push(rec);
                }
                Some(_) => {
                    if self.closed_keys.contains(&key) {
                        self.done = true;
                        return Some(Err(M5Error::SortOrder { key }));
                    }
                    let finished_key = self.current_key.replace(key).unwrap();
                    self.closed_keys.insert(finished_key.clone());
                    let finished_batch = std::mem::replace(&mut self.current_batch, vec![rec]);
                    return Some(Ok(AlignmentBatch {
                        key:        finished_key,
                        alignments: finished_batch,
                    }));
                }
            }
        }
    }
}
