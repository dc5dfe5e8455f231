//! Bounded channels and the reader/worker/writer coordinator (spec §4.E,
//! §4.F — components E and F). Grounded on `mooreryan-align/src/lib.rs`'s
//! `set_up_workers`/`align_records` shape (bounded `crossbeam::channel`,
//! a pool of worker threads, a single writer) and on the sentinel-counting
//! protocol in `original_source/main.cpp`'s `Reader`/`Consensus`/`Writer`.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::thread;

use crossbeam::channel::{self, Receiver, Sender};

use crate::cli::Config;
use crate::dag::AlnGraph;
use crate::error::M5Error;
use crate::m5::{AlignmentBatch, M5Reader};
use crate::normalize::normalize;
use crate::realign::realign;
use crate::record::format_record;
use crate::trim::trim;

/// An empty-alignments batch is the sentinel pushed on the aln-channel
/// (spec §4.F "Sentinel protocol"): exactly `N` are pushed once the reader
/// is done, and a worker terminates the moment it pops one.
fn is_sentinel(batch: &AlignmentBatch) -> bool {
    batch.alignments.is_empty()
}

fn sentinel_batch() -> AlignmentBatch {
    AlignmentBatch { key: String::new(), alignments: Vec::new() }
}

fn open_source(input: &str) -> Result<Box<dyn BufRead + Send>, M5Error> {
    if input == "-" {
        Ok(Box::new(BufReader::new(io::stdin())))
    } else {
        File::open(input)
            .map(|f| Box::new(BufReader::new(f)) as Box<dyn BufRead + Send>)
            .map_err(|source| M5Error::Open { path: input.to_string(), source })
    }
}

/// Drains an M5 stream into the aln-channel, skipping under-covered
/// batches (spec §7 "Empty or under-covered batch"), then pushes `n_workers`
/// sentinels whether the stream ended cleanly or on a fatal parser error
/// (spec §4.F, §7: no partial target is emitted, but the pipeline always
/// drains).
fn reader_loop<R: BufRead>(
    reader: R,
    source_name: &str,
    config: &Config,
    n_workers: usize,
    aln_tx: &Sender<AlignmentBatch>,
) {
    let stream = M5Reader::new(reader, source_name.to_string());
    for item in stream {
        match item {
            Ok(batch) => {
                if batch.alignments.len() < config.min_coverage {
                    log::debug!(
                        target: "reader",
                        "coverage requirement not met for {}, coverage: {}",
                        batch.key,
                        batch.alignments.len()
                    );
                    continue;
                }
                log::debug!(target: "reader", "consensus candidate: {}", batch.key);
                if aln_tx.send(batch).is_err() {
                    break;
                }
            }
            Err(e) => {
                log::error!(target: "reader", "{e}");
                break;
            }
        }
    }
    for _ in 0..n_workers {
        let _ = aln_tx.send(sentinel_batch());
    }
}

fn reader_thread(input: String, config: Config, n_workers: usize, aln_tx: Sender<AlignmentBatch>) {
    match open_source(&input) {
        Ok(reader) => reader_loop(reader, &input, &config, n_workers, &aln_tx),
        Err(e) => {
            log::error!(target: "reader", "{e}");
            for _ in 0..n_workers {
                let _ = aln_tx.send(sentinel_batch());
            }
        }
    }
}

/// Re-aligns (if configured), normalizes, trims, threads, merges, and
/// extracts consensus for one batch, pushing each formatted record onto
/// `cns_tx`. A batch that yields nothing (every alignment filtered or
/// trimmed away) simply emits no records (spec §7).
fn process_batch(batch: &AlignmentBatch, config: &Config, cns_tx: &Sender<String>) {
    if batch.alignments.is_empty() {
        return;
    }

    let mut alignments = batch.alignments.clone();
    if config.align {
        for aln in &mut alignments {
            realign(aln, &config.band);
        }
    }

    let target_len = alignments[0].target_len;
    let mut graph = AlnGraph::new(target_len);
    for aln in &alignments {
        if aln.aligned_len() < config.min_length {
            continue;
        }
        let mut aln = aln.clone();
        normalize(&mut aln);
        let Some(trimmed) = trim(&aln, config.trim) else {
            continue;
        };
        graph.add_aln(&trimmed);
    }

    graph.merge_nodes();
    let results = graph.consensus(config.min_coverage as u32, config.min_length);
    for result in &results {
        if cns_tx.send(format_record(&batch.key, result)).is_err() {
            break;
        }
    }
}

/// Pops batches from `aln_rx` until the sentinel, calling [`process_batch`]
/// on each, then pushes exactly one empty-string sentinel onto `cns_tx`
/// (spec §4.F).
fn worker_thread(config: Config, aln_rx: Receiver<AlignmentBatch>, cns_tx: Sender<String>) {
    while let Ok(batch) = aln_rx.recv() {
        if is_sentinel(&batch) {
            let _ = cns_tx.send(String::new());
            break;
        }
        log::debug!(
            target: "consensus",
            "consensus calling: {} alignments: {}",
            batch.key,
            batch.alignments.len()
        );
        process_batch(&batch, &config, &cns_tx);
    }
}

/// Writes every popped record verbatim, counting empty-string sentinels
/// until `n_workers` have been seen (spec §4.F, §4.G).
fn writer_loop<W: Write>(mut out: W, n_workers: usize, cns_rx: &Receiver<String>) {
    let mut sentinel_count = 0;
    while let Ok(cns) = cns_rx.recv() {
        let _ = out.write_all(cns.as_bytes());
        if cns.is_empty() {
            sentinel_count += 1;
            if sentinel_count == n_workers {
                break;
            }
        }
    }
}

fn writer_thread(n_workers: usize, cns_rx: Receiver<String>) {
    let stdout = io::stdout();
    writer_loop(stdout.lock(), n_workers, &cns_rx);
}

/// Spawns (or, in degenerate single-threaded mode, directly runs) the
/// reader, `config.worker_count()` consensus workers, and the writer, then
/// joins them. Returns a process exit code (spec §4.F "Thread lifecycle"):
/// `0` on a clean join, `1` if any pipeline thread panicked.
pub fn run(input: String, config: Config) -> i32 {
    let n_workers = config.worker_count();
    let (aln_tx, aln_rx) = channel::bounded::<AlignmentBatch>(config.rbuf);
    let (cns_tx, cns_rx) = channel::bounded::<String>(config.wbuf);

    if config.threads.is_some() {
        log::info!(target: "main", "multi-threaded. input: {input}, threads: {n_workers}");

        // Spawn order mirrors the original C++ driver: writer, then
        // workers, then reader; joined in reverse (writer last, since it
        // is the last thread to observe end-of-stream).
        let writer_handle = {
            let cns_rx = cns_rx.clone();
            thread::spawn(move || writer_thread(n_workers, cns_rx))
        };

        let mut worker_handles = Vec::with_capacity(n_workers);
        for _ in 0..n_workers {
            let rx = aln_rx.clone();
            let tx = cns_tx.clone();
            worker_handles.push(thread::spawn(move || worker_thread(config, rx, tx)));
        }
        drop(cns_tx);
        drop(aln_rx);
        drop(cns_rx);

        let reader_handle = thread::spawn(move || reader_thread(input, config, n_workers, aln_tx));

        let mut ok = reader_handle.join().is_ok();
        for handle in worker_handles {
            ok &= handle.join().is_ok();
        }
        ok &= writer_handle.join().is_ok();

        if ok {
            0
        } else {
            log::error!(target: "main", "a pipeline thread panicked");
            1
        }
    } else {
        log::info!(target: "main", "single-threaded. input: {input}");
        reader_thread(input, config, 1, aln_tx);
        worker_thread(config, aln_rx, cns_tx);
        writer_thread(1, cns_rx);
        0
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::realign::BandConfig;
    use std::io::Cursor;

    fn config(min_coverage: usize, min_length: usize, trim_cols: usize) -> Config {
        Config {
            min_coverage,
            min_length,
            trim: trim_cols,
            threads: None,
            rbuf: 30,
            wbuf: 30,
            align: false,
            band: BandConfig::default(),
        }
    }

    fn m5_line(qname: &str, tname: &str, tlen: usize, tstart: usize, tend: usize, qaln: &str, taln: &str) -> String {
        format!(
            "{qname} {} {} {} + {tname} {tlen} {tstart} {tend} + 0 0 0 0 0 0 {qaln} | {taln}",
            tend - tstart,
            0,
            tend - tstart,
        )
    }

    /// Runs the full reader -> worker -> writer chain single-threaded over
    /// in-memory input, returning the output as a `String`.
    fn run_inline(input: &str, config: Config) -> String {
        let (aln_tx, aln_rx) = channel::bounded::<AlignmentBatch>(config.rbuf);
        let (cns_tx, cns_rx) = channel::bounded::<String>(config.wbuf);

        reader_loop(Cursor::new(input), "test", &config, 1, &aln_tx);
        drop(aln_tx);
        worker_thread(config, aln_rx, cns_tx);

        let mut out = Vec::new();
        writer_loop(&mut out, 1, &cns_rx);
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn e1_empty_input_yields_no_records() {
        let out = run_inline("", config(8, 1, 0));
        assert_eq!(out, "");
    }

    #[test]
    fn e2_under_covered_batch_yields_no_records() {
        let input = (0..3)
            .map(|i| m5_line(&format!("q{i}"), "t1", 20, 0, 20, "ACGTACGTACGTACGTACGT", "ACGTACGTACGTACGTACGT"))
            .collect::<Vec<_>>()
            .join("\n");
        let out = run_inline(&input, config(8, 1, 0));
        assert_eq!(out, "");
    }

    #[test]
    fn e3_unanimous_consensus_emits_one_full_length_record() {
        let target = "ACGTACGTACGTACGTACGT";
        let input = (0..10)
            .map(|i| m5_line(&format!("q{i}"), "t1", 20, 0, 20, target, target))
            .collect::<Vec<_>>()
            .join("\n");
        let out = run_inline(&input, config(8, 1, 0));
        assert_eq!(out, format!(">t1/0_20\n{target}\n"));
    }

    #[test]
    fn e4_single_snp_consensus_keeps_majority_base() {
        let target = "ACGTACGTACGTACGTACGT";
        let mut snp = target.as_bytes().to_vec();
        snp[7] = b'G';
        let snp = String::from_utf8(snp).unwrap();

        let mut lines: Vec<String> =
            (0..9).map(|i| m5_line(&format!("q{i}"), "t1", 20, 0, 20, target, target)).collect();
        lines.push(m5_line("q9", "t1", 20, 0, 20, &snp, target));
        let out = run_inline(&lines.join("\n"), config(8, 1, 0));
        assert_eq!(out, format!(">t1/0_20\n{target}\n"));
    }

    #[test]
    fn e6_sort_violation_still_emits_completed_batches() {
        let t1 = "ACGTACGTACGTACGTACGT";
        let t2 = "TTTTTTTTTTTTTTTTTTTT";
        let mut lines = Vec::new();
        for i in 0..8 {
            lines.push(m5_line(&format!("q{i}"), "t1", 20, 0, 20, t1, t1));
        }
        for i in 0..8 {
            lines.push(m5_line(&format!("q{i}"), "t2", 20, 0, 20, t2, t2));
        }
        // t1 reappears after t2: a sort violation.
        lines.push(m5_line("q_bad", "t1", 20, 0, 20, t1, t1));
        let out = run_inline(&lines.join("\n"), config(8, 1, 0));
        assert_eq!(out, format!(">t1/0_20\n{t1}\n"));
    }

    #[test]
    fn sentinel_accounting_holds_for_multiple_workers() {
        let (aln_tx, aln_rx) = channel::bounded::<AlignmentBatch>(4);
        let (cns_tx, cns_rx) = channel::bounded::<String>(4);
        let n_workers = 3;

        reader_loop(Cursor::new(""), "test", &config(8, 1, 0), n_workers, &aln_tx);
        drop(aln_tx);

        let handles: Vec<_> = (0..n_workers)
            .map(|_| {
                let rx = aln_rx.clone();
                let tx = cns_tx.clone();
                let cfg = config(8, 1, 0);
                thread::spawn(move || worker_thread(cfg, rx, tx))
            })
            .collect();
        drop(cns_tx);
        for h in handles {
            h.join().unwrap();
        }

        let mut out = Vec::new();
        writer_loop(&mut out, n_workers, &cns_rx);
        assert!(cns_rx.is_empty());
    }

    #[test]
    fn single_target_run_is_deterministic() {
        let target = "ACGTACGTACGTACGTACGT";
        let input = (0..10)
            .map(|i| m5_line(&format!("q{i}"), "t1", 20, 0, 20, target, target))
            .collect::<Vec<_>>()
            .join("\n");
        let a = run_inline(&input, config(8, 1, 0));
        let b = run_inline(&input, config(8, 1, 0));
        assert_eq!(a, b);
    }
}
