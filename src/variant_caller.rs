/*!
# Variant Caller
Walks one aligned query against the reference, position by position, and yields the differences as [`VariantRow`]s.

Three gap situations are told apart with a forward scan:
* gaps between two called bases form a deletion run, reported once the run closes, regardless of the analysis window
* gaps before the first called base or after the last called base are flanks; inside the window each one becomes an `N` row, outside it they are silent
* substitutions are reported only inside the window

## Example usage
```rust
use refdiff::data_types::window::AnalysisWindow;
use refdiff::variant_caller::VariantCaller;

let window = AnalysisWindow::new(1, 15).unwrap();
let caller = VariantCaller::new("COG-002", b"ATGCGGCTGAATTAA", b"AC-C---TGAACT--", window).unwrap();
let rows: Vec<(u64, String)> = caller
    .map(|r| (r.position(), r.alternate_base().to_string()))
    .collect();
assert_eq!(rows, vec![
    (2, "C".to_string()), (3, "1D".to_string()), (5, "3D".to_string()),
    (12, "C".to_string()), (14, "N".to_string()), (15, "N".to_string())
]);
```
*/
use log::trace;
use std::collections::VecDeque;

use crate::data_types::sequence_record::{SequenceRecord, GAP_SYMBOL};
use crate::data_types::variant_row::VariantRow;
use crate::data_types::window::AnalysisWindow;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum CallerError {
    #[error("query {sample_id:?} has length {query_len}, but the reference has length {reference_len}")]
    LengthMismatch { sample_id: String, reference_len: usize, query_len: usize },
}

/// Comparison state for a single query; construct one per query and drain it as an iterator.
pub struct VariantCaller<'a> {
    /// Sample identifier stamped onto each row
    sample_id: &'a str,
    /// Reference symbols
    reference: &'a [u8],
    /// Aligned query symbols, same length as `reference`
    query: &'a [u8],
    /// Trusted region for SNV and no-call emission
    window: AnalysisWindow,
    /// Current 1-based reference position; 0 before the first step
    curr_pos: u64,
    /// Length of the open deletion run, 0 if none is open
    del_len: u64,
    /// Set once the first non-gap query symbol has been seen
    seq_started: bool,
    /// Rightmost 1-based position holding a non-gap query symbol; 0 if the query is all gaps
    seq_end: u64,
    /// Rows produced by the last step that have not been handed out yet
    pending: VecDeque<VariantRow>,
    /// Set once the trailing flush step has run
    is_flushed: bool,
}

impl<'a> VariantCaller<'a> {
    /// Creates the caller for one query.
    /// # Arguments
    /// * `sample_id` - identifier to use on every emitted row
    /// * `reference` - the reference sequence
    /// * `query` - the aligned query, gaps marked with `-`
    /// * `window` - the trusted analysis window
    /// # Errors
    /// * if the query and reference lengths differ
    pub fn new(sample_id: &'a str, reference: &'a [u8], query: &'a [u8], window: AnalysisWindow) -> Result<Self, CallerError> {
        if reference.len() != query.len() {
            return Err(CallerError::LengthMismatch {
                sample_id: sample_id.to_string(),
                reference_len: reference.len(),
                query_len: query.len()
            });
        }

        let seq_end = query.iter()
            .rposition(|&b| b != GAP_SYMBOL)
            .map(|i| i as u64 + 1)
            .unwrap_or(0);
        trace!("{sample_id}: last called position = {seq_end}");

        Ok(Self {
            sample_id,
            reference,
            query,
            window,
            curr_pos: 0,
            del_len: 0,
            seq_started: false,
            seq_end,
            pending: VecDeque::with_capacity(2),
            is_flushed: false
        })
    }

    /// Advances the state machine by one aligned column, or flushes if `bases` is None.
    /// # Arguments
    /// * `bases` - the (reference, query) symbols of the next column
    fn step(&mut self, bases: Option<(u8, u8)>) {
        let Some((ref_base, query_base)) = bases else {
            // trailing flush re-uses the last position; any open run ended on it
            if self.seq_started {
                self.close_deletion(self.curr_pos + 1);
            }
            return;
        };

        self.curr_pos += 1;
        let in_window = self.window.contains(self.curr_pos);

        if query_base == GAP_SYMBOL {
            if self.seq_started && self.curr_pos < self.seq_end {
                // bounded on both sides by called bases
                self.del_len += 1;
            } else if in_window {
                // flank gap inside the trusted window
                self.pending.push_back(VariantRow::new_no_call(self.sample_id, self.curr_pos, ref_base));
            }
            return;
        }

        if self.seq_started {
            self.close_deletion(self.curr_pos);
        } else {
            self.seq_started = true;
        }

        if query_base != ref_base && self.del_len == 0 && in_window {
            self.pending.push_back(VariantRow::new_snv(self.sample_id, self.curr_pos, ref_base, query_base));
        }
    }

    /// Emits the open deletion run, if any.
    /// # Arguments
    /// * `end_pos` - the 1-based position just past the last deleted base
    fn close_deletion(&mut self, end_pos: u64) {
        if self.del_len > 0 {
            let start_pos = end_pos - self.del_len;
            self.pending.push_back(VariantRow::new_deletion(self.sample_id, start_pos, self.del_len));
            self.del_len = 0;
        }
    }
}

impl Iterator for VariantCaller<'_> {
    type Item = VariantRow;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(row) = self.pending.pop_front() {
                return Some(row);
            }
            if self.is_flushed {
                return None;
            }

            let index = self.curr_pos as usize;
            if index < self.query.len() {
                self.step(Some((self.reference[index], self.query[index])));
            } else {
                self.step(None);
                self.is_flushed = true;
            }
        }
    }
}

/// Convenience wrapper that runs a fresh caller over a query record and collects every row.
/// # Arguments
/// * `reference` - the loaded reference record
/// * `query` - the aligned query record; its identifier becomes the sample ID
/// * `window` - the trusted analysis window
/// # Errors
/// * if the query and reference lengths differ
pub fn call_record(reference: &SequenceRecord, query: &SequenceRecord, window: AnalysisWindow) -> Result<Vec<VariantRow>, CallerError> {
    let caller = VariantCaller::new(
        query.identifier(), reference.sequence_bytes(), query.sequence_bytes(), window
    )?;
    Ok(caller.collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_types::variant_row::VariantKind;

    const REFERENCE: &[u8] = b"ATGCGGCTGAATTAA";

    /// Simplified row representation for comparisons: (position, ref, alt, is_indel)
    fn call(query: &[u8], start: u64, end: u64) -> Vec<(u64, String, String, bool)> {
        let window = AnalysisWindow::new(start, end).unwrap();
        VariantCaller::new("sample", REFERENCE, query, window).unwrap()
            .map(|r| (r.position(), r.reference_base().to_string(), r.alternate_base().to_string(), r.is_indel()))
            .collect()
    }

    fn row(position: u64, ref_base: &str, alt_base: &str, is_indel: bool) -> (u64, String, String, bool) {
        (position, ref_base.to_string(), alt_base.to_string(), is_indel)
    }

    /// Rebuilds the query from the reference and the emitted rows, copying flank positions from the original query
    fn reconstruct(query: &[u8], rows: &[VariantRow]) -> Vec<u8> {
        let mut rebuilt = REFERENCE.to_vec();
        for r in rows.iter() {
            let index = r.position() as usize - 1;
            match r.kind() {
                VariantKind::Snv => rebuilt[index] = r.alternate_base().as_bytes()[0],
                VariantKind::NoCall => {},
                VariantKind::Deletion => {
                    for b in rebuilt[index..(index + r.ref_len() as usize)].iter_mut() {
                        *b = GAP_SYMBOL;
                    }
                }
            }
        }

        // flanks are copied as-is
        let first_called = query.iter().position(|&b| b != GAP_SYMBOL).unwrap_or(query.len());
        let last_called = query.iter().rposition(|&b| b != GAP_SYMBOL).map(|i| i + 1).unwrap_or(0);
        for i in 0..query.len() {
            if i < first_called || i >= last_called {
                rebuilt[i] = query[i];
            }
        }
        rebuilt
    }

    #[test]
    fn test_concrete_scenario() {
        let rows = call(b"AC-C---TGAACT--", 1, 15);
        assert_eq!(rows, vec![
            row(2, "T", "C", false),
            row(3, "", "1D", true),
            row(5, "", "3D", true),
            row(12, "T", "C", false),
            row(14, "A", "N", false),
            row(15, "A", "N", false),
        ]);
    }

    #[test]
    fn test_identical_query() {
        assert!(call(REFERENCE, 1, 15).is_empty());
        assert!(call(REFERENCE, 5, 10).is_empty());
    }

    #[test]
    fn test_narrow_window() {
        // SNV at 2 is outside the window, deletion at 6-8 is reported
        let rows = call(b"ACGCG---GAATTAA", 5, 10);
        assert_eq!(rows, vec![row(6, "", "3D", true)]);

        // with the full window, the SNV comes back
        let rows = call(b"ACGCG---GAATTAA", 1, 15);
        assert_eq!(rows, vec![row(2, "T", "C", false), row(6, "", "3D", true)]);
    }

    #[test]
    fn test_deletions_ignore_window() {
        // deletion fully outside the window
        let rows = call(b"A--CGGCTGAATTAA", 10, 15);
        assert_eq!(rows, vec![row(2, "", "2D", true)]);

        // deletion starting before the window and closing inside it
        let rows = call(b"ATGCG----AATTAA", 8, 12);
        assert_eq!(rows, vec![row(6, "", "4D", true)]);
    }

    #[test]
    fn test_flanks() {
        // leading flank inside the window are no-calls, the SNV at 7 is still reported
        let rows = call(b"---CGGATGAATTAA", 1, 15);
        assert_eq!(rows, vec![
            row(1, "A", "N", false),
            row(2, "T", "N", false),
            row(3, "G", "N", false),
            row(7, "C", "A", false),
        ]);

        // flanks outside the window are silent
        let rows = call(b"---CGGATGAAT---", 4, 12);
        assert_eq!(rows, vec![row(7, "C", "A", false)]);

        // partially overlapping window only reports the overlapping flank positions
        let rows = call(b"---CGGCTGAAT---", 3, 13);
        assert_eq!(rows, vec![row(3, "G", "N", false), row(13, "T", "N", false)]);
    }

    #[test]
    fn test_all_gaps() {
        let query = vec![GAP_SYMBOL; REFERENCE.len()];
        let rows = call(&query, 1, 15);
        assert_eq!(rows.len(), 15);
        assert!(rows.iter().all(|(_, _, alt, is_indel)| alt == "N" && !is_indel));
        let positions: Vec<u64> = rows.iter().map(|r| r.0).collect();
        assert_eq!(positions, (1..=15).collect::<Vec<u64>>());

        let rows = call(&query, 4, 6);
        assert_eq!(rows, vec![row(4, "C", "N", false), row(5, "G", "N", false), row(6, "G", "N", false)]);
    }

    #[test]
    fn test_case_sensitive() {
        let rows = call(b"aTGCGGCTGAATTAA", 1, 15);
        assert_eq!(rows, vec![row(1, "A", "a", false)]);
    }

    #[test]
    fn test_called_n_is_snv() {
        let rows = call(b"ATGCGNCTGAATTAA", 1, 15);
        assert_eq!(rows, vec![row(6, "G", "N", false)]);
    }

    #[test]
    fn test_snv_after_deletion() {
        // the base that closes a run can itself be a substitution
        let rows = call(b"ATG--AGTGAATTAA", 1, 15);
        assert_eq!(rows, vec![
            row(4, "", "2D", true),
            row(6, "G", "A", false),
            row(7, "C", "G", false),
        ]);
    }

    #[test]
    fn test_length_mismatch() {
        let window = AnalysisWindow::new(1, 15).unwrap();
        let result = VariantCaller::new("short", REFERENCE, b"ATGC", window);
        assert_eq!(result.err(), Some(CallerError::LengthMismatch {
            sample_id: "short".to_string(), reference_len: 15, query_len: 4
        }));
    }

    #[test]
    fn test_idempotent() {
        let reference = SequenceRecord::new("ref".to_string(), String::from_utf8(REFERENCE.to_vec()).unwrap(), None);
        let query = SequenceRecord::new("q".to_string(), "AC-C---TGAACT--".to_string(), None);
        let window = AnalysisWindow::new(2, 14).unwrap();
        let first = call_record(&reference, &query, window).unwrap();
        let second = call_record(&reference, &query, window).unwrap();
        assert_eq!(first, second);
        assert!(first.iter().all(|r| r.sample_id() == "q"));
    }

    #[test]
    fn test_reconstruction() {
        let window = AnalysisWindow::new(1, 15).unwrap();
        let queries: [&[u8]; 6] = [
            b"AC-C---TGAACT--",
            b"ACGCG---GAATTAA",
            b"---CGGATGAATTAA",
            b"A-G-G-C-G-A-T-A",
            b"TTTTTTTTTTTTTTT",
            b"--GC--CT--AT--A",
        ];
        for query in queries.iter() {
            let rows: Vec<VariantRow> = VariantCaller::new("sample", REFERENCE, query, window).unwrap().collect();
            assert_eq!(&reconstruct(query, &rows), query);

            // rows come out in position order
            assert!(rows.windows(2).all(|w| w[0].position() <= w[1].position()));
        }
    }

    #[test]
    fn test_deletion_runs_match_gaps() {
        // every interior gap run is exactly one deletion row, whatever the window
        let query = b"A-G-G--TG---TTA";
        for (start, end) in [(1, 15), (5, 10), (15, 15), (1, 1)] {
            let rows = call(query, start, end);
            let deletions: Vec<(u64, String)> = rows.iter()
                .filter(|r| r.3)
                .map(|r| (r.0, r.2.clone()))
                .collect();
            assert_eq!(deletions, vec![
                (2, "1D".to_string()), (4, "1D".to_string()), (6, "2D".to_string()), (10, "3D".to_string())
            ]);
        }
    }
}
