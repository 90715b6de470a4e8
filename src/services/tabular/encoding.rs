//! Byte-to-text decoding for tabular text that arrives without a declared
//! encoding.
//!
//! Each candidate in [`CANDIDATE_LABELS`] is decoded strictly; malformed
//! input skips the candidate. Survivors are scored by how much Hangul they
//! produce, and the highest score wins.

use encoding_rs::{Encoding, UTF_8};
use smallvec::SmallVec;

/// Priority order: legacy double-byte code pages first, universal default last.
pub const CANDIDATE_LABELS: [&str; 3] = ["euc-kr", "windows-949", "utf-8"];

/// Script hits above this count end the search early.
pub const CONFIDENT_SCRIPT_HITS: usize = 10;

const SCRIPT_WEIGHT: usize = 10;

pub type RankedCandidates = SmallVec<[CandidateDecoding; 3]>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateDecoding {
    pub encoding_name: &'static str,
    pub decoded_text: String,
    pub script_count: usize,
    pub non_ascii_count: usize,
    pub score: usize,
}

impl CandidateDecoding {
    fn new(encoding: &'static Encoding, decoded_text: String) -> Self {
        let (script_count, non_ascii_count) = count_code_points(&decoded_text);
        Self {
            encoding_name: encoding.name(),
            decoded_text,
            script_count,
            non_ascii_count,
            score: script_count * SCRIPT_WEIGHT + non_ascii_count,
        }
    }

    fn is_confident(&self) -> bool {
        self.script_count > CONFIDENT_SCRIPT_HITS
    }
}

/// Hangul syllables, jamo and compatibility jamo.
pub fn is_target_script(c: char) -> bool {
    matches!(c, '\u{AC00}'..='\u{D7A3}' | '\u{1100}'..='\u{11FF}' | '\u{3130}'..='\u{318F}')
}

/// Returns `(script_count, non_ascii_count)`; replacement characters count as neither.
pub fn count_code_points(text: &str) -> (usize, usize) {
    text.chars()
        .filter(|c| !c.is_ascii() && *c != char::REPLACEMENT_CHARACTER)
        .fold((0, 0), |(script, non_ascii), c| {
            (script + usize::from(is_target_script(c)), non_ascii + 1)
        })
}

/// Decodes `bytes` under every candidate and returns them best first.
///
/// Ties keep priority order. A candidate with more than
/// [`CONFIDENT_SCRIPT_HITS`] script hits is returned at the front right away
/// and later candidates are never decoded.
pub fn rank_candidates(bytes: &[u8]) -> RankedCandidates {
    let mut ranked = RankedCandidates::new();
    let mut tried: SmallVec<[&'static Encoding; 3]> = SmallVec::new();

    for label in CANDIDATE_LABELS {
        let Some(encoding) = Encoding::for_label(label.as_bytes()) else {
            continue;
        };
        // Several labels can resolve to the same decoder.
        if tried.contains(&encoding) {
            continue;
        }
        tried.push(encoding);

        let Some(text) = encoding.decode_without_bom_handling_and_without_replacement(bytes) else {
            tracing::debug!("encoding candidate {} rejected: malformed input", encoding.name());
            continue;
        };

        let candidate = CandidateDecoding::new(encoding, text.into_owned());
        tracing::debug!(
            "encoding candidate {} scored {} ({} script, {} non-ascii)",
            candidate.encoding_name, candidate.score, candidate.script_count, candidate.non_ascii_count
        );

        if candidate.is_confident() {
            ranked.sort_by(|a, b| b.score.cmp(&a.score));
            ranked.insert(0, candidate);
            return ranked;
        }
        ranked.push(candidate);
    }

    ranked.sort_by(|a, b| b.score.cmp(&a.score));
    ranked
}

/// Picks the best decoding for `bytes`. Never fails.
pub fn sniff(bytes: &[u8]) -> CandidateDecoding {
    if bytes.is_empty() {
        return CandidateDecoding::new(UTF_8, String::new());
    }

    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        let (text, _) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
        tracing::debug!("byte order mark selects {}", encoding.name());
        return CandidateDecoding::new(encoding, text.into_owned());
    }

    match rank_candidates(bytes).into_iter().next() {
        Some(best) if best.score > 0 => best,
        _ => {
            let (text, _) = UTF_8.decode_without_bom_handling(bytes);
            CandidateDecoding::new(UTF_8, text.into_owned())
        }
    }
}
