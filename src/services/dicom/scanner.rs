//! Bounded linear walk over an explicit-VR little-endian DICOM buffer.
//!
//! This is not a conforming tag walk: a tag that is not in the table is
//! skipped by four bytes rather than by its value length. The scan relies on
//! its budgets (window, miss ceiling, value length) to terminate.

use byteorder::{ByteOrder, LittleEndian};
use serde_json::Value;

use super::tags::{is_long_form, lookup, DicomTagSpec, NumericKind, DICOM_TAGS, TAG_COUNT};

/// Offset of the `DICM` magic; the preamble before it is ignored.
pub const PREAMBLE_LEN: usize = 128;
pub const DICM_MAGIC: &[u8; 4] = b"DICM";
/// First byte after the magic, where scanning starts.
pub const DATA_START: usize = PREAMBLE_LEN + DICM_MAGIC.len();

/// Bytes from the start of the buffer that may hold a tag.
pub const SCAN_WINDOW: usize = 20_000;
pub const MAX_CONSECUTIVE_MISSES: usize = 100;
/// Values of this length or more are treated as a false match.
pub const MAX_VALUE_LEN: usize = 5_000;
pub const MAX_TEXT_CHARS: usize = 200;

const SHORT_HEADER_LEN: usize = 8;
const LONG_HEADER_LEN: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    AllTagsFound,
    WindowExhausted,
    MissCeiling,
    OutOfBounds,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TagValue {
    Text(String),
    Integer(i64),
    Float(f64),
}

impl From<TagValue> for Value {
    fn from(value: TagValue) -> Self {
        match value {
            TagValue::Text(s) => Value::String(s),
            TagValue::Integer(i) => Value::from(i),
            TagValue::Float(f) => Value::from(f),
        }
    }
}

/// Scan position plus the budgets that bound it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanCursor {
    pub position: usize,
    pub window_end: usize,
    pub consecutive_misses: usize,
    found: u32,
}

impl ScanCursor {
    pub fn new(buffer_len: usize) -> Self {
        Self::at(DATA_START, buffer_len)
    }

    pub fn at(position: usize, buffer_len: usize) -> Self {
        Self {
            position,
            window_end: buffer_len.min(SCAN_WINDOW),
            consecutive_misses: 0,
            found: 0,
        }
    }

    pub fn remaining_budget(&self) -> usize {
        self.window_end.saturating_sub(self.position)
    }

    pub fn found_count(&self) -> usize {
        self.found.count_ones() as usize
    }

    pub fn is_found(&self, index: usize) -> bool {
        self.found & (1 << index) != 0
    }

    fn missed(self) -> Self {
        Self {
            position: self.position + 4,
            consecutive_misses: self.consecutive_misses + 1,
            ..self
        }
    }

    fn matched(self, index: usize, next_position: usize) -> Self {
        Self {
            position: next_position,
            consecutive_misses: 0,
            found: self.found | (1 << index),
            ..self
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScanStep {
    /// A table tag was read; `value` is `None` for an empty element.
    Matched {
        next: ScanCursor,
        index: usize,
        value: Option<TagValue>,
    },
    Missed(ScanCursor),
    Halted(StopReason),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DicomScan {
    /// `(table index, value)` in discovery order.
    pub found: Vec<(usize, TagValue)>,
    pub stop_reason: StopReason,
    pub final_position: usize,
}

struct Element {
    vr: [u8; 2],
    value_start: usize,
    value_len: usize,
}

enum ElementRead {
    Ok(Element),
    Oversized,
    OutOfBounds,
}

/// Advances the scan by one tag position.
pub fn scan_step(bytes: &[u8], cursor: ScanCursor) -> ScanStep {
    if cursor.found_count() >= TAG_COUNT {
        return ScanStep::Halted(StopReason::AllTagsFound);
    }
    if cursor.consecutive_misses > MAX_CONSECUTIVE_MISSES {
        return ScanStep::Halted(StopReason::MissCeiling);
    }
    if cursor.remaining_budget() < 4 {
        return ScanStep::Halted(StopReason::WindowExhausted);
    }

    let pos = cursor.position;
    let (Some(group), Some(element)) = (read_u16(bytes, pos), read_u16(bytes, pos + 2)) else {
        return ScanStep::Halted(StopReason::OutOfBounds);
    };

    let index = match lookup(group, element) {
        Some(index) if !cursor.is_found(index) => index,
        _ => return ScanStep::Missed(cursor.missed()),
    };

    match read_element(bytes, pos) {
        ElementRead::Ok(el) => {
            let raw = &bytes[el.value_start..el.value_start + el.value_len];
            let value = (!raw.is_empty()).then(|| decode_value(&DICOM_TAGS[index], &el.vr, raw));
            ScanStep::Matched {
                next: cursor.matched(index, el.value_start + el.value_len),
                index,
                value,
            }
        }
        ElementRead::Oversized => ScanStep::Missed(cursor.missed()),
        ElementRead::OutOfBounds => ScanStep::Halted(StopReason::OutOfBounds),
    }
}

/// Runs [`scan_step`] from the first byte after the magic until it halts.
///
/// Tags found before the halt are always kept.
pub fn scan_tags(bytes: &[u8]) -> DicomScan {
    let mut cursor = ScanCursor::new(bytes.len());
    let mut found = Vec::new();

    loop {
        match scan_step(bytes, cursor) {
            ScanStep::Matched { next, index, value } => {
                if let Some(value) = value {
                    found.push((index, value));
                }
                cursor = next;
            }
            ScanStep::Missed(next) => cursor = next,
            ScanStep::Halted(stop_reason) => {
                return DicomScan {
                    found,
                    stop_reason,
                    final_position: cursor.position,
                };
            }
        }
    }
}

fn read_u16(bytes: &[u8], pos: usize) -> Option<u16> {
    bytes.get(pos..pos.checked_add(2)?).map(LittleEndian::read_u16)
}

fn read_u32(bytes: &[u8], pos: usize) -> Option<u32> {
    bytes.get(pos..pos.checked_add(4)?).map(LittleEndian::read_u32)
}

/// Reads the VR and length that follow the tag at `pos`.
///
/// Short-form VRs carry a 2-byte length right after the VR. Long-form VRs
/// have 2 reserved bytes, then a 4-byte length.
fn read_element(bytes: &[u8], pos: usize) -> ElementRead {
    let Some(vr) = bytes.get(pos + 4..pos + 6) else {
        return ElementRead::OutOfBounds;
    };
    let vr = [vr[0], vr[1]];

    let header = if is_long_form(&vr) {
        read_u32(bytes, pos + 8).map(|len| (LONG_HEADER_LEN, len as usize))
    } else {
        read_u16(bytes, pos + 6).map(|len| (SHORT_HEADER_LEN, len as usize))
    };
    let Some((header_len, value_len)) = header else {
        return ElementRead::OutOfBounds;
    };

    if value_len >= MAX_VALUE_LEN {
        return ElementRead::Oversized;
    }
    let value_start = pos + header_len;
    if value_start + value_len > bytes.len() {
        return ElementRead::OutOfBounds;
    }

    ElementRead::Ok(Element { vr, value_start, value_len })
}

fn decode_value(spec: &DicomTagSpec, vr: &[u8; 2], raw: &[u8]) -> TagValue {
    let effective = match (vr, spec.value_representation) {
        (b"UN", Some(expected)) if expected.len() == 2 => {
            let expected = expected.as_bytes();
            [expected[0], expected[1]]
        }
        _ => *vr,
    };

    match NumericKind::for_vr(&effective) {
        Some(kind) if raw.len() >= kind.width() => decode_numeric(kind, raw),
        _ => decode_text(raw),
    }
}

fn decode_numeric(kind: NumericKind, raw: &[u8]) -> TagValue {
    match kind {
        NumericKind::U16 => TagValue::Integer(LittleEndian::read_u16(raw).into()),
        NumericKind::U32 => TagValue::Integer(LittleEndian::read_u32(raw).into()),
        NumericKind::I16 => TagValue::Integer(LittleEndian::read_i16(raw).into()),
        NumericKind::I32 => TagValue::Integer(LittleEndian::read_i32(raw).into()),
        NumericKind::F32 => TagValue::Float(LittleEndian::read_f32(raw).into()),
        NumericKind::F64 => TagValue::Float(LittleEndian::read_f64(raw)),
    }
}

fn decode_text(raw: &[u8]) -> TagValue {
    let text = String::from_utf8_lossy(raw);
    let trimmed = text.trim_end_matches(|c: char| c == '\0' || c == ' ').trim();
    TagValue::Text(trimmed.chars().take(MAX_TEXT_CHARS).collect())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn element(group: u16, element: u16, vr: &[u8; 2], value: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&group.to_le_bytes());
        out.extend_from_slice(&element.to_le_bytes());
        out.extend_from_slice(vr);
        if is_long_form(vr) {
            out.extend_from_slice(&[0, 0]);
            out.extend_from_slice(&(value.len() as u32).to_le_bytes());
        } else {
            out.extend_from_slice(&(value.len() as u16).to_le_bytes());
        }
        out.extend_from_slice(value);
        out
    }

    pub(crate) fn dicom(body: &[u8]) -> Vec<u8> {
        let mut out = vec![0u8; PREAMBLE_LEN];
        out.extend_from_slice(DICM_MAGIC);
        out.extend_from_slice(body);
        out
    }

    fn text_of(scan: &DicomScan, index: usize) -> Option<TagValue> {
        scan.found.iter().find(|(i, _)| *i == index).map(|(_, v)| v.clone())
    }

    #[test]
    fn short_form_text_is_trimmed() {
        let bytes = dicom(&element(0x0010, 0x0010, b"PN", b"DOE^JOHN\0\0"));
        let scan = scan_tags(&bytes);
        assert_eq!(text_of(&scan, 6), Some(TagValue::Text("DOE^JOHN".to_string())));
    }

    #[test]
    fn numeric_vrs_decode_as_numbers() {
        let mut body = element(0x0028, 0x0010, b"US", &512u16.to_le_bytes());
        body.extend(element(0x0028, 0x0011, b"US", &256u16.to_le_bytes()));
        let scan = scan_tags(&dicom(&body));
        assert_eq!(text_of(&scan, 17), Some(TagValue::Integer(512)));
        assert_eq!(text_of(&scan, 18), Some(TagValue::Integer(256)));
    }

    #[test]
    fn signed_vrs_keep_their_sign() {
        let mut body = element(0x0028, 0x0010, b"SS", &(-5i16).to_le_bytes());
        body.extend(element(0x0020, 0x0013, b"SL", &(-70_000i32).to_le_bytes()));
        let scan = scan_tags(&dicom(&body));
        assert_eq!(text_of(&scan, 17), Some(TagValue::Integer(-5)));
        assert_eq!(text_of(&scan, 16), Some(TagValue::Integer(-70_000)));
    }

    #[test]
    fn float_vrs_decode_as_floats() {
        let mut body = element(0x0018, 0x0050, b"FD", &2.5f64.to_le_bytes());
        body.extend(element(0x0028, 0x0030, b"FL", &0.75f32.to_le_bytes()));
        let scan = scan_tags(&dicom(&body));
        assert_eq!(text_of(&scan, 12), Some(TagValue::Float(2.5)));
        assert_eq!(text_of(&scan, 19), Some(TagValue::Float(0.75)));

        let metadata: Value = text_of(&scan, 12).map(Value::from).unwrap_or(Value::Null);
        assert_eq!(metadata, serde_json::json!(2.5));
    }

    #[test]
    fn long_form_length_skips_reserved_bytes() {
        let mut body = element(0x0008, 0x1030, b"UT", b"BRAIN MRI");
        body.extend(element(0x0008, 0x0060, b"CS", b"MR"));
        let scan = scan_tags(&dicom(&body));
        assert_eq!(text_of(&scan, 4), Some(TagValue::Text("BRAIN MRI".to_string())));
        assert_eq!(text_of(&scan, 2), Some(TagValue::Text("MR".to_string())));
    }

    #[test]
    fn unknown_vr_falls_back_to_table_vr() {
        let body = element(0x0028, 0x0100, b"UN", &16u16.to_le_bytes());
        let scan = scan_tags(&dicom(&body));
        assert_eq!(text_of(&scan, 20), Some(TagValue::Integer(16)));
    }

    #[test]
    fn long_text_is_truncated() {
        let value = vec![b'A'; 300];
        let scan = scan_tags(&dicom(&element(0x0008, 0x103E, b"LO", &value)));
        match text_of(&scan, 5) {
            Some(TagValue::Text(s)) => assert_eq!(s.len(), MAX_TEXT_CHARS),
            other => panic!("unexpected value {:?}", other),
        }
    }

    #[test]
    fn miss_ceiling_stops_drifting_scan() {
        let tag = element(0x0010, 0x0020, b"LO", b"ID42");

        let mut reachable = vec![0u8; 4 * MAX_CONSECUTIVE_MISSES];
        reachable.extend(&tag);
        let scan = scan_tags(&dicom(&reachable));
        assert_eq!(text_of(&scan, 7), Some(TagValue::Text("ID42".to_string())));

        let mut unreachable = vec![0u8; 4 * (MAX_CONSECUTIVE_MISSES + 1)];
        unreachable.extend(&tag);
        let scan = scan_tags(&dicom(&unreachable));
        assert!(scan.found.is_empty());
        assert_eq!(scan.stop_reason, StopReason::MissCeiling);
    }

    #[test]
    fn out_of_bounds_value_keeps_earlier_tags() {
        let mut body = element(0x0008, 0x0060, b"CS", b"CT");
        let mut truncated = element(0x0010, 0x0010, b"PN", b"SMITH^ANNA");
        truncated.truncate(truncated.len() - 4);
        body.extend(truncated);

        let scan = scan_tags(&dicom(&body));
        assert_eq!(scan.stop_reason, StopReason::OutOfBounds);
        assert_eq!(scan.found, vec![(2, TagValue::Text("CT".to_string()))]);
    }

    #[test]
    fn oversized_value_is_treated_as_a_miss() {
        let mut bytes = dicom(&element(0x0008, 0x0070, b"UT", &vec![b'x'; MAX_VALUE_LEN]));
        bytes.extend(element(0x0008, 0x0020, b"DA", b"20240102"));
        let cursor = ScanCursor::new(bytes.len());
        match scan_step(&bytes, cursor) {
            ScanStep::Missed(next) => {
                assert_eq!(next.position, DATA_START + 4);
                assert_eq!(next.consecutive_misses, 1);
            }
            other => panic!("unexpected step {:?}", other),
        }
    }

    #[test]
    fn found_tags_are_not_matched_twice() {
        let mut body = element(0x0008, 0x0060, b"CS", b"CT");
        body.extend(element(0x0008, 0x0060, b"CS", b"MR"));
        let scan = scan_tags(&dicom(&body));
        assert_eq!(scan.found, vec![(2, TagValue::Text("CT".to_string()))]);
    }

    #[test]
    fn empty_value_marks_tag_found_without_value() {
        let bytes = dicom(&element(0x0010, 0x0040, b"CS", b""));
        let cursor = ScanCursor::new(bytes.len());
        match scan_step(&bytes, cursor) {
            ScanStep::Matched { next, index, value } => {
                assert_eq!(index, 9);
                assert!(value.is_none());
                assert!(next.is_found(9));
                assert_eq!(next.position, DATA_START + 8);
            }
            other => panic!("unexpected step {:?}", other),
        }
    }

    #[test]
    fn every_table_tag_found_ends_scan() {
        let body: Vec<u8> = DICOM_TAGS
            .iter()
            .flat_map(|spec| element(spec.group, spec.element, b"LO", b"AB"))
            .collect();
        let scan = scan_tags(&dicom(&body));
        assert_eq!(scan.found.len(), TAG_COUNT);
        assert_eq!(scan.stop_reason, StopReason::AllTagsFound);
    }

    #[test]
    fn window_bounds_tag_reads() {
        let cursor = ScanCursor::at(SCAN_WINDOW - 2, 30_000);
        assert_eq!(scan_step(&vec![0u8; 30_000], cursor), ScanStep::Halted(StopReason::WindowExhausted));
    }
}
