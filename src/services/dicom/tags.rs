use std::collections::HashMap;
use once_cell::sync::Lazy;

/// One metadata field the scanner looks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DicomTagSpec {
    pub group: u16,
    pub element: u16,
    pub display_name: &'static str,
    /// Expected VR, used when the element itself declares `UN`.
    pub value_representation: Option<&'static str>,
}

const fn tag(group: u16, element: u16, display_name: &'static str, vr: &'static str) -> DicomTagSpec {
    DicomTagSpec {
        group,
        element,
        display_name,
        value_representation: Some(vr),
    }
}

pub const TAG_COUNT: usize = 21;

pub static DICOM_TAGS: [DicomTagSpec; TAG_COUNT] = [
    tag(0x0008, 0x0020, "Study Date", "DA"),
    tag(0x0008, 0x0030, "Study Time", "TM"),
    tag(0x0008, 0x0060, "Modality", "CS"),
    tag(0x0008, 0x0070, "Manufacturer", "LO"),
    tag(0x0008, 0x1030, "Study Description", "LO"),
    tag(0x0008, 0x103E, "Series Description", "LO"),
    tag(0x0010, 0x0010, "Patient Name", "PN"),
    tag(0x0010, 0x0020, "Patient ID", "LO"),
    tag(0x0010, 0x0030, "Patient Birth Date", "DA"),
    tag(0x0010, 0x0040, "Patient Sex", "CS"),
    tag(0x0010, 0x1010, "Patient Age", "AS"),
    tag(0x0018, 0x0015, "Body Part Examined", "CS"),
    tag(0x0018, 0x0050, "Slice Thickness", "DS"),
    tag(0x0020, 0x000D, "Study Instance UID", "UI"),
    tag(0x0020, 0x000E, "Series Instance UID", "UI"),
    tag(0x0020, 0x0011, "Series Number", "IS"),
    tag(0x0020, 0x0013, "Instance Number", "IS"),
    tag(0x0028, 0x0010, "Rows", "US"),
    tag(0x0028, 0x0011, "Columns", "US"),
    tag(0x0028, 0x0030, "Pixel Spacing", "DS"),
    tag(0x0028, 0x0100, "Bits Allocated", "US"),
];

// Found tags are tracked in a u32 bitmask.
const _: () = assert!(TAG_COUNT <= 32);

static TAG_INDEX: Lazy<HashMap<(u16, u16), usize>> = Lazy::new(|| {
    DICOM_TAGS
        .iter()
        .enumerate()
        .map(|(idx, spec)| ((spec.group, spec.element), idx))
        .collect()
});

/// Position of `(group, element)` in [`DICOM_TAGS`].
pub fn lookup(group: u16, element: u16) -> Option<usize> {
    TAG_INDEX.get(&(group, element)).copied()
}

/// VRs whose length field is 2 reserved bytes followed by a 4-byte length.
const LONG_FORM_VRS: [&[u8; 2]; 13] = [
    b"OB", b"OD", b"OF", b"OL", b"OV", b"OW", b"SQ", b"SV", b"UC", b"UN", b"UR", b"UT", b"UV",
];

pub fn is_long_form(vr: &[u8; 2]) -> bool {
    LONG_FORM_VRS.contains(&vr)
}

/// Fixed-width binary encodings the scanner decodes as numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericKind {
    U16,
    U32,
    I16,
    I32,
    F32,
    F64,
}

impl NumericKind {
    pub fn for_vr(vr: &[u8; 2]) -> Option<Self> {
        match vr {
            b"US" => Some(Self::U16),
            b"UL" => Some(Self::U32),
            b"SS" => Some(Self::I16),
            b"SL" => Some(Self::I32),
            b"FL" => Some(Self::F32),
            b"FD" => Some(Self::F64),
            _ => None,
        }
    }

    pub const fn width(self) -> usize {
        match self {
            Self::U16 | Self::I16 => 2,
            Self::U32 | Self::I32 | Self::F32 => 4,
            Self::F64 => 8,
        }
    }
}
