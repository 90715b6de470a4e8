//! NIfTI-1 header summary.
//!
//! Only the fixed 348-byte header is read. `sizeof_hdr` at offset 0 doubles as
//! the validity check: any value other than 348 leaves every field empty.

use std::borrow::Cow;
use std::io::Read;

use byteorder::{ByteOrder, LittleEndian};
use flate2::read::GzDecoder;
use serde_json::Value;

use crate::error::AppError;
use crate::models::{Metadata, NiftiResponse};

pub const NIFTI1_HEADER_SIZE: usize = 348;
const MAX_DIMS: i16 = 7;
const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

/// NIfTI-1 header field byte offsets.
mod offsets {
    pub const SIZEOF_HDR: usize = 0;
    pub const DIM: usize = 40;
    pub const DATATYPE: usize = 70;
    pub const BITPIX: usize = 72;
    pub const PIXDIM: usize = 76;
    pub const VOX_OFFSET: usize = 108;
    pub const DESCRIP: usize = 148;
    pub const DESCRIP_LEN: usize = 80;
    pub const MAGIC: usize = 344;
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NiftiPreview {
    pub is_valid_header: bool,
    pub dimensions: Option<Vec<i16>>,
    pub data_type_code: Option<i16>,
    pub voxel_dimensions: Option<Vec<f32>>,
    pub bitpix: Option<i16>,
    pub vox_offset: Option<f32>,
    pub description: Option<String>,
    pub magic: Option<String>,
}

impl NiftiPreview {
    /// Fills fields one at a time; a failed read leaves that field empty and
    /// keeps everything read before it.
    fn read_fields(&mut self, bytes: &[u8]) {
        use offsets::*;

        self.data_type_code = read_i16(bytes, DATATYPE);
        self.bitpix = read_i16(bytes, BITPIX);

        if let Some(ndim) = read_i16(bytes, DIM).filter(|n| (0..=MAX_DIMS).contains(n)) {
            let ndim = ndim as usize;
            self.dimensions = (1..=ndim)
                .map(|i| read_i16(bytes, DIM + 2 * i))
                .collect();
            self.voxel_dimensions = (1..=ndim)
                .map(|i| read_f32(bytes, PIXDIM + 4 * i))
                .collect();
        }

        self.vox_offset = read_f32(bytes, VOX_OFFSET);
        self.description = bytes
            .get(DESCRIP..DESCRIP + DESCRIP_LEN)
            .map(c_string)
            .filter(|s| !s.is_empty());
        self.magic = bytes.get(MAGIC..MAGIC + 4).map(c_string);
    }
}

fn read_i16(bytes: &[u8], offset: usize) -> Option<i16> {
    bytes.get(offset..offset + 2).map(LittleEndian::read_i16)
}

fn read_f32(bytes: &[u8], offset: usize) -> Option<f32> {
    bytes.get(offset..offset + 4).map(LittleEndian::read_f32)
}

fn c_string(raw: &[u8]) -> String {
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    String::from_utf8_lossy(&raw[..end]).trim().to_string()
}

/// Reads the fixed NIfTI-1 header from uncompressed bytes.
pub fn read_nifti_header(bytes: &[u8]) -> Result<NiftiPreview, AppError> {
    if bytes.len() < NIFTI1_HEADER_SIZE {
        return Err(AppError::BufferTooShort {
            kind: "NIfTI",
            actual: bytes.len(),
            required: NIFTI1_HEADER_SIZE,
        });
    }

    let sizeof_hdr = LittleEndian::read_i32(&bytes[offsets::SIZEOF_HDR..offsets::SIZEOF_HDR + 4]);
    if sizeof_hdr != NIFTI1_HEADER_SIZE as i32 {
        tracing::info!("NIfTI sizeof_hdr is {}, expected {}", sizeof_hdr, NIFTI1_HEADER_SIZE);
        return Ok(NiftiPreview::default());
    }

    let mut preview = NiftiPreview {
        is_valid_header: true,
        ..NiftiPreview::default()
    };
    preview.read_fields(bytes);
    Ok(preview)
}

/// Returns the header bytes, inflating only the first 348 bytes of gzip input.
///
/// A gzip stream that fails to inflate is handed on raw, where it fails the
/// `sizeof_hdr` check instead of erroring.
fn header_bytes(file_data: &[u8]) -> Cow<'_, [u8]> {
    if !file_data.starts_with(&GZIP_MAGIC) {
        return Cow::Borrowed(file_data);
    }

    let mut header = Vec::with_capacity(NIFTI1_HEADER_SIZE);
    match GzDecoder::new(file_data)
        .take(NIFTI1_HEADER_SIZE as u64)
        .read_to_end(&mut header)
    {
        Ok(_) => Cow::Owned(header),
        Err(e) => {
            tracing::warn!("Failed to inflate gzip NIfTI header: {}", e);
            Cow::Borrowed(file_data)
        }
    }
}

pub fn datatype_name(code: i16) -> Option<&'static str> {
    let name = match code {
        1 => "binary",
        2 => "uint8",
        4 => "int16",
        8 => "int32",
        16 => "float32",
        32 => "complex64",
        64 => "float64",
        128 => "rgb24",
        256 => "int8",
        512 => "uint16",
        768 => "uint32",
        1024 => "int64",
        1280 => "uint64",
        1536 => "float128",
        1792 => "complex128",
        2048 => "complex256",
        2304 => "rgba32",
        _ => return None,
    };
    Some(name)
}

/// Builds the NIfTI response for `file_name`, accepting plain or gzip input.
pub fn preview_nifti(file_data: &[u8], file_name: &str, file_extension: &str) -> Result<NiftiResponse, AppError> {
    let header = header_bytes(file_data);
    let preview = read_nifti_header(&header)?;
    tracing::info!("NIfTI header valid: {}", preview.is_valid_header);

    let mut metadata = Metadata::new();
    metadata.insert("fileSize".to_string(), Value::from(file_data.len()));
    metadata.insert("fileName".to_string(), Value::from(file_name));
    metadata.insert("fileExtension".to_string(), Value::from(file_extension));

    let note = if preview.is_valid_header {
        "NIfTI-1 header summary; voxel data is not rendered"
    } else {
        "Not a valid NIfTI-1 header; only file details are shown"
    };
    metadata.insert("note".to_string(), Value::from(note));
    metadata.insert("isValidHeader".to_string(), Value::Bool(preview.is_valid_header));

    if let Some(dimensions) = preview.dimensions {
        metadata.insert("dimensions".to_string(), Value::from(dimensions));
    }
    if let Some(code) = preview.data_type_code {
        metadata.insert("datatype".to_string(), Value::from(code));
        if let Some(name) = datatype_name(code) {
            metadata.insert("datatypeName".to_string(), Value::from(name));
        }
    }
    if let Some(pixdim) = preview.voxel_dimensions {
        let pixdim: Vec<Value> = pixdim.into_iter().map(|v| Value::from(f64::from(v))).collect();
        metadata.insert("pixelDimensions".to_string(), Value::Array(pixdim));
    }
    if let Some(bitpix) = preview.bitpix {
        metadata.insert("bitpix".to_string(), Value::from(bitpix));
    }
    if let Some(vox_offset) = preview.vox_offset {
        metadata.insert("voxOffset".to_string(), Value::from(f64::from(vox_offset)));
    }
    if let Some(magic) = preview.magic {
        metadata.insert("magic".to_string(), Value::from(magic));
    }
    if let Some(description) = preview.description {
        metadata.insert("description".to_string(), Value::from(description));
    }

    Ok(NiftiResponse { metadata })
}
