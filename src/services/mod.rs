pub mod dicom;
pub mod file_loader;
pub mod nifti;
pub mod preview;
pub mod tabular;

pub use preview::{classify, render_preview, FileCategory};
