//! # pdf-autofill
//!
//! A Rust library for filling the interactive form (AcroForm) of an existing PDF.
//!
//! ## What this crate does
//!
//! 1. **List field names**: walks the document's `/AcroForm` field tree and returns
//!    the fully qualified name of every fillable field, so a caller knows which keys
//!    to supply.
//! 2. **Fill a form**: copies the first page of a source PDF into a new document,
//!    assigns the requested field values and sets `NeedAppearances` so viewers
//!    regenerate the visual appearance of every filled field.
//!
//! ## Quick example
//!
//! ```no_run
//! use std::collections::BTreeMap;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let names = pdf_autofill::list_field_names("form.pdf")?;
//! println!("fields: {names:?}");
//!
//! let mut values = BTreeMap::new();
//! values.insert("Name", "Alice");
//! values.insert("Date", "2024-01-01");
//! pdf_autofill::fill("form.pdf", "out.pdf", values)?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use thiserror::Error;

mod appearance;
mod fields;
mod filler;
mod filling;
mod form_field;
mod page_import;
mod pdf_utils;
mod validator;

#[cfg(test)]
mod test_support;

pub use appearance::{ensure_appearance_regeneration, flag_existing_form, AppearanceError};
pub use filler::FormFiller;
pub use filling::FillReport;
pub use form_field::{FieldKind, FormField};

// ── Configuration ────────────────────────────────────────────────────────────

/// What to do with keys of the value mapping that match no field on the
/// copied page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnknownFieldPolicy {
    /// Leave them out silently.
    #[default]
    Ignore,
    /// Log each unknown key at `warn` level and carry on.
    Warn,
    /// Abort with [`FormError::UnknownFields`]; no output is written.
    Error,
}

/// Runtime configuration for [`FormFiller`].
#[derive(Debug, Clone, Default)]
pub struct FillerConfig {
    /// Handling of value-mapping keys that name no field.
    pub unknown_fields: UnknownFieldPolicy,

    /// When `true`, streams of the destination document are compressed before
    /// it is serialized.
    pub compress_output: bool,
}

// ── Error type ───────────────────────────────────────────────────────────────

/// Every error that this crate can produce.
///
/// Failures while setting `NeedAppearances` are reported through
/// [`AppearanceError`] instead and never end up here.
#[derive(Error, Debug)]
pub enum FormError {
    /// A filesystem I/O error occurred (reading the source or writing the
    /// destination).
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// lopdf could not parse the source bytes.
    #[error("PDF parse error: {0}")]
    ParseError(#[from] lopdf::Error),

    /// The document parsed but lacks something filling needs (catalog, pages).
    #[error("Invalid PDF: {0}")]
    InvalidPdf(String),

    /// The document is encrypted.
    #[error("encrypted PDFs are not supported")]
    Encrypted,

    /// The value mapping named fields that do not exist, under
    /// [`UnknownFieldPolicy::Error`].
    #[error("unknown form field(s): {}", .0.join(", "))]
    UnknownFields(Vec<String>),

    /// lopdf failed to serialize the destination document.
    #[error("failed to write PDF: {0}")]
    WriteError(String),
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, FormError>;

// ── Free functions ───────────────────────────────────────────────────────────

/// Fill the form of `source`'s first page with `values` and write a new
/// single-page PDF to `destination`, overwriting any existing file.
///
/// Keys that match no field are ignored; use [`FormFiller::with_config`] for a
/// stricter [`UnknownFieldPolicy`].
pub fn fill<P, Q, I, K, V>(source: P, destination: Q, values: I) -> Result<FillReport>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    FormFiller::from_path(source)?.fill_to_path(destination, values)
}

/// Return the fully qualified names of the fields in `source`'s form, in the
/// order of the form's field tree. A PDF without a form yields an empty list.
pub fn list_field_names<P: AsRef<Path>>(source: P) -> Result<Vec<String>> {
    let names = FormFiller::from_path(&source)?.field_names();
    tracing::info!(
        "Headers needed for data file ({}): {:?}",
        source.as_ref().display(),
        names
    );
    Ok(names)
}

/// Like [`list_field_names`], also reporting each field's kind and current value.
pub fn list_fields<P: AsRef<Path>>(source: P) -> Result<Vec<FormField>> {
    Ok(FormFiller::from_path(source)?.fields())
}
