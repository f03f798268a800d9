//! Place empty signature fields in PDF documents and sign them with a
//! PKCS#12 certificate bundle.
//!
//! Two operations, usually composed in sequence:
//!
//! - [`add_signature_field`] / [`try_add_signature_field`]: insert a named,
//!   empty signature field on a page and overwrite the file in place.
//! - [`sign_field`] / [`try_sign_field`]: fill that field with a visible
//!   appearance and a PKCS#7 detached signature produced from a `.pfx`/`.p12`
//!   bundle, again overwriting the file in place.
//!
//! The `try_*` functions report what went wrong through [`Error`]; the plain
//! functions keep the original boolean contract and log failures instead.
//! For composing several edits before a single write, [`SigningDocument`]
//! exposes the same operations on an already-open document.
//!
//! ```no_run
//! use pdf_digisign::{add_signature_field, sign_field};
//!
//! let graphic = std::fs::read("signature.png").unwrap();
//! assert!(add_signature_field("pdf.pdf", "myfield", 0.5, 0.5, 71.5, 47.5));
//! assert!(sign_field(
//!     "pdf.pdf", "myfield", "reason", "RU", &graphic, "cert.pfx", "password1234",
//! ));
//! ```
//!
//! Both file-level operations write to a temporary file first and then copy
//! it over the original, so a failure mid-write leaves the original
//! untouched; only the final copy is a non-atomic window. Concurrent calls
//! against the same path race on that copy (last writer wins) and need
//! external locking.

mod acro_form;
mod appearance;
mod byte_range;
mod error;
mod field;
mod identity;
mod image_xobject;
mod pdf_object;
mod sign;

pub use appearance::{CertificationLevel, RenderMode, SignatureAppearance};
pub use error::Error;
pub use field::{AnnotationFlags, SignatureFieldOptions};
pub use identity::SigningIdentity;
pub use lopdf;

use lopdf::{Document, ObjectId};
use std::fs;
use std::path::{Path, PathBuf};

/// An open PDF document with signing operations on top.
///
/// This is the "soft" variant of the API: the caller owns the document
/// lifecycle and decides when (and whether) to write anything to disk.
pub struct SigningDocument {
    pub(crate) raw_document: Document,
}

impl SigningDocument {
    pub fn new(raw_document: Document) -> Self {
        SigningDocument { raw_document }
    }

    /// Open a document from a file path.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        Ok(SigningDocument {
            raw_document: Document::load(path).map_err(remap_io)?,
        })
    }

    /// Open a document from bytes already in memory.
    pub fn from_bytes(data: &[u8]) -> Result<Self, Error> {
        Ok(SigningDocument {
            raw_document: Document::load_mem(data).map_err(remap_io)?,
        })
    }

    pub fn get_document_ref(&self) -> &Document {
        &self.raw_document
    }

    pub fn into_document(self) -> Document {
        self.raw_document
    }

    /// Insert an empty signature field. Returns the id of the new widget.
    pub fn add_signature_field(
        &mut self,
        options: &SignatureFieldOptions,
    ) -> Result<ObjectId, Error> {
        field::add_signature_field(&mut self.raw_document, options)
    }

    /// Whether a signature field with this exact name exists.
    pub fn has_field(&self, field_name: &str) -> bool {
        matches!(
            acro_form::find_signature_field(&self.raw_document, field_name),
            Ok(Some(_))
        )
    }

    /// Persist the document to `path` via a temporary file and copy-over.
    pub fn write_in_place(&mut self, path: impl AsRef<Path>) -> Result<(), Error> {
        let raw_document = &mut self.raw_document;
        persist_via_temp(path.as_ref(), |temp| {
            raw_document.save(temp)?;
            Ok(())
        })
    }
}

/// Add an empty signature field to the document at `path`, overwriting the
/// file in place.
pub fn try_add_signature_field(
    path: impl AsRef<Path>,
    options: &SignatureFieldOptions,
) -> Result<(), Error> {
    let mut document = SigningDocument::load(path.as_ref())?;
    document.add_signature_field(options)?;
    document.write_in_place(path)
}

/// Sign the named field in the document at `path` with the identity from the
/// PKCS#12 store, overwriting the file in place.
///
/// The field must already exist; a missing field, a bad store, or a wrong
/// password all fail before anything is written.
pub fn try_sign_field(
    path: impl AsRef<Path>,
    field_name: &str,
    appearance: &SignatureAppearance,
    cert_file: impl AsRef<Path>,
    cert_password: &str,
) -> Result<(), Error> {
    let mut document = SigningDocument::load(path.as_ref())?;
    if acro_form::find_signature_field(&document.raw_document, field_name)?.is_none() {
        return Err(Error::FieldNotFound(field_name.to_owned()));
    }
    let identity = SigningIdentity::from_pkcs12_file(cert_file, cert_password)?;
    let signed_data = document.sign_field(field_name, appearance, &identity)?;
    persist_via_temp(path.as_ref(), |temp| {
        fs::write(temp, &signed_data)?;
        Ok(())
    })
}

/// Boolean variant of [`try_add_signature_field`] with the original
/// defaults: page 1, printable, black border, white background. Failures are
/// logged and collapse to `false`.
pub fn add_signature_field(
    path: impl AsRef<Path>,
    field_name: &str,
    x: f32,
    y: f32,
    width: f32,
    height: f32,
) -> bool {
    let options = SignatureFieldOptions::new(field_name, x, y, width, height);
    log_outcome(
        "add_signature_field",
        try_add_signature_field(path, &options),
    )
}

/// Boolean variant of [`try_sign_field`] with the original defaults:
/// graphic-and-description rendering, certified no-changes-allowed.
/// Failures are logged and collapse to `false`.
pub fn sign_field(
    path: impl AsRef<Path>,
    field_name: &str,
    reason: &str,
    location: &str,
    graphic_png: &[u8],
    cert_file: impl AsRef<Path>,
    cert_password: &str,
) -> bool {
    let appearance = SignatureAppearance::new(reason, location).with_graphic(graphic_png.to_vec());
    log_outcome(
        "sign_field",
        try_sign_field(path, field_name, &appearance, cert_file, cert_password),
    )
}

fn log_outcome(operation: &str, result: Result<(), Error>) -> bool {
    match result {
        Ok(()) => true,
        Err(err) => {
            log::error!("{} failed: {}", operation, err);
            false
        }
    }
}

/// `lopdf` wraps io errors; unwrap them so callers see [`Error::Io`] for
/// unreadable files rather than a generic pdf error.
fn remap_io(err: lopdf::Error) -> Error {
    match err {
        lopdf::Error::IO(err) => Error::Io(err),
        other => Error::Pdf(other),
    }
}

fn temp_output_path() -> PathBuf {
    std::env::temp_dir().join(format!(
        "{}-{:016x}.pdf",
        env!("CARGO_PKG_NAME"),
        rand::random::<u64>()
    ))
}

/// Run `write` against a temporary path, then copy the result over `target`.
/// The temporary file is removed on every outcome; a failure before the copy
/// leaves `target` untouched.
fn persist_via_temp(
    target: &Path,
    write: impl FnOnce(&Path) -> Result<(), Error>,
) -> Result<(), Error> {
    let temp = temp_output_path();
    let result = write(&temp).and_then(|_| {
        fs::copy(&temp, target)?;
        Ok(())
    });
    let _ = fs::remove_file(&temp);
    result
}
