//! Read side of the form model: find signature fields in
//! `Root -> AcroForm -> Fields` and tell empty ones from signed ones.

use crate::pdf_object::{as_number, PdfObjectDeref};
use crate::Error;
use lopdf::{Document, Object, ObjectId};

/// A `/FT /Sig` entry in the document's field list.
#[derive(Debug, Clone)]
pub(crate) struct SignatureField {
    object_id: ObjectId,
    name: Option<String>,
    signed: bool,
}

impl SignatureField {
    pub(crate) fn object_id(&self) -> ObjectId {
        self.object_id
    }

    pub(crate) fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub(crate) fn is_signed(&self) -> bool {
        self.signed
    }

    /// The widget rectangle, `[x1, y1, x2, y2]` in user-space units.
    ///
    /// Merged field/widget dictionaries carry `/Rect` directly; split fields
    /// keep it on a `/Kids` annotation.
    pub(crate) fn rectangle(&self, doc: &Document) -> Result<[f32; 4], Error> {
        let field_dict = doc.get_object(self.object_id)?.as_dict()?;
        if field_dict.has(b"Rect") {
            return rect_from_array(field_dict.get(b"Rect")?.deref(doc)?.as_array()?);
        }
        if field_dict.has(b"Kids") {
            for child in field_dict.get(b"Kids")?.deref(doc)?.as_array()? {
                let child_dict = child.deref(doc)?.as_dict()?;
                if child_dict.has(b"Rect") {
                    return rect_from_array(child_dict.get(b"Rect")?.deref(doc)?.as_array()?);
                }
            }
        }
        Err(Error::Other(format!(
            "signature field `{}` has no widget rectangle",
            self.name.as_deref().unwrap_or("")
        )))
    }
}

fn rect_from_array(array: &[Object]) -> Result<[f32; 4], Error> {
    if array.len() < 4 {
        return Err(Error::Pdf(lopdf::Error::Type));
    }
    Ok([
        as_number(&array[0])?,
        as_number(&array[1])?,
        as_number(&array[2])?,
        as_number(&array[3])?,
    ])
}

/// Load every signature field in the document.
///
/// Non-signature fields (`Btn`, `Tx`, `Ch`, ...) are skipped. A signature
/// counts as signed once its `/V` dictionary carries `/Filter` or
/// `/Contents`.
pub(crate) fn load_signature_fields(doc: &Document) -> Result<Vec<SignatureField>, Error> {
    // Structure: Root (dict) -> AcroForm (dict) -> Fields (array of refs)
    let root = doc.trailer.get(b"Root")?.deref(doc)?.as_dict()?;

    if !root.has(b"AcroForm") {
        log::info!("Document does not contain any forms.");
        return Ok(vec![]);
    }
    let acro_form_dict = root.get(b"AcroForm")?.deref(doc)?.as_dict()?;
    let field_list = acro_form_dict.get(b"Fields")?.deref(doc)?.as_array()?;

    let mut fields = vec![];
    for field in field_list {
        let Some(object_id) = field.get_object_id() else {
            log::warn!("AcroForm field is not an indirect reference, skipped.");
            continue;
        };
        let field_dict = field.deref(doc)?.as_dict()?;
        if !field_dict.has(b"FT") || field_dict.get(b"FT")?.as_name()? != b"Sig" {
            continue;
        }

        let signed = if field_dict.has(b"V") {
            let value_dict = field_dict.get(b"V")?.deref(doc)?.as_dict()?;
            value_dict.has(b"Filter") || value_dict.has(b"Contents")
        } else {
            false
        };

        let name = if field_dict.has(b"T") {
            Some(String::from_utf8_lossy(field_dict.get(b"T")?.as_str()?).into_owned())
        } else {
            None
        };

        fields.push(SignatureField {
            object_id,
            name,
            signed,
        });
    }
    Ok(fields)
}

/// Find a signature field by exact `/T` match.
pub(crate) fn find_signature_field(
    doc: &Document,
    field_name: &str,
) -> Result<Option<SignatureField>, Error> {
    Ok(load_signature_fields(doc)?
        .into_iter()
        .find(|field| field.name() == Some(field_name)))
}
