//! Write side of field placement: build the merged signature field/widget
//! annotation and register it on the page and in the catalog's AcroForm.

use crate::Error;
use bitflags::bitflags;
use lopdf::{dictionary, Document, Object, ObjectId, StringFormat};

bitflags! {
    /// Annotation flags, table 165 in the PDF 1.7 spec.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct AnnotationFlags: u32 {
        const INVISIBLE = 1 << 0;
        const HIDDEN = 1 << 1;
        const PRINT = 1 << 2;
        const NO_ZOOM = 1 << 3;
        const NO_ROTATE = 1 << 4;
        const NO_VIEW = 1 << 5;
        const READ_ONLY = 1 << 6;
        const LOCKED = 1 << 7;
    }
}

/// Geometry and presentation of a signature field to be placed.
///
/// Defaults match the original wrapper: page 1, printable, black border,
/// white background.
#[derive(Debug, Clone)]
pub struct SignatureFieldOptions {
    pub name: String,
    /// 1-based page number.
    pub page: u32,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub flags: AnnotationFlags,
    /// RGB border color for the widget's `/MK` dictionary.
    pub border_color: [f32; 3],
    /// RGB background color for the widget's `/MK` dictionary.
    pub background_color: [f32; 3],
}

impl SignatureFieldOptions {
    pub fn new(name: impl Into<String>, x: f32, y: f32, width: f32, height: f32) -> Self {
        SignatureFieldOptions {
            name: name.into(),
            page: 1,
            x,
            y,
            width,
            height,
            flags: AnnotationFlags::PRINT,
            border_color: [0.0, 0.0, 0.0],
            background_color: [1.0, 1.0, 1.0],
        }
    }

    pub fn on_page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    pub fn with_flags(mut self, flags: AnnotationFlags) -> Self {
        self.flags = flags;
        self
    }
}

fn color_array(color: [f32; 3]) -> Object {
    Object::Array(color.iter().map(|c| Object::Real(*c)).collect())
}

/// Insert an empty signature field into the document.
///
/// The field and its widget are one merged dictionary, referenced from both
/// the page `/Annots` and the AcroForm `/Fields`. Duplicate names are not
/// checked; placing the same name twice yields two widgets.
pub(crate) fn add_signature_field(
    doc: &mut Document,
    options: &SignatureFieldOptions,
) -> Result<ObjectId, Error> {
    let page_id = *doc
        .get_pages()
        .get(&options.page)
        .ok_or(Error::PageNotFound(options.page))?;

    let field_dict = dictionary! {
        "Type" => "Annot",
        "Subtype" => "Widget",
        "FT" => "Sig",
        "T" => Object::String(options.name.as_bytes().to_vec(), StringFormat::Literal),
        "Rect" => Object::Array(vec![
            options.x.into(),
            options.y.into(),
            (options.x + options.width).into(),
            (options.y + options.height).into(),
        ]),
        "F" => i64::from(options.flags.bits()),
        "P" => Object::Reference(page_id),
        "MK" => dictionary! {
            "BC" => color_array(options.border_color),
            "BG" => color_array(options.background_color),
        },
    };
    let field_id = doc.add_object(field_dict);

    add_to_page_annots(doc, page_id, field_id)?;
    add_to_acro_form_fields(doc, field_id)?;

    Ok(field_id)
}

/// Append the widget reference to the page's `/Annots`, creating the array
/// when missing and following an indirect reference when present.
fn add_to_page_annots(doc: &mut Document, page_id: ObjectId, field_id: ObjectId) -> Result<(), Error> {
    let page_dict = doc.get_object(page_id)?.as_dict()?;
    let annots_ref = if page_dict.has(b"Annots") {
        page_dict.get(b"Annots")?.as_reference().ok()
    } else {
        None
    };

    match annots_ref {
        Some(annots_id) => {
            let annots = doc.get_object_mut(annots_id)?.as_array_mut()?;
            annots.push(Object::Reference(field_id));
        }
        None => {
            let page_dict = doc.get_object_mut(page_id)?.as_dict_mut()?;
            if page_dict.has(b"Annots") {
                page_dict
                    .get_mut(b"Annots")?
                    .as_array_mut()?
                    .push(Object::Reference(field_id));
            } else {
                page_dict.set("Annots", vec![Object::Reference(field_id)]);
            }
        }
    }
    Ok(())
}

/// Append the field reference to `Root -> AcroForm -> Fields`, creating the
/// AcroForm (with `/SigFlags 3`: signatures exist, append-only) when the
/// document has none.
fn add_to_acro_form_fields(doc: &mut Document, field_id: ObjectId) -> Result<(), Error> {
    let root_id = doc.trailer.get(b"Root")?.as_reference()?;
    let root = doc.get_object(root_id)?.as_dict()?;

    if !root.has(b"AcroForm") {
        let acro_form_id = doc.add_object(dictionary! {
            "Fields" => vec![Object::Reference(field_id)],
            "SigFlags" => 3,
        });
        let root = doc.get_object_mut(root_id)?.as_dict_mut()?;
        root.set("AcroForm", Object::Reference(acro_form_id));
        return Ok(());
    }

    let acro_form_ref = root.get(b"AcroForm")?.as_reference().ok();
    let acro_form = match acro_form_ref {
        Some(acro_form_id) => doc.get_object_mut(acro_form_id)?.as_dict_mut()?,
        None => {
            let root = doc.get_object_mut(root_id)?.as_dict_mut()?;
            root.get_mut(b"AcroForm")?.as_dict_mut()?
        }
    };

    if acro_form.has(b"Fields") {
        // A `Fields` array held behind a reference would need another
        // two-phase lookup; handled below.
        if let Ok(fields) = acro_form.get_mut(b"Fields").and_then(|obj| obj.as_array_mut()) {
            fields.push(Object::Reference(field_id));
            acro_form.set("SigFlags", 3);
            return Ok(());
        }
    } else {
        acro_form.set("Fields", vec![Object::Reference(field_id)]);
        acro_form.set("SigFlags", 3);
        return Ok(());
    }

    // `Fields` is an indirect array.
    let fields_id = match acro_form_ref {
        Some(acro_form_id) => doc
            .get_object(acro_form_id)?
            .as_dict()?
            .get(b"Fields")?
            .as_reference()?,
        None => doc
            .get_object(root_id)?
            .as_dict()?
            .get(b"AcroForm")?
            .as_dict()?
            .get(b"Fields")?
            .as_reference()?,
    };
    doc.get_object_mut(fields_id)?
        .as_array_mut()?
        .push(Object::Reference(field_id));
    let acro_form = match acro_form_ref {
        Some(acro_form_id) => doc.get_object_mut(acro_form_id)?.as_dict_mut()?,
        None => doc
            .get_object_mut(root_id)?
            .as_dict_mut()?
            .get_mut(b"AcroForm")?
            .as_dict_mut()?,
    };
    acro_form.set("SigFlags", 3);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_are_printable_on_page_one() {
        let options = SignatureFieldOptions::new("sig", 1.0, 2.0, 30.0, 40.0);
        assert_eq!(options.page, 1);
        assert_eq!(options.flags, AnnotationFlags::PRINT);
        assert_eq!(options.border_color, [0.0, 0.0, 0.0]);
        assert_eq!(options.background_color, [1.0, 1.0, 1.0]);
    }

    #[test]
    fn flags_map_to_pdf_bits() {
        assert_eq!(AnnotationFlags::PRINT.bits(), 4);
        assert_eq!(
            (AnnotationFlags::PRINT | AnnotationFlags::LOCKED).bits(),
            132
        );
    }
}
