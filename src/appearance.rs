//! Visual signature appearance: the Form XObject bound to the widget's
//! `/AP /N` once a field is signed.

use crate::image_xobject::ImageXObject;
use crate::Error;
use chrono::Utc;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream, StringFormat};

/// What the filled field shows, mirroring iText's `SignatureRender` choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    /// Text block only.
    Description,
    /// Graphic only, stretched over the whole field.
    Graphic,
    /// Graphic on the left, text block on the right.
    #[default]
    GraphicAndDescription,
    /// Like `GraphicAndDescription`, with a "Digitally signed by" line.
    GraphicAndDescriptionAndName,
}

impl RenderMode {
    fn shows_graphic(self) -> bool {
        !matches!(self, RenderMode::Description)
    }

    fn shows_description(self) -> bool {
        !matches!(self, RenderMode::Graphic)
    }
}

/// Document-wide DocMDP policy applied when the signature certifies the
/// document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CertificationLevel {
    /// An approval signature; the document is not certified.
    NotCertified,
    #[default]
    CertifiedNoChangesAllowed,
    CertifiedFormFilling,
    CertifiedFormFillingAndAnnotations,
}

impl CertificationLevel {
    /// The `/P` access-permissions value of the DocMDP transform, `None` for
    /// plain approval signatures.
    pub(crate) fn docmdp_permission(self) -> Option<i64> {
        match self {
            CertificationLevel::NotCertified => None,
            CertificationLevel::CertifiedNoChangesAllowed => Some(1),
            CertificationLevel::CertifiedFormFilling => Some(2),
            CertificationLevel::CertifiedFormFillingAndAnnotations => Some(3),
        }
    }
}

/// Everything the signing step renders into the field.
#[derive(Debug, Clone, Default)]
pub struct SignatureAppearance {
    pub reason: String,
    pub location: String,
    /// PNG-encoded signature graphic, drawn according to the render mode.
    pub graphic: Option<Vec<u8>>,
    pub render_mode: RenderMode,
    pub certification_level: CertificationLevel,
}

impl SignatureAppearance {
    pub fn new(reason: impl Into<String>, location: impl Into<String>) -> Self {
        SignatureAppearance {
            reason: reason.into(),
            location: location.into(),
            ..Default::default()
        }
    }

    pub fn with_graphic(mut self, png_data: Vec<u8>) -> Self {
        self.graphic = Some(png_data);
        self
    }

    pub fn with_render_mode(mut self, render_mode: RenderMode) -> Self {
        self.render_mode = render_mode;
        self
    }

    pub fn with_certification_level(mut self, level: CertificationLevel) -> Self {
        self.certification_level = level;
        self
    }
}

const GRAPHIC_NAME: &str = "SigImg";
const FONT_NAME: &str = "Helv";
const FONT_SIZE: f32 = 7.0;
const LEADING: f32 = 9.0;
const MARGIN: f32 = 2.0;

/// Build the `/AP /N` Form XObject for a field of the given rectangle and
/// add it to the document. Returns the XObject's id.
pub(crate) fn build_appearance(
    doc: &mut Document,
    appearance: &SignatureAppearance,
    rect: &[f32; 4],
    signer_name: Option<&str>,
) -> Result<ObjectId, Error> {
    let width = rect[2] - rect[0];
    let height = rect[3] - rect[1];

    let mut operations: Vec<Operation> = vec![];
    let mut xobjects = lopdf::Dictionary::new();
    let mut fonts = lopdf::Dictionary::new();

    let graphic = appearance
        .graphic
        .as_deref()
        .filter(|_| appearance.render_mode.shows_graphic());
    // With both layers visible the graphic takes the left half of the field.
    let graphic_width = if graphic.is_some() && appearance.render_mode.shows_description() {
        width / 2.0
    } else {
        width
    };

    if let Some(png_data) = graphic {
        let (mut image, mask) = ImageXObject::decode_png(png_data)?;
        if let Some(mask) = mask {
            let mask_id = doc.add_object(mask);
            image.s_mask = Some(mask_id);
        }
        let image_id = doc.add_object(image);
        xobjects.set(GRAPHIC_NAME, Object::Reference(image_id));

        // `q`/`cm`/`Do`/`Q`: scale the unit image square onto its region.
        operations.push(Operation::new("q", vec![]));
        operations.push(Operation::new(
            "cm",
            vec![
                graphic_width.into(),
                0.into(),
                0.into(),
                height.into(),
                0.into(),
                0.into(),
            ],
        ));
        operations.push(Operation::new(
            "Do",
            vec![Object::Name(GRAPHIC_NAME.as_bytes().to_vec())],
        ));
        operations.push(Operation::new("Q", vec![]));
    }

    if appearance.render_mode.shows_description() {
        fonts.set(
            FONT_NAME,
            dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => "Helvetica",
            },
        );

        let text_x = if graphic.is_some() {
            graphic_width + MARGIN
        } else {
            MARGIN
        };
        let mut lines = vec![];
        if appearance.render_mode == RenderMode::GraphicAndDescriptionAndName {
            let name = signer_name.unwrap_or("");
            lines.push(format!("Digitally signed by {}", name));
        }
        lines.push(
            Utc::now()
                .format("Date: %Y.%m.%d %H:%M:%S UTC")
                .to_string(),
        );
        if !appearance.reason.is_empty() {
            lines.push(format!("Reason: {}", appearance.reason));
        }
        if !appearance.location.is_empty() {
            lines.push(format!("Location: {}", appearance.location));
        }

        operations.push(Operation::new("BT", vec![]));
        operations.push(Operation::new(
            "Tf",
            vec![
                Object::Name(FONT_NAME.as_bytes().to_vec()),
                FONT_SIZE.into(),
            ],
        ));
        operations.push(Operation::new(
            "Td",
            vec![text_x.into(), (height - LEADING).into()],
        ));
        for line in lines {
            operations.push(Operation::new(
                "Tj",
                vec![Object::String(line.into_bytes(), StringFormat::Literal)],
            ));
            operations.push(Operation::new("Td", vec![0.into(), (-LEADING).into()]));
        }
        operations.push(Operation::new("ET", vec![]));
    }

    let mut resources = lopdf::Dictionary::new();
    if !xobjects.is_empty() {
        resources.set("XObject", Object::Dictionary(xobjects));
    }
    if !fonts.is_empty() {
        resources.set("Font", Object::Dictionary(fonts));
    }

    let form_dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Form",
        "BBox" => Object::Array(vec![
            0.into(),
            0.into(),
            width.into(),
            height.into(),
        ]),
        "Resources" => Object::Dictionary(resources),
    };
    let content = Content { operations };
    let appearance_id = doc.add_object(Stream::new(form_dict, content.encode()?));
    Ok(appearance_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_mode_layers() {
        assert!(!RenderMode::Description.shows_graphic());
        assert!(RenderMode::Description.shows_description());
        assert!(RenderMode::Graphic.shows_graphic());
        assert!(!RenderMode::Graphic.shows_description());
        assert!(RenderMode::GraphicAndDescription.shows_graphic());
        assert!(RenderMode::GraphicAndDescription.shows_description());
    }

    #[test]
    fn docmdp_permission_values() {
        assert_eq!(CertificationLevel::NotCertified.docmdp_permission(), None);
        assert_eq!(
            CertificationLevel::CertifiedNoChangesAllowed.docmdp_permission(),
            Some(1)
        );
        assert_eq!(
            CertificationLevel::CertifiedFormFilling.docmdp_permission(),
            Some(2)
        );
        assert_eq!(
            CertificationLevel::CertifiedFormFillingAndAnnotations.docmdp_permission(),
            Some(3)
        );
    }

    #[test]
    fn defaults_match_the_signing_contract() {
        let appearance = SignatureAppearance::default();
        assert_eq!(appearance.render_mode, RenderMode::GraphicAndDescription);
        assert_eq!(
            appearance.certification_level,
            CertificationLevel::CertifiedNoChangesAllowed
        );
    }
}
