//! The signing pipeline: bind an appearance and a signature value dictionary
//! to the field, serialize, patch the byte range, CMS-sign, patch the
//! contents.

use crate::appearance::{self, SignatureAppearance};
use crate::byte_range::{self, BYTE_RANGE_PLACEHOLDER, CONTENTS_PLACEHOLDER_BYTES};
use crate::identity::SigningIdentity;
use crate::{acro_form, Error, SigningDocument};
use chrono::Utc;
use cryptographic_message_syntax::{Bytes, Oid, SignedDataBuilder};
use lopdf::{dictionary, Object, ObjectId, StringFormat};

impl SigningDocument {
    /// Sign the named field and return the final byte image of the document.
    ///
    /// The returned bytes are what the signature covers; any further change
    /// to the document would invalidate it. The caller owns persistence.
    pub fn sign_field(
        &mut self,
        field_name: &str,
        appearance: &SignatureAppearance,
        identity: &SigningIdentity,
    ) -> Result<Vec<u8>, Error> {
        let field = acro_form::find_signature_field(&self.raw_document, field_name)?
            .ok_or_else(|| Error::FieldNotFound(field_name.to_owned()))?;
        if field.is_signed() {
            return Err(Error::Other(format!(
                "signature field `{}` is already signed",
                field_name
            )));
        }

        let rect = field.rectangle(&self.raw_document)?;
        let signer_name = identity.subject_common_name();

        let appearance_id = appearance::build_appearance(
            &mut self.raw_document,
            appearance,
            &rect,
            signer_name.as_deref(),
        )?;
        let value_id = self.add_signature_value(appearance, signer_name.as_deref())?;

        let field_dict = self
            .raw_document
            .get_object_mut(field.object_id())?
            .as_dict_mut()?;
        field_dict.set("V", Object::Reference(value_id));
        field_dict.set("AP", dictionary! { "N" => Object::Reference(appearance_id) });

        if appearance
            .certification_level
            .docmdp_permission()
            .is_some()
        {
            self.set_docmdp_permission(value_id)?;
        }

        // Serialize with placeholders, then patch them with
        // length-preserving splices so the xref stays valid.
        let mut pdf_data = Vec::new();
        self.raw_document.save_to(&mut pdf_data)?;
        let range = byte_range::fill_byte_range(&mut pdf_data)?;

        let mut signed_content = Vec::with_capacity(range.signed_len());
        signed_content.extend_from_slice(&pdf_data[range.first()]);
        signed_content.extend_from_slice(&pdf_data[range.second()]);

        let signature = SignedDataBuilder::default()
            .content_external(signed_content)
            .content_type(Oid(Bytes::copy_from_slice(
                cryptographic_message_syntax::asn1::rfc5652::OID_ID_DATA.as_ref(),
            )))
            .signer(identity.signer())
            .certificates(identity.chain())
            .build_der()?;

        byte_range::fill_contents(&mut pdf_data, &signature)?;
        Ok(pdf_data)
    }

    /// Build the `/V` signature value dictionary with its `ByteRange` and
    /// `Contents` placeholders and add it to the document.
    ///
    /// `ByteRange` and `Contents` must stay adjacent and in this order; the
    /// byte-range patching matches on exactly that serialization.
    fn add_signature_value(
        &mut self,
        appearance: &SignatureAppearance,
        signer_name: Option<&str>,
    ) -> Result<ObjectId, Error> {
        let now = Utc::now();
        let mut value_dict = dictionary! {
            "Type" => "Sig",
            "Filter" => "Adobe.PPKLite",
            "SubFilter" => "adbe.pkcs7.detached",
            "ByteRange" => Object::Array(
                BYTE_RANGE_PLACEHOLDER
                    .iter()
                    .map(|value| Object::Integer(*value))
                    .collect(),
            ),
            "Contents" => Object::String(
                vec![0u8; CONTENTS_PLACEHOLDER_BYTES],
                StringFormat::Hexadecimal,
            ),
            "M" => Object::String(
                now.format("D:%Y%m%d%H%M%S+00'00'").to_string().into_bytes(),
                StringFormat::Literal,
            ),
            "Reason" => Object::String(appearance.reason.clone().into_bytes(), StringFormat::Literal),
            "Location" => Object::String(appearance.location.clone().into_bytes(), StringFormat::Literal),
            "Prop_Build" => dictionary! {
                "App" => dictionary! {
                    "Name" => env!("CARGO_PKG_NAME"),
                    "REx" => Object::String(
                        env!("CARGO_PKG_VERSION").as_bytes().to_vec(),
                        StringFormat::Literal,
                    ),
                },
            },
        };

        if let Some(name) = signer_name {
            value_dict.set(
                "Name",
                Object::String(name.as_bytes().to_vec(), StringFormat::Literal),
            );
        }

        if let Some(permission) = appearance.certification_level.docmdp_permission() {
            let root_id = self.raw_document.trailer.get(b"Root")?.as_reference()?;
            value_dict.set(
                "Reference",
                vec![Object::Dictionary(dictionary! {
                    "Type" => "SigRef",
                    "TransformMethod" => "DocMDP",
                    "TransformParams" => dictionary! {
                        "Type" => "TransformParams",
                        "P" => permission,
                        "V" => "1.2",
                    },
                    "Data" => Object::Reference(root_id),
                })],
            );
        }

        Ok(self.raw_document.add_object(value_dict))
    }

    /// Point the catalog's `/Perms /DocMDP` at the signature value, creating
    /// the `Perms` dictionary when the document has none.
    fn set_docmdp_permission(&mut self, value_id: ObjectId) -> Result<(), Error> {
        let root_id = self.raw_document.trailer.get(b"Root")?.as_reference()?;
        let root = self.raw_document.get_object_mut(root_id)?.as_dict_mut()?;

        if !root.has(b"Perms") {
            root.set("Perms", dictionary! { "DocMDP" => Object::Reference(value_id) });
            return Ok(());
        }
        if let Ok(perms) = root.get_mut(b"Perms").and_then(|obj| obj.as_dict_mut()) {
            perms.set("DocMDP", Object::Reference(value_id));
            return Ok(());
        }

        // `Perms` is an indirect dictionary.
        let perms_id = self
            .raw_document
            .get_object(root_id)?
            .as_dict()?
            .get(b"Perms")?
            .as_reference()?;
        self.raw_document
            .get_object_mut(perms_id)?
            .as_dict_mut()?
            .set("DocMDP", Object::Reference(value_id));
        Ok(())
    }
}
