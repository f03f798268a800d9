//! Shared fixtures: a minimal one-page document, a throwaway PKCS#12
//! bundle, and a small signature graphic.
#![allow(dead_code)]

use lopdf::content::Content;
use lopdf::{dictionary, Document, Object, Stream};
use openssl::asn1::Asn1Time;
use openssl::bn::BigNum;
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkcs12::Pkcs12;
use openssl::pkey::PKey;
use openssl::rsa::Rsa;
use openssl::x509::X509;
use std::path::Path;

pub const CERT_PASSWORD: &str = "password1234";
pub const CERT_COMMON_NAME: &str = "Test Signer";

/// A valid single-page A4 document with an empty content stream.
pub fn minimal_document() -> Document {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let content = Content { operations: vec![] };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => Object::Reference(pages_id),
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        "Contents" => Object::Reference(content_id),
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => 1,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));
    doc
}

pub fn write_minimal_pdf(path: &Path) {
    minimal_document().save(path).unwrap();
}

/// A self-signed RSA-2048 certificate and key bundled as PKCS#12 DER,
/// protected by [`CERT_PASSWORD`].
pub fn test_pkcs12() -> Vec<u8> {
    let rsa = Rsa::generate(2048).unwrap();
    let pkey = PKey::from_rsa(rsa).unwrap();

    let mut name = openssl::x509::X509NameBuilder::new().unwrap();
    name.append_entry_by_nid(Nid::COMMONNAME, CERT_COMMON_NAME)
        .unwrap();
    let name = name.build();

    let mut builder = X509::builder().unwrap();
    builder.set_version(2).unwrap();
    builder
        .set_serial_number(&BigNum::from_u32(1).unwrap().to_asn1_integer().unwrap())
        .unwrap();
    builder.set_subject_name(&name).unwrap();
    builder.set_issuer_name(&name).unwrap();
    builder.set_pubkey(&pkey).unwrap();
    builder
        .set_not_before(&Asn1Time::days_from_now(0).unwrap())
        .unwrap();
    builder
        .set_not_after(&Asn1Time::days_from_now(365).unwrap())
        .unwrap();
    builder.sign(&pkey, MessageDigest::sha256()).unwrap();
    let cert = builder.build();

    let mut p12_builder = Pkcs12::builder();
    p12_builder.name("test");
    p12_builder.pkey(&pkey);
    p12_builder.cert(&cert);
    let p12 = p12_builder.build2(CERT_PASSWORD).unwrap();
    p12.to_der().unwrap()
}

/// An 8x8 opaque RGBA PNG.
pub fn test_png() -> Vec<u8> {
    let mut encoded = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut encoded, 8, 8);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header().unwrap();
        let mut pixels = Vec::with_capacity(8 * 8 * 4);
        for index in 0..(8 * 8) {
            pixels.extend_from_slice(&[(index * 3 % 256) as u8, 0x20, 0x80, 0xFF]);
        }
        writer.write_image_data(&pixels).unwrap();
    }
    encoded
}
