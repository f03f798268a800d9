//! The signing identity: a private key and its certificate chain, extracted
//! from a password-protected PKCS#12 (`.pfx`/`.p12`) store.

use crate::Error;
use cryptographic_message_syntax::SignerBuilder;
use openssl::pkcs12::Pkcs12;
use std::path::Path;
use x509_certificate::{CapturedX509Certificate, InMemorySigningKeyPair};

/// A private key plus its certificate chain, loaded fresh for each signing
/// call. The store file is read once and dropped; nothing stays open.
pub struct SigningIdentity {
    key_pair: InMemorySigningKeyPair,
    signing_certificate: CapturedX509Certificate,
    chain: Vec<CapturedX509Certificate>,
}

impl SigningIdentity {
    /// Load the identity from a PKCS#12 file.
    pub fn from_pkcs12_file(path: impl AsRef<Path>, password: &str) -> Result<Self, Error> {
        let der = std::fs::read(path.as_ref())?;
        Self::from_pkcs12_der(&der, password)
    }

    /// Load the identity from PKCS#12 DER bytes.
    ///
    /// A malformed store or wrong password surfaces as [`Error::Credential`],
    /// a store without a private key entry as [`Error::NoSigningIdentity`].
    pub fn from_pkcs12_der(der: &[u8], password: &str) -> Result<Self, Error> {
        let parsed = Pkcs12::from_der(der)?.parse2(password)?;

        let key = parsed.pkey.ok_or(Error::NoSigningIdentity)?;
        let certificate = parsed.cert.ok_or(Error::NoSigningIdentity)?;

        // Hand the key over to the CMS stack as unencrypted PKCS#8.
        let key_pair = InMemorySigningKeyPair::from_pkcs8_der(&key.private_key_to_pkcs8()?)?;
        let signing_certificate = CapturedX509Certificate::from_der(certificate.to_der()?)?;

        let mut chain = vec![];
        if let Some(ca_certs) = parsed.ca {
            for ca_cert in ca_certs {
                chain.push(CapturedX509Certificate::from_der(ca_cert.to_der()?)?);
            }
        }

        Ok(SigningIdentity {
            key_pair,
            signing_certificate,
            chain,
        })
    }

    /// The CMS signer for this identity.
    pub(crate) fn signer(&self) -> SignerBuilder<'_> {
        SignerBuilder::new(&self.key_pair, self.signing_certificate.clone())
    }

    /// CA certificates from the store, in store order.
    pub(crate) fn chain(&self) -> impl Iterator<Item = CapturedX509Certificate> + '_ {
        self.chain.iter().cloned()
    }

    /// The subject common name of the signing certificate, if it has one.
    pub fn subject_common_name(&self) -> Option<String> {
        self.signing_certificate.subject_common_name()
    }
}
