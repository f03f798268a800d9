use cryptographic_message_syntax::CmsError;
use std::fmt;
use x509_certificate::X509CertificateError;

/// Everything that can go wrong while placing or signing a field.
///
/// The boolean compatibility wrappers collapse all of these to `false`, but
/// the `try_*` functions surface them so callers and tests can tell a missing
/// field from a wrong password.
#[derive(Debug)]
pub enum Error {
    /// No signature field with the requested name exists in the document.
    FieldNotFound(String),
    /// The requested page does not exist in the document.
    PageNotFound(u32),
    /// The PKCS#12 store decoded fine but contains no private key entry.
    NoSigningIdentity,
    Io(std::io::Error),
    /// The PKCS#12 store is malformed or the password is wrong.
    Credential(openssl::error::ErrorStack),
    Certificate(X509CertificateError),
    Cms(CmsError),
    Pdf(lopdf::Error),
    Image(png::DecodingError),
    Other(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::FieldNotFound(name) => write!(f, "signature field `{}` not found", name),
            Error::PageNotFound(page) => write!(f, "page `{}` not found", page),
            Error::NoSigningIdentity => {
                write!(f, "PKCS#12 store does not contain a private key entry")
            }
            Error::Io(err) => write!(f, "io error: {}", err),
            Error::Credential(err) => write!(f, "PKCS#12 store error: {}", err),
            Error::Certificate(err) => write!(f, "certificate error: {}", err),
            Error::Cms(err) => write!(f, "CMS signing error: {}", err),
            Error::Pdf(err) => write!(f, "pdf error: {}", err),
            Error::Image(err) => write!(f, "signature graphic error: {}", err),
            Error::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::Credential(err) => Some(err),
            Error::Certificate(err) => Some(err),
            Error::Cms(err) => Some(err),
            Error::Pdf(err) => Some(err),
            Error::Image(err) => Some(err),
            _ => None,
        }
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        Self::Pdf(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<openssl::error::ErrorStack> for Error {
    fn from(err: openssl::error::ErrorStack) -> Self {
        Self::Credential(err)
    }
}

impl From<X509CertificateError> for Error {
    fn from(err: X509CertificateError) -> Self {
        Self::Certificate(err)
    }
}

impl From<CmsError> for Error {
    fn from(err: CmsError) -> Self {
        Self::Cms(err)
    }
}

impl From<png::DecodingError> for Error {
    fn from(err: png::DecodingError) -> Self {
        Self::Image(err)
    }
}

impl From<String> for Error {
    fn from(err: String) -> Self {
        Self::Other(err)
    }
}

impl From<&str> for Error {
    fn from(err: &str) -> Self {
        Self::Other(err.to_owned())
    }
}
