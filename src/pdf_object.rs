use crate::Error;
use lopdf::{Document, Object, ObjectId};

/// Follow an indirect reference to the object it points at, or return the
/// object itself when it is already direct.
pub(crate) trait PdfObjectDeref {
    fn deref<'a>(&'a self, doc: &'a Document) -> Result<&'a Object, Error>;

    fn get_object_id(&self) -> Option<ObjectId>;
}

impl PdfObjectDeref for Object {
    fn deref<'a>(&'a self, doc: &'a Document) -> Result<&'a Object, Error> {
        match *self {
            Object::Reference(oid) => doc
                .objects
                .get(&oid)
                .ok_or_else(|| Error::Other(format!("dangling reference: ({},{})", oid.0, oid.1))),
            _ => Ok(self),
        }
    }

    fn get_object_id(&self) -> Option<ObjectId> {
        match *self {
            Object::Reference(ref id) => Some(*id),
            _ => None,
        }
    }
}

/// Numeric PDF values may be written as either `Integer` or `Real`.
pub(crate) fn as_number(obj: &Object) -> Result<f32, Error> {
    match obj {
        Object::Integer(value) => Ok(*value as f32),
        Object::Real(value) => Ok(*value),
        _ => Err(Error::Pdf(lopdf::Error::Type)),
    }
}
