//! Named parameter lists.
//!
//! Key material and key properties travel in and out of the key manager as an
//! ordered list of `(name, value)` entries. Octet-string entries used for
//! output follow a probe convention: an entry without a buffer only receives
//! the required length, an entry with a buffer receives the bytes and the
//! number of bytes written.

use std::fmt;

use zeroize::Zeroizing;

use crate::error::KeyMgmtError;

/// Recognized parameter names.
pub mod names {
    pub const BITS: &str = "bits";
    pub const SECURITY_BITS: &str = "security-bits";
    pub const MAX_SIZE: &str = "max-size";
    pub const ENCODED_PUBLIC_KEY: &str = "encoded-public-key";
    pub const PUBLIC_KEY: &str = "public-key";
    pub const PRIVATE_KEY: &str = "private-key";
    pub const GROUP_NAME: &str = "group-name";
}

/// Data type of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Integer,
    Utf8String,
    OctetString,
}

/// Declarative description of one expected parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
}

impl ParamSpec {
    pub const fn integer(name: &'static str) -> Self {
        Self {
            name,
            kind: ParamKind::Integer,
        }
    }

    pub const fn utf8_string(name: &'static str) -> Self {
        Self {
            name,
            kind: ParamKind::Utf8String,
        }
    }

    pub const fn octet_string(name: &'static str) -> Self {
        Self {
            name,
            kind: ParamKind::OctetString,
        }
    }
}

/// Value carried by a parameter.
pub enum ParamValue {
    Integer(i64),
    Utf8String(String),
    /// `None` asks only for the required length.
    OctetString(Option<Zeroizing<Vec<u8>>>),
}

impl ParamValue {
    pub fn kind(&self) -> ParamKind {
        match self {
            Self::Integer(_) => ParamKind::Integer,
            Self::Utf8String(_) => ParamKind::Utf8String,
            Self::OctetString(_) => ParamKind::OctetString,
        }
    }
}

impl fmt::Debug for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "Integer({v})"),
            Self::Utf8String(s) => write!(f, "Utf8String({s:?})"),
            Self::OctetString(Some(buf)) => write!(f, "OctetString(<{} bytes>)", buf.len()),
            Self::OctetString(None) => write!(f, "OctetString(<probe>)"),
        }
    }
}

/// One named entry in a [`ParamList`].
#[derive(Debug)]
pub struct Param {
    name: String,
    value: ParamValue,
    return_size: usize,
    modified: bool,
}

impl Param {
    fn new(name: &str, value: ParamValue, return_size: usize) -> Self {
        Self {
            name: name.to_string(),
            value,
            return_size,
            modified: false,
        }
    }

    /// An integer entry. Also used as an output request.
    pub fn integer(name: &str, value: i64) -> Self {
        Self::new(name, ParamValue::Integer(value), std::mem::size_of::<i64>())
    }

    pub fn utf8_string(name: &str, value: impl Into<String>) -> Self {
        let value = value.into();
        let len = value.len();
        Self::new(name, ParamValue::Utf8String(value), len)
    }

    /// An octet-string entry carrying input bytes.
    pub fn octet_string(name: &str, bytes: &[u8]) -> Self {
        Self::new(
            name,
            ParamValue::OctetString(Some(Zeroizing::new(bytes.to_vec()))),
            bytes.len(),
        )
    }

    /// An octet-string output request with room for `capacity` bytes.
    pub fn octet_buffer(name: &str, capacity: usize) -> Self {
        Self::new(
            name,
            ParamValue::OctetString(Some(Zeroizing::new(vec![0u8; capacity]))),
            0,
        )
    }

    /// An octet-string output request that only asks for the length.
    pub fn octet_probe(name: &str) -> Self {
        Self::new(name, ParamValue::OctetString(None), 0)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &ParamValue {
        &self.value
    }

    /// Bytes written (outputs) or carried (inputs).
    pub fn return_size(&self) -> usize {
        self.return_size
    }

    /// True once the key manager has answered this entry.
    pub fn modified(&self) -> bool {
        self.modified
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self.value {
            ParamValue::Integer(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_utf8_string(&self) -> Option<&str> {
        match &self.value {
            ParamValue::Utf8String(s) => Some(s),
            _ => None,
        }
    }

    /// The meaningful bytes of an octet string, `None` for probes.
    pub fn as_octet_string(&self) -> Option<&[u8]> {
        match &self.value {
            ParamValue::OctetString(Some(buf)) => Some(&buf[..self.return_size.min(buf.len())]),
            _ => None,
        }
    }

    pub(crate) fn set_integer(&mut self, value: i64) -> Result<(), KeyMgmtError> {
        match &mut self.value {
            ParamValue::Integer(v) => {
                *v = value;
                self.modified = true;
                Ok(())
            }
            other => Err(KeyMgmtError::param(
                &self.name,
                format!("expected integer, found {:?}", other.kind()),
            )),
        }
    }

    /// Answer an octet-string request.
    ///
    /// `write` receives the caller's buffer (or `None` for a probe) and
    /// returns the number of bytes that are, or would be, written.
    pub(crate) fn answer_octets<F>(&mut self, write: F) -> Result<(), KeyMgmtError>
    where
        F: FnOnce(Option<&mut [u8]>) -> Result<usize, KeyMgmtError>,
    {
        let len = match &mut self.value {
            ParamValue::OctetString(Some(buf)) => write(Some(buf.as_mut_slice()))?,
            ParamValue::OctetString(None) => write(None)?,
            other => {
                return Err(KeyMgmtError::param(
                    &self.name,
                    format!("expected octet string, found {:?}", other.kind()),
                ))
            }
        };
        self.return_size = len;
        self.modified = true;
        Ok(())
    }
}

/// Ordered list of named parameters.
#[derive(Debug, Default)]
pub struct ParamList {
    params: Vec<Param>,
}

impl ParamList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style append.
    pub fn with(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    pub fn push(&mut self, param: Param) {
        self.params.push(param);
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Param> {
        self.params.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Param> {
        self.params.iter_mut()
    }

    /// Find the first entry with the given name.
    pub fn locate(&self, name: &str) -> Option<&Param> {
        self.params.iter().find(|p| p.name == name)
    }

    pub fn locate_mut(&mut self, name: &str) -> Option<&mut Param> {
        self.params.iter_mut().find(|p| p.name == name)
    }

    /// Bytes of a named octet-string input.
    ///
    /// Absent entries and probes give `Ok(None)`; an entry of another type is
    /// an error.
    pub fn get_octet_string(&self, name: &str) -> Result<Option<&[u8]>, KeyMgmtError> {
        match self.locate(name) {
            None => Ok(None),
            Some(p) => match p.value {
                ParamValue::OctetString(_) => Ok(p.as_octet_string()),
                ref other => Err(KeyMgmtError::param(
                    name,
                    format!("expected octet string, found {:?}", other.kind()),
                )),
            },
        }
    }

    /// Value of a named UTF-8 string input.
    pub fn get_utf8_string(&self, name: &str) -> Result<Option<&str>, KeyMgmtError> {
        match self.locate(name) {
            None => Ok(None),
            Some(p) => p.as_utf8_string().map(Some).ok_or_else(|| {
                KeyMgmtError::param(
                    name,
                    format!("expected UTF-8 string, found {:?}", p.value.kind()),
                )
            }),
        }
    }
}

impl FromIterator<Param> for ParamList {
    fn from_iter<I: IntoIterator<Item = Param>>(iter: I) -> Self {
        Self {
            params: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locate_first_match() {
        let list = ParamList::new()
            .with(Param::integer(names::BITS, 1))
            .with(Param::integer(names::BITS, 2));
        assert_eq!(list.locate(names::BITS).unwrap().as_integer(), Some(1));
        assert!(list.locate(names::MAX_SIZE).is_none());
    }

    #[test]
    fn test_get_octet_string_type_mismatch() {
        let list = ParamList::new().with(Param::integer(names::PUBLIC_KEY, 5));
        let err = list.get_octet_string(names::PUBLIC_KEY).unwrap_err();
        assert!(matches!(err, KeyMgmtError::Param { .. }));
    }

    #[test]
    fn test_probe_has_no_bytes() {
        let list = ParamList::new().with(Param::octet_probe(names::PUBLIC_KEY));
        assert_eq!(list.get_octet_string(names::PUBLIC_KEY).unwrap(), None);
    }

    #[test]
    fn test_answer_octets_records_length() {
        let mut p = Param::octet_buffer(names::PRIVATE_KEY, 8);
        p.answer_octets(|buf| {
            let buf = buf.unwrap();
            buf[..3].copy_from_slice(&[1, 2, 3]);
            Ok(3)
        })
        .unwrap();
        assert!(p.modified());
        assert_eq!(p.as_octet_string(), Some(&[1u8, 2, 3][..]));
    }

    #[test]
    fn test_debug_hides_octets() {
        let p = Param::octet_string(names::PRIVATE_KEY, &[0xaa; 32]);
        let dbg = format!("{p:?}");
        assert!(dbg.contains("<32 bytes>"));
        assert!(!dbg.contains("170"));
    }
}
