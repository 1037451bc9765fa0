//! Display names for archive records.
//!
//! Record headers and index entries store names in a fixed 256-byte field
//! (255 usable bytes plus a NUL terminator). [`EntryName`] is the bounded
//! string type that guards that field: every length and content check
//! happens when the name is constructed, before any byte reaches the
//! archive.

use std::fmt;
use std::path::Path;

use crate::format::NAME_FIELD_SIZE;
use crate::{Error, Result};

/// Maximum length of a display name in bytes.
pub const MAX_NAME_LENGTH: usize = NAME_FIELD_SIZE - 1;

/// A validated record display name.
///
/// `EntryName` guarantees that the name:
/// - Is between 1 and [`MAX_NAME_LENGTH`] bytes of UTF-8
/// - Contains no NUL bytes
/// - Contains no path separators (`/` or `\`)
/// - Is not `.` or `..`
///
/// Because names are plain file names, extracting a record to
/// `dir/<name>` can never escape `dir`.
///
/// # Examples
///
/// ```
/// use assetpack::EntryName;
///
/// let name = EntryName::new("logo.png").unwrap();
/// assert_eq!(name.as_str(), "logo.png");
///
/// assert!(EntryName::new("").is_err());
/// assert!(EntryName::new("dir/logo.png").is_err());
/// assert!(EntryName::new(&"x".repeat(256)).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntryName(String);

impl EntryName {
    /// Creates a new `EntryName`, validating it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidName`] if the name is empty, too long,
    /// contains NUL or a path separator, or is `.`/`..`.
    pub fn new(s: &str) -> Result<Self> {
        Self::validate(s)?;
        Ok(Self(s.to_string()))
    }

    fn validate(s: &str) -> Result<()> {
        if s.is_empty() {
            return Err(Error::InvalidName("empty name".into()));
        }

        if s.len() > MAX_NAME_LENGTH {
            return Err(Error::InvalidName(format!(
                "name is {} bytes, maximum is {}",
                s.len(),
                MAX_NAME_LENGTH
            )));
        }

        if s.contains('\0') {
            return Err(Error::InvalidName("contains NUL byte".into()));
        }

        if s.contains(['/', '\\']) {
            return Err(Error::InvalidName(format!(
                "'{}' contains a path separator",
                s
            )));
        }

        if s == "." || s == ".." {
            return Err(Error::InvalidName(format!("'{}' is not allowed", s)));
        }

        Ok(())
    }

    /// Takes the file name component of a source path.
    ///
    /// Both `/` and `\` are treated as separators so that Windows-style
    /// paths produce the same name on every platform.
    pub fn from_path(path: &Path) -> Result<Self> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                Error::InvalidName(format!("'{}' has no usable file name", path.display()))
            })?;
        let base = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name);
        Self::new(base)
    }

    /// Decodes a name from a fixed-size, NUL-terminated field.
    ///
    /// Returns `None` if the field is not terminated, is not UTF-8, or
    /// does not hold a valid name.
    pub fn from_field(field: &[u8; NAME_FIELD_SIZE]) -> Option<Self> {
        let end = field.iter().position(|&b| b == 0)?;
        let s = std::str::from_utf8(&field[..end]).ok()?;
        Self::new(s).ok()
    }

    /// Encodes the name into a zero-padded fixed-size field.
    pub fn to_field(&self) -> [u8; NAME_FIELD_SIZE] {
        let mut field = [0u8; NAME_FIELD_SIZE];
        field[..self.0.len()].copy_from_slice(self.0.as_bytes());
        field
    }

    /// Returns the name as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the length of the name in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; names are never empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Splits the name into stem and extension (including the dot).
    ///
    /// A leading dot does not start an extension, so `.gitignore` has no
    /// extension and `archive.tar.gz` splits into `archive.tar` + `.gz`.
    pub fn split_extension(&self) -> (&str, &str) {
        match self.0.rfind('.') {
            Some(0) | None => (&self.0, ""),
            Some(pos) => self.0.split_at(pos),
        }
    }

    /// Returns the `n`-th collision candidate: `stem(n)ext`.
    pub fn numbered(&self, n: u64) -> Result<Self> {
        let (stem, ext) = self.split_extension();
        Self::new(&format!("{}({}){}", stem, n, ext))
    }

    /// Returns the first name not reported as taken.
    ///
    /// The base name itself is tried first, then `stem(1)ext`,
    /// `stem(2)ext`, and so on. The probe is deterministic and always
    /// terminates, since only finitely many names can be taken.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidName`] if the next free candidate would
    /// exceed [`MAX_NAME_LENGTH`].
    ///
    /// ```
    /// use assetpack::EntryName;
    ///
    /// let base = EntryName::new("a.txt").unwrap();
    /// let taken = ["a.txt", "a(1).txt"];
    /// let unique = base.unique(|n| taken.contains(&n)).unwrap();
    /// assert_eq!(unique.as_str(), "a(2).txt");
    /// ```
    pub fn unique(&self, is_taken: impl Fn(&str) -> bool) -> Result<Self> {
        if !is_taken(self.as_str()) {
            return Ok(self.clone());
        }
        let mut counter = 1u64;
        loop {
            let candidate = self.numbered(counter)?;
            if !is_taken(candidate.as_str()) {
                return Ok(candidate);
            }
            counter += 1;
        }
    }
}

impl fmt::Display for EntryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for EntryName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for EntryName {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl std::borrow::Borrow<str> for EntryName {
    fn borrow(&self) -> &str {
        &self.0
    }
}
