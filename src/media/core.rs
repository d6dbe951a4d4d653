use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// Error raised when a media type string cannot be parsed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid media type \"{0}\"")]
pub struct InvalidMediaType(pub String);

/// An internet media type reduced to its type and subtype.
///
/// Parameters other than quality are irrelevant to method resolution and are
/// dropped at parse time. `*` is allowed in either position; `*/y` is not.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MediaType {
    main: String,
    sub: String,
}

impl MediaType {
    pub fn new(main: &str, sub: &str) -> MediaType {
        MediaType {
            main: main.to_ascii_lowercase(),
            sub: sub.to_ascii_lowercase(),
        }
    }

    /// The `*/*` wildcard.
    #[must_use]
    pub fn any() -> MediaType {
        MediaType::new("*", "*")
    }

    /// Parses `type/subtype`, ignoring any `;parameter` suffix.
    pub fn parse(s: &str) -> Result<MediaType, InvalidMediaType> {
        let essence = s.split(';').next().unwrap_or(s).trim();
        let (main, sub) = essence
            .split_once('/')
            .ok_or_else(|| InvalidMediaType(s.to_string()))?;
        let (main, sub) = (main.trim(), sub.trim());
        if main.is_empty() || sub.is_empty() || (main == "*" && sub != "*") {
            return Err(InvalidMediaType(s.to_string()));
        }
        Ok(MediaType::new(main, sub))
    }

    #[must_use]
    pub fn main_type(&self) -> &str {
        &self.main
    }

    #[must_use]
    pub fn sub_type(&self) -> &str {
        &self.sub
    }

    #[must_use]
    pub fn is_any(&self) -> bool {
        self.main == "*"
    }

    #[must_use]
    pub fn is_wildcard_sub(&self) -> bool {
        self.sub == "*"
    }

    /// True if `self` is equal to or broader than `other`:
    /// `*/*` includes everything, `x/*` includes `x/y`, `x/y` includes itself.
    #[must_use]
    pub fn includes(&self, other: &MediaType) -> bool {
        if self.is_any() {
            return true;
        }
        if self.main != other.main {
            return false;
        }
        self.is_wildcard_sub() || self.sub == other.sub
    }

    /// Symmetric compatibility: one of the two includes the other.
    #[must_use]
    pub fn compatible(&self, other: &MediaType) -> bool {
        self.includes(other) || other.includes(self)
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.main, self.sub)
    }
}

/// One entry of an acceptance list: a media type and its quality value.
#[derive(Debug, Clone, PartialEq)]
pub struct AcceptEntry {
    pub media: MediaType,
    pub quality: f32,
}

/// The client's acceptance preferences, ordered by quality descending.
///
/// Within equal quality the supplied order is preserved (the sort is stable).
/// An empty list means "anything is acceptable".
#[derive(Debug, Clone, Default)]
pub struct AcceptList {
    entries: Vec<AcceptEntry>,
}

impl AcceptList {
    /// Parses an `Accept` header value such as
    /// `application/json;q=1.0, application/xml;q=0.5`.
    ///
    /// Malformed entries are skipped with a debug log rather than failing the
    /// whole header; a missing `q` parameter counts as `q=1`.
    #[must_use]
    pub fn parse(header: &str) -> AcceptList {
        let mut entries = Vec::new();
        for part in header.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            let media = match MediaType::parse(part) {
                Ok(media) => media,
                Err(err) => {
                    debug!(entry = %part, error = %err, "Skipping malformed Accept entry");
                    continue;
                }
            };
            let quality = part
                .split(';')
                .skip(1)
                .filter_map(|p| p.trim().strip_prefix("q="))
                .next()
                .and_then(|q| q.trim().parse::<f32>().ok())
                .map(|q| q.clamp(0.0, 1.0))
                .unwrap_or(1.0);
            entries.push(AcceptEntry { media, quality });
        }
        entries.sort_by(|a, b| {
            b.quality
                .partial_cmp(&a.quality)
                .unwrap_or(Ordering::Equal)
        });
        AcceptList { entries }
    }

    /// Builds a list from already-parsed types, all at quality 1, keeping the
    /// given order as the preference order.
    #[must_use]
    pub fn from_types(types: Vec<MediaType>) -> AcceptList {
        AcceptList {
            entries: types
                .into_iter()
                .map(|media| AcceptEntry { media, quality: 1.0 })
                .collect(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Accepted media types in preference order.
    pub fn types(&self) -> impl Iterator<Item = &MediaType> {
        self.entries.iter().map(|e| &e.media)
    }

    #[must_use]
    pub fn entries(&self) -> &[AcceptEntry] {
        &self.entries
    }
}

impl fmt::Display for AcceptList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{};q={}", entry.media, entry.quality)?;
        }
        Ok(())
    }
}
