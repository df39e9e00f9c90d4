use std::fmt;

use chrono::{DateTime, Utc};

/// Longest sanitized original-filename fragment kept in a blob name.
const MAX_HINT_LEN: usize = 96;

/// What an uploaded image is used for. Embedded in the stored name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageRole {
    /// Cover photo of a work.
    Main,
    /// Gallery photo of a work, by submission index.
    Sub(usize),
    /// Cover photo of a project.
    Project,
}

impl fmt::Display for ImageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Main => f.write_str("main"),
            Self::Sub(index) => write!(f, "sub-{index}"),
            Self::Project => f.write_str("project"),
        }
    }
}

/// Flat storage name: `<submission-millis>-<role>-<original-filename>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobName(String);

impl BlobName {
    /// Build a name from the submission time, role and the client's filename.
    ///
    /// `extensions` lists the accepted extensions for the detected format,
    /// canonical one first. A filename whose extension is not among them gets
    /// the canonical extension appended.
    pub fn new(
        submitted_at: DateTime<Utc>,
        role: ImageRole,
        original: &str,
        extensions: &[&str],
    ) -> Self {
        let hint = sanitize_hint(original, extensions);
        Self(format!("{}-{role}-{hint}", submitted_at.timestamp_millis()))
    }

    /// The same name with a short random tag after the timestamp, for when
    /// the plain name is already taken in the store.
    pub fn disambiguate(&self) -> Self {
        let tag = &uuid::Uuid::new_v4().simple().to_string()[..8];
        match self.0.split_once('-') {
            Some((millis, rest)) => Self(format!("{millis}-{tag}-{rest}")),
            None => Self(format!("{tag}-{}", self.0)),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlobName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reduce a client-supplied filename to a safe flat name.
///
/// Directory components are dropped, anything outside `[A-Za-z0-9._-]` becomes
/// `_`, and leading dots are stripped so the result is never hidden.
fn sanitize_hint(original: &str, extensions: &[&str]) -> String {
    let base = original
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();

    let cleaned: String = base
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');

    let canonical = extensions.first().copied().unwrap_or("bin");
    let (stem, ext) = match cleaned.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty()
                && extensions
                    .iter()
                    .any(|allowed| allowed.eq_ignore_ascii_case(ext)) =>
        {
            (stem, ext)
        }
        _ => (cleaned, canonical),
    };
    let stem = if stem.is_empty() { "image" } else { stem };

    let budget = MAX_HINT_LEN.saturating_sub(ext.len() + 1);
    let stem: String = stem.chars().take(budget).collect();
    format!("{stem}.{ext}")
}
