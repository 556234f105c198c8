use std::fmt;

use md5::{Digest as _, Md5};

use crate::foundation::error::{MediaError, MediaResult};

/// Premultiplied RGBA8 pixel (r,g,b already multiplied by a).
pub type PremulRgba8 = [u8; 4];

/// Straight-alpha RGBA8 colour as it appears in frame descriptions.
///
/// On the wire a colour is an array of 3 (opaque) or 4 integer components.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(from = "Vec<i64>", into = "[u8; 4]")]
pub struct Rgba8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Rgba8 {
    /// Opaque black, used when a colour is missing or malformed.
    pub const BLACK: Self = Self::new(0, 0, 0, 255);

    /// Build a colour from straight-alpha components.
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Convert into premultiplied RGBA8.
    pub fn premul(self) -> PremulRgba8 {
        fn premul(c: u8, a: u8) -> u8 {
            let c = u16::from(c);
            let a = u16::from(a);
            (((c * a) + 127) / 255) as u8
        }

        [
            premul(self.r, self.a),
            premul(self.g, self.a),
            premul(self.b, self.a),
            self.a,
        ]
    }
}

impl From<Vec<i64>> for Rgba8 {
    fn from(components: Vec<i64>) -> Self {
        let c = |v: i64| v.clamp(0, 255) as u8;
        match components.as_slice() {
            [r, g, b] => Self::new(c(*r), c(*g), c(*b), 255),
            [r, g, b, a] => Self::new(c(*r), c(*g), c(*b), c(*a)),
            other => {
                tracing::warn!(components = ?other, "malformed colour, using black");
                Self::BLACK
            }
        }
    }
}

impl From<Rgba8> for [u8; 4] {
    fn from(c: Rgba8) -> Self {
        [c.r, c.g, c.b, c.a]
    }
}

/// Number of hex characters in a [`ContentKey`].
pub const CONTENT_KEY_LEN: usize = 32;

/// Lowercase hex MD5 digest identifying a stored artifact.
///
/// The same key is the storage filename, the cache key and the external identifier.
#[derive(
    Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct ContentKey(String);

impl ContentKey {
    /// Hash `bytes` into a key.
    pub fn digest(bytes: &[u8]) -> Self {
        let mut hasher = ContentHasher::new();
        hasher.update(bytes);
        hasher.finish()
    }

    /// Validate and normalize an externally supplied key.
    pub fn parse(s: &str) -> MediaResult<Self> {
        let s = s.trim();
        if s.len() != CONTENT_KEY_LEN || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(MediaError::validation(format!(
                "content key must be {CONTENT_KEY_LEN} hex characters, got '{s}'"
            )));
        }
        Ok(Self(s.to_ascii_lowercase()))
    }

    /// Borrow the hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ContentKey {
    type Error = MediaError;

    fn try_from(s: String) -> MediaResult<Self> {
        Self::parse(&s)
    }
}

impl From<ContentKey> for String {
    fn from(k: ContentKey) -> Self {
        k.0
    }
}

/// Incremental hasher producing a [`ContentKey`] for streamed uploads.
#[derive(Clone, Default)]
pub struct ContentHasher(Md5);

impl ContentHasher {
    /// Start an empty digest.
    pub fn new() -> Self {
        Self(Md5::new())
    }

    /// Feed more bytes.
    pub fn update(&mut self, bytes: &[u8]) {
        self.0.update(bytes);
    }

    /// Finish and render the lowercase hex key.
    pub fn finish(self) -> ContentKey {
        ContentKey(format!("{:x}", self.0.finalize()))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
