use serde::{Deserialize, Deserializer};

use crate::foundation::core::{ContentKey, Rgba8};
use crate::foundation::error::{MediaError, MediaResult};

/// Dots per inch used when a text block leaves `dpi` at 0.
pub const DEFAULT_TEXT_DPI: f32 = 100.0;

/// Largest accepted frame edge in pixels.
pub const MAX_FRAME_EDGE: u32 = 16_384;

/// One node of a composed frame description.
///
/// Children are painted on top of the node's own background, image, border and text, each
/// offset by its own `(x, y)` relative to the parent's absolute origin.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FrameSpec {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Horizontal offset relative to the parent origin.
    #[serde(default, rename = "x")]
    pub x_offset: i32,
    /// Vertical offset relative to the parent origin.
    #[serde(default, rename = "y")]
    pub y_offset: i32,
    /// Fill colour of the node rectangle.
    #[serde(default)]
    pub background: Option<Rgba8>,
    /// Stored full-tier image stretched over the node rectangle.
    #[serde(
        default,
        rename = "bgimage",
        deserialize_with = "de_optional_key",
        skip_serializing_if = "Option::is_none"
    )]
    pub background_image: Option<ContentKey>,
    /// Border thickness in pixels; 0 disables the border.
    #[serde(default, rename = "thickness")]
    pub border_thickness: u32,
    /// Border colour; black when missing.
    #[serde(default, rename = "color")]
    pub border_color: Option<Rgba8>,
    /// Text drawn inside the node.
    #[serde(default)]
    pub text: Option<TextSpec>,
    /// Nested frames, painted in order.
    #[serde(default, rename = "sub", deserialize_with = "de_children")]
    pub children: Vec<FrameSpec>,
}

/// Auto-fitted or fixed-size text inside a frame.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TextSpec {
    /// Text to draw; `\n` forces a line break.
    #[serde(default)]
    pub string: String,
    /// Font file stem; the service default when absent.
    #[serde(default, rename = "fontfile", deserialize_with = "de_optional_name")]
    pub font_name: Option<String>,
    /// Size in points; 0 asks for auto-fit.
    #[serde(default, rename = "fontsize")]
    pub font_size: f32,
    /// Text colour; black when missing.
    #[serde(default, rename = "fontcolor")]
    pub color: Option<Rgba8>,
    /// Greedy word wrap at the available width.
    #[serde(default)]
    pub wrap: bool,
    /// Horizontal padding on each side.
    #[serde(default, rename = "padX")]
    pub pad_x: u32,
    /// Vertical padding on each side.
    #[serde(default, rename = "padY")]
    pub pad_y: u32,
    /// Horizontal alignment.
    #[serde(default, rename = "alignH")]
    pub align_h: AlignH,
    /// Vertical alignment.
    #[serde(default, rename = "alignV")]
    pub align_v: AlignV,
    /// Resolution used to convert points to pixels; 0 means [`DEFAULT_TEXT_DPI`].
    #[serde(default)]
    pub dpi: f32,
}

/// Horizontal text alignment. Unknown strings mean `Center`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AlignH {
    /// Flush with the left padding.
    Left,
    /// Centred on the frame midpoint.
    #[default]
    Center,
    /// Flush with the right padding.
    Right,
}

/// Vertical text alignment. Unknown strings mean `Top`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AlignV {
    /// Flush with the top padding.
    #[default]
    Top,
    /// Centred on the frame midpoint.
    Center,
    /// Flush with the bottom padding.
    Bottom,
}

impl From<String> for AlignH {
    fn from(s: String) -> Self {
        match s.as_str() {
            "left" => Self::Left,
            "right" => Self::Right,
            _ => Self::Center,
        }
    }
}

impl From<AlignH> for String {
    fn from(a: AlignH) -> Self {
        match a {
            AlignH::Left => "left",
            AlignH::Center => "center",
            AlignH::Right => "right",
        }
        .to_string()
    }
}

impl From<String> for AlignV {
    fn from(s: String) -> Self {
        match s.as_str() {
            "center" => Self::Center,
            "bottom" => Self::Bottom,
            _ => Self::Top,
        }
    }
}

impl From<AlignV> for String {
    fn from(a: AlignV) -> Self {
        match a {
            AlignV::Top => "top",
            AlignV::Center => "center",
            AlignV::Bottom => "bottom",
        }
        .to_string()
    }
}

impl FrameSpec {
    /// Parse and validate a submitted description.
    pub fn from_json(bytes: &[u8]) -> MediaResult<Self> {
        let spec: Self = serde_json::from_slice(bytes)
            .map_err(|e| MediaError::serde(format!("frame description: {e}")))?;
        spec.validate()?;
        Ok(spec)
    }

    /// Check sizes and text parameters over the whole tree.
    pub fn validate(&self) -> MediaResult<()> {
        self.validate_at("root")
    }

    fn validate_at(&self, path: &str) -> MediaResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(MediaError::validation(format!(
                "{path}: width and height must be > 0"
            )));
        }
        if self.width > MAX_FRAME_EDGE || self.height > MAX_FRAME_EDGE {
            return Err(MediaError::validation(format!(
                "{path}: frame edges must be <= {MAX_FRAME_EDGE}"
            )));
        }
        if let Some(text) = &self.text {
            text.validate()
                .map_err(|e| MediaError::validation(format!("{path}.text: {e}")))?;
        }
        for (i, child) in self.children.iter().enumerate() {
            child.validate_at(&format!("{path}.sub[{i}]"))?;
        }
        Ok(())
    }

    /// Number of nodes in this tree, including `self`.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(Self::node_count).sum::<usize>()
    }
}

impl TextSpec {
    fn validate(&self) -> MediaResult<()> {
        if !self.font_size.is_finite() || self.font_size < 0.0 {
            return Err(MediaError::validation("fontsize must be finite and >= 0"));
        }
        if !self.dpi.is_finite() || self.dpi < 0.0 {
            return Err(MediaError::validation("dpi must be finite and >= 0"));
        }
        if let Some(name) = &self.font_name
            && (name.contains(['/', '\\']) || name.contains(".."))
        {
            return Err(MediaError::validation(format!(
                "fontfile '{name}' must be a bare font name"
            )));
        }
        Ok(())
    }

    /// `dpi`, or [`DEFAULT_TEXT_DPI`] when unset.
    pub fn effective_dpi(&self) -> f32 {
        if self.dpi > 0.0 {
            self.dpi
        } else {
            DEFAULT_TEXT_DPI
        }
    }

    /// Text colour, black when unset.
    pub fn text_color(&self) -> Rgba8 {
        self.color.unwrap_or(Rgba8::BLACK)
    }

    /// `true` when the size should be searched rather than taken as given.
    pub fn is_auto_fit(&self) -> bool {
        self.font_size == 0.0 && !self.wrap
    }
}

fn de_optional_key<'de, D>(de: D) -> Result<Option<ContentKey>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(de)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => match ContentKey::parse(s) {
            Ok(key) => Ok(Some(key)),
            Err(e) => {
                tracing::warn!(bgimage = s, error = %e, "background image key unusable, skipping");
                Ok(None)
            }
        },
    }
}

fn de_optional_name<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(de)?;
    Ok(raw.filter(|s| !s.trim().is_empty()))
}

fn de_children<'de, D>(de: D) -> Result<Vec<FrameSpec>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<Option<FrameSpec>>>::deserialize(de)?;
    Ok(raw.unwrap_or_default().into_iter().flatten().collect())
}

#[cfg(test)]
#[path = "../../tests/unit/model/frame.rs"]
mod tests;
