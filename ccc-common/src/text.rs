/// Font description carried with every measurement request.
#[derive(Debug, Clone, PartialEq)]
pub struct FontSpec {
    pub family: String,
    pub size: f32,
}

impl Default for FontSpec {
    fn default() -> Self {
        Self {
            family: "sans-serif".to_string(),
            size: 10.0,
        }
    }
}

impl FontSpec {
    pub fn new(family: impl Into<String>, size: f32) -> Self {
        Self {
            family: family.into(),
            size,
        }
    }
}

/// Measured bounding box of a single line of text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextExtent {
    pub width: f32,
    pub height: f32,
}

/// Core trait for the text measurement collaborator.
///
/// Layout only needs bounding boxes; rasterization lives entirely on
/// the rendering side of the boundary.
pub trait TextMeasurer: Send + Sync {
    fn measure_text(&self, text: &str, font: &FontSpec) -> TextExtent;
}

/// Deterministic measurer based on per-glyph advance ratios.
///
/// Not typographically exact, but stable across platforms, which is
/// what the docking layout's overflow arithmetic and its tests need.
#[derive(Debug, Clone)]
pub struct CharWidthMeasurer {
    pub line_height_ratio: f32,
}

impl Default for CharWidthMeasurer {
    fn default() -> Self {
        Self {
            line_height_ratio: 1.2,
        }
    }
}

impl CharWidthMeasurer {
    fn advance_ratio(c: char) -> f32 {
        match c {
            'i' | 'j' | 'l' | '.' | ',' | ':' | ';' | '\'' | '|' => 0.3,
            'f' | 't' | 'r' | 'I' | '(' | ')' | '[' | ']' | ' ' | '-' => 0.4,
            'm' | 'w' | 'M' | 'W' | '@' => 0.9,
            c if c.is_uppercase() => 0.7,
            _ => 0.55,
        }
    }
}

impl TextMeasurer for CharWidthMeasurer {
    fn measure_text(&self, text: &str, font: &FontSpec) -> TextExtent {
        let width: f32 = text
            .chars()
            .map(|c| Self::advance_ratio(c) * font.size)
            .sum();
        TextExtent {
            width,
            height: font.size * self.line_height_ratio,
        }
    }
}
