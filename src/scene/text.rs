use super::Color;

const MIN_FONT_SIZE: f32 = 1.0;
const HEADLINE_STROKE_WIDTH: f32 = 2.0;
const HEADLINE_SHADOW_BLUR: f32 = 4.0;
const HEADLINE_SHADOW_OFFSET: f32 = 2.0;
const HEADLINE_SHADOW_COLOR: Color = Color::with_alpha(0, 0, 0, 128);
const WATERMARK_FONT_SIZE: f32 = 16.0;
const WATERMARK_FILL: Color = Color::with_alpha(255, 255, 255, 179);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStroke {
    pub color: Color,
    pub width: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DropShadow {
    pub color: Color,
    pub blur: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextLabel {
    pub text: String,
    pub font_size: f32,
    pub fill: Color,
    pub weight: FontWeight,
    pub stroke: Option<TextStroke>,
    pub shadow: Option<DropShadow>,
}

impl TextLabel {
    /// Bold label with a black outline and soft drop shadow.
    pub fn headline(text: impl Into<String>, font_size: f32, fill: Color) -> Self {
        Self {
            text: text.into(),
            font_size: clamp_font_size(font_size),
            fill,
            weight: FontWeight::Bold,
            stroke: Some(TextStroke {
                color: Color::BLACK,
                width: HEADLINE_STROKE_WIDTH,
            }),
            shadow: Some(DropShadow {
                color: HEADLINE_SHADOW_COLOR,
                blur: HEADLINE_SHADOW_BLUR,
                offset_x: HEADLINE_SHADOW_OFFSET,
                offset_y: HEADLINE_SHADOW_OFFSET,
            }),
        }
    }

    /// Small translucent copyright line.
    pub fn watermark(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            font_size: WATERMARK_FONT_SIZE,
            fill: WATERMARK_FILL,
            weight: FontWeight::Normal,
            stroke: None,
            shadow: None,
        }
    }

    pub fn line_count(&self) -> usize {
        self.text.split('\n').count()
    }
}

fn clamp_font_size(size: f32) -> f32 {
    if size.is_finite() {
        size.max(MIN_FONT_SIZE)
    } else {
        MIN_FONT_SIZE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headline_carries_outline_and_shadow() {
        let label = TextLabel::headline("Hello", 40.0, Color::WHITE);
        assert_eq!(label.weight, FontWeight::Bold);
        assert_eq!(label.fill, Color::WHITE);
        let stroke = label.stroke.expect("headline should be stroked");
        assert_eq!(stroke.color, Color::BLACK);
        assert_eq!(stroke.width, 2.0);
        let shadow = label.shadow.expect("headline should cast a shadow");
        assert_eq!(shadow.blur, 4.0);
        assert_eq!((shadow.offset_x, shadow.offset_y), (2.0, 2.0));
    }

    #[test]
    fn watermark_is_small_translucent_and_unstroked() {
        let label = TextLabel::watermark("© Your Brand");
        assert_eq!(label.font_size, 16.0);
        assert!(label.fill.a < 255);
        assert!(label.stroke.is_none());
        assert!(label.shadow.is_none());
    }

    #[test]
    fn font_size_is_clamped_to_positive() {
        assert_eq!(TextLabel::headline("x", 0.0, Color::WHITE).font_size, 1.0);
        assert_eq!(TextLabel::headline("x", f32::NAN, Color::WHITE).font_size, 1.0);
        assert_eq!(TextLabel::headline("a\nb", 12.0, Color::WHITE).line_count(), 2);
    }
}
