use std::fmt;

/// Which controls a tool tab shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TabOptions {
    pub has_text_input: bool,
    pub has_font_size: bool,
    pub has_color: bool,
    pub has_presets: bool,
    pub has_adjustments: bool,
    pub has_logo_upload: bool,
}

impl TabOptions {
    const NONE: Self = Self {
        has_text_input: false,
        has_font_size: false,
        has_color: false,
        has_presets: false,
        has_adjustments: false,
        has_logo_upload: false,
    };

    pub const fn has_any(&self) -> bool {
        let Self {
            has_text_input,
            has_font_size,
            has_color,
            has_presets,
            has_adjustments,
            has_logo_upload,
        } = *self;
        has_text_input
            || has_font_size
            || has_color
            || has_presets
            || has_adjustments
            || has_logo_upload
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolTab {
    #[default]
    Text,
    Filters,
    Watermark,
    Crop,
}

impl ToolTab {
    pub const ALL: [Self; 4] = [Self::Text, Self::Filters, Self::Watermark, Self::Crop];

    pub const fn options(self) -> TabOptions {
        match self {
            Self::Text => TabOptions {
                has_text_input: true,
                has_font_size: true,
                has_color: true,
                ..TabOptions::NONE
            },
            Self::Filters => TabOptions {
                has_presets: true,
                has_adjustments: true,
                ..TabOptions::NONE
            },
            Self::Watermark => TabOptions {
                has_logo_upload: true,
                ..TabOptions::NONE
            },
            // Objects are moved and scaled directly on the canvas.
            Self::Crop => TabOptions::NONE,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Text => "Text",
            Self::Filters => "Filters",
            Self::Watermark => "Watermark",
            Self::Crop => "Crop",
        }
    }
}

impl fmt::Display for ToolTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
