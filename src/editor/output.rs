use crate::render::ExportFormat;

const EDITED_SUFFIX: &str = "_edited";

/// `name.jpg` -> `name_edited.png`. Only the last extension is replaced; a
/// leading dot (`.thumb`) is part of the stem, not an extension.
pub fn edited_filename(filename: &str, format: ExportFormat) -> String {
    let trimmed = filename.trim();
    let stem = match trimmed.rfind('.') {
        Some(index) if index > 0 => &trimmed[..index],
        _ => trimmed,
    };
    let stem = if stem.is_empty() { "thumbnail" } else { stem };
    format!("{stem}{EDITED_SUFFIX}.{}", format.extension())
}
