use include_dir::{include_dir, Dir};

use super::Language;

static TEMPLATE_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/templates");

/// Starter code shown when no draft exists for a problem/language pair
pub fn starter_code(language: Language) -> String {
    let file_name = format!("{language}.{}", language.extension());

    TEMPLATE_DIR
        .get_file(&file_name)
        .and_then(|file| file.contents_utf8())
        .map(str::to_owned)
        .unwrap_or_default()
}
