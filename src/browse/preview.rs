//! Notable-file preview
//!
//! Picks the readme-like file out of a directory listing and asks the
//! markdown collaborator to render it inline. Preview is best-effort: a
//! file that vanishes or fails to read between listing and render simply
//! yields no preview.

use log::warn;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::browse::listing::FileEntry;
use crate::config::PreviewMode;
use crate::markdown;

/// Names recognized as notable for inline preview.
const NOTABLE_NAMES: [&str; 2] = ["readme.md", "readme.markdown"];

/// Upper bound on how much of a notable file is rendered inline.
const MAX_PREVIEW_BYTES: u64 = 512 * 1024;

/// Find the notable file in a listing, if any.
pub fn notable_file(entries: &[FileEntry]) -> Option<&FileEntry> {
    entries.iter().find(|entry| {
        !entry.is_directory
            && NOTABLE_NAMES
                .iter()
                .any(|notable| entry.name.eq_ignore_ascii_case(notable))
    })
}

/// Render the notable file at `path` per the endpoint's preview mode.
pub fn render_file(mode: PreviewMode, path: &Path) -> Option<String> {
    if mode == PreviewMode::None {
        return None;
    }

    let mut content = String::new();
    match File::open(path) {
        Ok(file) => {
            if let Err(e) = file.take(MAX_PREVIEW_BYTES).read_to_string(&mut content) {
                warn!("Failed to read preview file {}: {}", path.display(), e);
                return None;
            }
        }
        Err(e) => {
            warn!("Failed to open preview file {}: {}", path.display(), e);
            return None;
        }
    }

    markdown::render_inline(mode, &content)
}
