// Preview image selection.
// Picks the most representative image from a repository's root directory.

use crate::github::ContentItem;

/// File extensions treated as images, compared case-insensitively.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "svg", "webp"];

/// Name fragments that mark an image as a preview, best first.
pub const PREFERRED_NAMES: &[&str] = &["banner", "cover", "preview", "header"];

const UNRANKED: usize = 100;
const UNNAMED: usize = 999;

/// Cache key for one repository's preview image.
pub fn image_cache_key(identifier: &str) -> String {
    format!("contents:{}", identifier)
}

pub fn is_image_file(name: &str) -> bool {
    name.rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

/// Lower is better.
pub fn priority(name: &str) -> usize {
    if name.is_empty() {
        return UNNAMED;
    }
    let lower = name.to_lowercase();
    PREFERRED_NAMES
        .iter()
        .position(|fragment| lower.contains(fragment))
        .unwrap_or(UNRANKED)
}

/// Download URL of the best-ranked image file. Ties keep listing order.
pub fn best_image(items: &[ContentItem]) -> Option<String> {
    items
        .iter()
        .filter(|item| item.is_file() && is_image_file(&item.name))
        .filter_map(|item| {
            item.download_url
                .as_ref()
                .map(|url| (priority(&item.name), url))
        })
        .min_by_key(|(score, _)| *score)
        .map(|(_, url)| url.clone())
}
