/// Substrings that identify a link from a supported video source.
pub const SUPPORTED_MARKERS: &[&str] = &[
    "youtu",
    "instagram",
    "tiktok",
    "facebook",
    "fb.watch",
    "twitter",
    "x.com",
];

/// Messages starting with this character are bot commands, never links.
pub const COMMAND_PREFIX: char = '/';

/// Whether free-form chat text should be treated as a media request.
///
/// Matching is case-insensitive and purely textual: the pipeline hands the
/// whole text to the extractor, which does its own URL parsing.
pub fn is_supported_link(text: &str) -> bool {
    if text.is_empty() || text.starts_with(COMMAND_PREFIX) {
        return false;
    }
    let lowered = text.to_lowercase();
    SUPPORTED_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker))
}
