/// Normalize a Notion id to dashed lowercase UUID form.
///
/// Accepts plain or dashed 32-hex ids, and page slugs/URLs ending in one
/// (`My-Page-0123456789abcdef0123456789abcdef`).
pub fn normalize_id(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let path = trimmed.split(|c| c == '?' || c == '#').next().unwrap_or(trimmed);
    let tail = path.rsplit('/').next().unwrap_or(path);

    let compact: String = tail.chars().filter(|c| *c != '-').collect();
    let hex = compact.get(compact.len().checked_sub(32)?..)?;
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }

    // Anything before the id must be a slug separated by '-'.
    if compact.len() > 32 && !tail.contains('-') {
        return None;
    }

    let hex = hex.to_ascii_lowercase();
    Some(format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    ))
}
