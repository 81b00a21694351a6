use sha2::{Digest, Sha256};

/// Portable, deterministic file name for a saved frame image:
/// `{rank:02}--{sanitized_stem}--{short_hash(frame)}.{ext}`.
///
/// The extension comes from the frame reference, falling back to the
/// response content type and finally `jpg`.
pub fn frame_filename(rank: usize, frame: &str, content_type: Option<&str>) -> String {
    let base = frame.rsplit('/').next().unwrap_or(frame);
    let (stem, ext) = match base.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && is_simple_extension(ext) => {
            (stem, ext.to_ascii_lowercase())
        }
        _ => (base, extension_for(content_type).to_string()),
    };
    let sanitized = sanitize_stem(stem);
    let hash = short_hash(frame);
    format!("{rank:02}--{sanitized}--{hash}.{ext}")
}

fn is_simple_extension(ext: &str) -> bool {
    !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric())
}

fn extension_for(content_type: Option<&str>) -> &'static str {
    let essence = content_type
        .and_then(|ct| ct.split(';').next())
        .map(str::trim)
        .unwrap_or_default();
    match essence.to_ascii_lowercase().as_str() {
        "image/png" => "png",
        "image/webp" => "webp",
        "image/gif" => "gif",
        _ => "jpg",
    }
}

fn sanitize_stem(input: &str) -> String {
    let mut compacted = String::with_capacity(input.len());
    let mut prev_underscore = false;
    for c in input.chars() {
        let c = if is_forbidden(c) || c.is_whitespace() { '_' } else { c };
        if c == '_' && prev_underscore {
            continue;
        }
        prev_underscore = c == '_';
        compacted.push(c);
    }
    let mut cleaned = compacted.trim_matches(&['_', '.'][..]).to_string();
    if cleaned.is_empty() {
        cleaned = "frame".to_string();
    }
    if cleaned.len() > 60 {
        let mut cut = 60;
        while !cleaned.is_char_boundary(cut) {
            cut -= 1;
        }
        cleaned.truncate(cut);
    }
    if is_reserved_windows_name(&cleaned) {
        cleaned.push('_');
    }
    cleaned
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}'
    )
}

fn is_reserved_windows_name(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(name))
}

fn short_hash(input: &str) -> String {
    use std::fmt::Write;

    let digest = Sha256::digest(input.as_bytes());
    let mut hex = String::with_capacity(8);
    for byte in digest.iter().take(4) {
        let _ = write!(&mut hex, "{byte:02x}");
    }
    hex
}
