const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// Rewrite a task line to its unchecked form so that toggling, or adding a
/// checkbox to a bare item, leaves the identity alone.
pub fn normalize_for_id(raw: &str) -> String {
    if raw.starts_with("- [ ] ") {
        return raw.to_string();
    }
    if let Some(rest) = raw
        .strip_prefix("- [x] ")
        .or_else(|| raw.strip_prefix("- [X] "))
    {
        return format!("- [ ] {}", rest);
    }
    if let Some(rest) = raw.strip_prefix("- ") {
        return format!("- [ ] {}", rest);
    }
    raw.to_string()
}

/// FNV-1a, 32-bit, over UTF-16 code units (not UTF-8 bytes), as 8 lowercase
/// hex digits.
pub fn fnv1a32(input: &str) -> String {
    let hash = input.encode_utf16().fold(FNV_OFFSET_BASIS, |hash, unit| {
        (hash ^ u32::from(unit)).wrapping_mul(FNV_PRIME)
    });
    format!("{:08x}", hash)
}

/// Stable task id for a line within a section
pub fn task_id(section: &str, raw: &str) -> String {
    fnv1a32(&format!("{}\n{}", section, normalize_for_id(raw)))
}
