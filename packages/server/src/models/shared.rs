use crate::error::AppError;

/// Longest accepted name or title, in Unicode characters.
pub const MAX_NAME_CHARS: usize = 256;

/// Escape LIKE wildcard characters in a search string.
pub fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Trim `value` and check it is 1-256 characters. Returns the trimmed value.
pub fn required_name(value: &str, field: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.chars().count() > MAX_NAME_CHARS {
        return Err(AppError::Validation(format!(
            "{field} must be 1-{MAX_NAME_CHARS} characters"
        )));
    }
    Ok(trimmed.to_string())
}

/// Trim an optional text value; blank becomes `None`.
pub fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Number of pages needed for `total` items.
pub fn total_pages(total: u64, page_size: u64) -> u64 {
    if page_size == 0 {
        0
    } else {
        total.div_ceil(page_size)
    }
}
