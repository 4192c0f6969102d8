//! List-endpoint helpers shared by the admin views.

/// Default page size for admin listings.
pub const DEFAULT_PAGE_SIZE: i64 = 25;

/// Largest page size a client may request.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Clamp a user-provided limit to valid bounds.
pub fn clamp_limit(limit: Option<i64>, default: i64, max: i64) -> i64 {
    limit.unwrap_or(default).max(1).min(max)
}

/// Clamp a user-provided offset to non-negative.
pub fn clamp_offset(offset: Option<i64>) -> i64 {
    offset.unwrap_or(0).max(0)
}

/// Escape `%`, `_` and `\` so user input matches literally inside `ILIKE`.
///
/// ```
/// use admissions_core::pagination::escape_like;
/// assert_eq!(escape_like("50%_off"), "50\\%\\_off");
/// ```
pub fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
