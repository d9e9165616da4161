//! Placeholder scanning over raw SQL text.
//!
//! A lightweight state machine skips quoted strings and comments, so a `?`
//! inside `'what?'` or `-- why?` is never treated as a parameter slot.

use std::borrow::Cow;

mod parsers;
mod scanner;

use parsers::placeholder_list;
use scanner::scan_placeholders;

/// Count the positional `?` placeholders in `sql`.
///
/// ```rust
/// use simple_db::translation::count_placeholders;
///
/// assert_eq!(count_placeholders("select ? from t where a = '?' and b = ?"), 2);
/// ```
#[must_use]
pub fn count_placeholders(sql: &str) -> usize {
    scan_placeholders(sql).len()
}

/// Replace the first placeholder in `fragment` with a comma separated list of
/// `count` placeholders, e.g. `id IN (?)` becomes `id IN (?, ?, ?)`.
///
/// Returns a borrowed `Cow` when the fragment has no placeholder. A zero count
/// yields an empty list, which most databases reject as `IN ()`.
#[must_use]
pub fn expand_in_placeholder(fragment: &str, count: usize) -> Cow<'_, str> {
    if count == 1 {
        return Cow::Borrowed(fragment);
    }
    match scan_placeholders(fragment).first() {
        Some(&pos) => Cow::Owned(format!(
            "{}{}{}",
            &fragment[..pos],
            placeholder_list(count),
            &fragment[pos + 1..]
        )),
        None => Cow::Borrowed(fragment),
    }
}
