//! Inline joins implied by projected lookup paths

use std::collections::BTreeSet;

/// Every proper prefix of every multi-segment path
///
/// `favourite_book__publisher__name` implies joins on `favourite_book`
/// and `favourite_book__publisher`.
pub fn query_joins<'p, I>(paths: I, separator: &str) -> BTreeSet<String>
where
    I: IntoIterator<Item = &'p String>,
{
    let mut joins = BTreeSet::new();
    for path in paths {
        let mut end = 0;
        while let Some(offset) = path[end..].find(separator) {
            end += offset;
            joins.insert(path[..end].to_string());
            end += separator.len();
        }
    }
    joins
}
