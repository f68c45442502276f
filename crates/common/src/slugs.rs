//! Slug derivation for categories and tags.

/// Derive a URL-safe slug from a label.
///
/// Categories and tags are unique on both name and slug; when a payload
/// supplies only the name, the slug is derived from it.
#[must_use]
pub fn slugify(name: &str) -> String {
    slug::slugify(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Tech"), "tech");
        assert_eq!(slugify("Rust & Systems Programming"), "rust-systems-programming");
    }

    #[test]
    fn test_slugify_is_deterministic() {
        assert_eq!(slugify("Hello World"), slugify("Hello World"));
    }
}
