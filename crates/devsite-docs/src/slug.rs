//! URL slug generation for anchors and page paths

/// Generate a URL-safe slug from a string.
///
/// Converts the input string to lowercase, replaces non-alphanumeric
/// characters with hyphens, collapses multiple consecutive hyphens,
/// and trims leading/trailing hyphens.
///
/// # Examples
///
/// ```
/// use devsite_docs::slug::slug;
///
/// assert_eq!(slug("Hello World"), "hello-world");
/// assert_eq!(slug("Class References"), "class-references");
/// ```
pub fn slug(s: &str) -> String {
    s.to_lowercase()
        .chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' => c,
            _ => '-',
        })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Path segment for a menu entry: spaces become underscores, case is kept.
///
/// `"User Interface"` becomes `"User_Interface"`, matching the urls the C
/// reference has always used.
pub fn menu_segment(name: &str) -> String {
    name.trim().replace(' ', "_")
}

/// Join menu entries into a directory-style path ending in `/`
pub fn menu_path<S: AsRef<str>>(entries: &[S]) -> String {
    let mut path = entries
        .iter()
        .map(|e| menu_segment(e.as_ref()))
        .collect::<Vec<_>>()
        .join("/");
    path.push('/');
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_basic() {
        assert_eq!(slug("Hello World"), "hello-world");
        assert_eq!(slug("UPPERCASE"), "uppercase");
    }

    #[test]
    fn test_slug_special_chars() {
        assert_eq!(slug("PebbleKit: Classes"), "pebblekit-classes");
        assert_eq!(slug("my_function"), "my-function");
        assert_eq!(slug("v1.2.3"), "v1-2-3");
    }

    #[test]
    fn test_slug_edge_cases() {
        assert_eq!(slug(""), "");
        assert_eq!(slug("---"), "");
        assert_eq!(slug("-hello-"), "hello");
    }

    #[test]
    fn test_menu_path() {
        assert_eq!(menu_path(&["User Interface", "Window"]), "User_Interface/Window/");
        assert_eq!(menu_path(&["Foundation"]), "Foundation/");
    }
}
