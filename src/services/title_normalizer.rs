//! Turns corpus titles into the form the poster lookup expects.
//!
//! Exactly two rewrites are applied:
//! 1. a trailing ` (YYYY)` release year is removed;
//! 2. a trailing `, The` article is moved to the front.
//!
//! Anything else passes through unchanged apart from outer whitespace.
//!
//! The year token must follow exactly one ASCII space. A run of spaces, a tab,
//! or no space before it leaves the year in place, matching the corpus's own
//! `Title (YYYY)` form.

const TRAILING_ARTICLE: &str = ", The";

/// Normalizes a raw corpus title for display and lookup
pub fn normalize(raw_title: &str) -> String {
    let title = strip_year(raw_title.trim()).trim();

    match title.strip_suffix(TRAILING_ARTICLE) {
        Some(rest) if !rest.trim().is_empty() => format!("The {}", rest.trim_end()),
        _ => title.to_string(),
    }
}

/// Removes a trailing ` (dddd)` token
///
/// Only a single space before the parenthesis qualifies; `"Movie  (1995)"`
/// and `"Movie\t(1995)"` are returned unchanged.
fn strip_year(title: &str) -> &str {
    let Some(rest) = title.strip_suffix(')') else {
        return title;
    };
    let Some((head, year)) = rest.rsplit_once('(') else {
        return title;
    };

    let is_year = year.len() == 4 && year.bytes().all(|b| b.is_ascii_digit());
    match head.strip_suffix(' ') {
        // Exactly one space: "Title  (1995)" is left alone
        Some(head) if is_year && !head.ends_with(char::is_whitespace) => head,
        _ => title,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_year() {
        assert_eq!(normalize("Toy Story (1995)"), "Toy Story");
    }

    #[test]
    fn test_moves_trailing_article() {
        assert_eq!(normalize("Avengers, The"), "The Avengers");
    }

    #[test]
    fn test_plain_title_unchanged() {
        assert_eq!(normalize("Plain Title"), "Plain Title");
    }

    #[test]
    fn test_article_and_year() {
        assert_eq!(normalize("Usual Suspects, The (1995)"), "The Usual Suspects");
    }

    #[test]
    fn test_year_requires_four_digits() {
        assert_eq!(normalize("Blade Runner (Final Cut)"), "Blade Runner (Final Cut)");
        assert_eq!(normalize("Movie (95)"), "Movie (95)");
        assert_eq!(normalize("Movie (19955)"), "Movie (19955)");
    }

    #[test]
    fn test_year_requires_single_space() {
        assert_eq!(normalize("Movie(1995)"), "Movie(1995)");
        assert_eq!(normalize("Movie  (1995)"), "Movie  (1995)");
        assert_eq!(normalize("Movie\t(1995)"), "Movie\t(1995)");
        assert_eq!(normalize("Movie \t(1995)"), "Movie \t(1995)");
    }

    #[test]
    fn test_only_trailing_year_removed() {
        assert_eq!(normalize("2001 (1968) Redux"), "2001 (1968) Redux");
    }

    #[test]
    fn test_other_articles_untouched() {
        assert_eq!(normalize("Cité des enfants perdus, La"), "Cité des enfants perdus, La");
        assert_eq!(normalize("Room with a View, A (1985)"), "Room with a View, A");
    }

    #[test]
    fn test_article_alone_untouched() {
        assert_eq!(normalize(", The"), ", The");
    }

    #[test]
    fn test_trims_outer_whitespace() {
        assert_eq!(normalize("  Heat (1995)  "), "Heat");
    }

    #[test]
    fn test_empty_title() {
        assert_eq!(normalize(""), "");
    }
}
