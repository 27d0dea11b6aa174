//! Code snippets with an optional cursor marker and spoken-argument
//! placeholders

/// Marks where the cursor should land after a snippet is typed
pub const CURSOR_MARKER: &str = "$0";

/// Placeholders filled from the words spoken after a command's phrase
const PLACEHOLDERS: [(&str, fn(&str) -> String); 4] = [
    ("$snake_name", to_snake_case),
    ("$Name", to_pascal_case),
    ("$name", to_camel_case),
    ("$args", to_words),
];

/// Text to type plus how far to walk the cursor back afterwards
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snippet {
    pub text: String,
    /// Number of Left presses after typing
    pub cursor_back: usize,
}

impl Snippet {
    /// Split a template on its first cursor marker
    ///
    /// `print($0)` types `print()` and steps back one character.
    pub fn parse(template: &str) -> Self {
        match template.split_once(CURSOR_MARKER) {
            Some((before, after)) => Self {
                text: format!("{}{}", before, after),
                cursor_back: after.chars().count(),
            },
            None => Self {
                text: template.to_string(),
                cursor_back: 0,
            },
        }
    }

    /// Fill the argument placeholders, then split on the cursor marker
    pub fn render(template: &str, argument: &str) -> Self {
        Self::parse(&fill_placeholders(template, argument))
    }
}

/// Substitute `$Name`, `$name`, `$snake_name` and `$args` with `argument`
/// in the matching identifier case
///
/// With no argument every placeholder becomes empty text.
pub fn fill_placeholders(template: &str, argument: &str) -> String {
    PLACEHOLDERS
        .iter()
        .fold(template.to_string(), |text, (placeholder, convert)| {
            if text.contains(placeholder) {
                text.replace(placeholder, &convert(argument))
            } else {
                text
            }
        })
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// `user account` -> `UserAccount`
fn to_pascal_case(words: &str) -> String {
    words.split_whitespace().map(capitalize).collect()
}

/// `user account` -> `userAccount`
fn to_camel_case(words: &str) -> String {
    let mut parts = words.split_whitespace();
    let first = parts.next().map(str::to_lowercase).unwrap_or_default();
    parts.fold(first, |mut out, word| {
        out.push_str(&capitalize(word));
        out
    })
}

/// `user account` -> `user_account`
fn to_snake_case(words: &str) -> String {
    words
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}

fn to_words(words: &str) -> String {
    words.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_without_marker() {
        let snippet = Snippet::parse("int");
        assert_eq!(snippet.text, "int");
        assert_eq!(snippet.cursor_back, 0);
    }

    #[test]
    fn test_marker_inside() {
        let snippet = Snippet::parse("System.out.println($0);");
        assert_eq!(snippet.text, "System.out.println();");
        assert_eq!(snippet.cursor_back, 2);
    }

    #[test]
    fn test_only_first_marker_moves_cursor() {
        let snippet = Snippet::parse("a$0b$0");
        assert_eq!(snippet.text, "ab$0");
        assert_eq!(snippet.cursor_back, 3);
    }

    #[test]
    fn test_identifier_cases() {
        assert_eq!(
            fill_placeholders("class $Name:", "user account"),
            "class UserAccount:"
        );
        assert_eq!(
            fill_placeholders("public void $name() {}", "load USER data"),
            "public void loadUserData() {}"
        );
        assert_eq!(
            fill_placeholders("def $snake_name():", "Parse Input"),
            "def parse_input():"
        );
        assert_eq!(
            fill_placeholders("cd $args", " projects  texter "),
            "cd projects texter"
        );
    }

    #[test]
    fn test_missing_argument_leaves_gap() {
        assert_eq!(fill_placeholders("class $Name:", ""), "class :");
        assert_eq!(fill_placeholders("print($0)", "ignored"), "print($0)");
    }

    #[test]
    fn test_render_places_cursor_after_fill() {
        let snippet = Snippet::render("def $snake_name($0):", "load file");
        assert_eq!(snippet.text, "def load_file():");
        assert_eq!(snippet.cursor_back, 2);
    }
}
