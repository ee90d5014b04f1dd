//! Field name normalization and unique name allocation.

use crate::keywords;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::ops::Add;
use std::sync::Arc;
use unicode_general_category::{GeneralCategory, get_general_category};

/// Characters that force an identifier into backticks.
pub const CHARS_TO_QUOTE: &[char] = &[
    ' ', '`', '(', ')', '{', '}', '[', ']', '.', '<', '>', '\'', '"', '/', '|', '\\', '!', '?',
    '@', ':', ';', '%', '^', '&', '*', '#', '$', '-',
];

/// Characters that cannot appear even inside a backtick-quoted identifier.
pub const FORBIDDEN_IN_QUOTES: &[char] = &['<', '>', ':', '.', '/', '[', ']', '`', ';', '\\', '\n', '\r'];

/// Substitutions applied (in order) to names that need quoting.
const SUBSTITUTIONS: &[(&str, &str)] = &[
    ("<", "{"),
    (">", "}"),
    ("::", " - "),
    (": ", " - "),
    (":", " - "),
    (".", " "),
    ("/", "-"),
    ("[", "{"),
    ("]", "}"),
    ("`", "'"),
    (";", " "),
    ("\\", " "),
    ("\n", " "),
    ("\r", " "),
];

/// Cased and modifier letters, and decimal digits. Underscore is handled by
/// the caller.
fn is_identifier_char(c: char) -> bool {
    matches!(
        get_general_category(c),
        GeneralCategory::UppercaseLetter
            | GeneralCategory::LowercaseLetter
            | GeneralCategory::TitlecaseLetter
            | GeneralCategory::ModifierLetter
            | GeneralCategory::DecimalNumber
    )
}

fn is_decimal_digit(c: char) -> bool {
    matches!(get_general_category(c), GeneralCategory::DecimalNumber)
}

/// Whether a raw name must be quoted to be used as an identifier.
pub fn needs_quoting(name: &str) -> bool {
    name.trim().is_empty()
        || name.chars().next().is_some_and(is_decimal_digit)
        || name.contains(CHARS_TO_QUOTE)
        || keywords::is_reserved(name)
        || name.chars().all(|c| c == '_')
        || name.chars().any(|c| c != '_' && !is_identifier_char(c))
}

/// An identifier derived from a raw column name.
///
/// When `needs_quote` is set the identifier has had its forbidden characters
/// replaced and must be wrapped in backticks when rendered.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValidFieldName {
    identifier: String,
    needs_quote: bool,
}

impl ValidFieldName {
    /// Normalize a raw name.
    pub fn of(name: &str) -> Self {
        let needs_quote = needs_quoting(name);
        let identifier = if needs_quote {
            SUBSTITUTIONS
                .iter()
                .fold(name.to_string(), |acc, (from, to)| acc.replace(from, to))
        } else {
            name.to_string()
        };
        Self {
            identifier,
            needs_quote,
        }
    }

    pub(crate) fn with_identifier(&self, identifier: String) -> Self {
        Self {
            identifier,
            needs_quote: self.needs_quote,
        }
    }

    /// The escaped identifier without quotes.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn needs_quote(&self) -> bool {
        self.needs_quote
    }

    /// The identifier as it appears in declarations.
    pub fn quoted_if_needed(&self) -> String {
        if self.needs_quote {
            format!("`{}`", self.identifier)
        } else {
            self.identifier.clone()
        }
    }
}

impl Add for ValidFieldName {
    type Output = ValidFieldName;

    fn add(self, other: ValidFieldName) -> ValidFieldName {
        ValidFieldName {
            identifier: self.identifier + &other.identifier,
            needs_quote: self.needs_quote || other.needs_quote,
        }
    }
}

impl fmt::Display for ValidFieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.quoted_if_needed())
    }
}

/// Allocates names that are pairwise distinct within one session.
#[derive(Debug, Clone, Default)]
pub struct UniqueNameGenerator {
    used: HashSet<String>,
}

impl UniqueNameGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// A generator that never hands out any of `reserved`.
    pub fn with_reserved<I, S>(reserved: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            used: reserved.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.used.contains(name)
    }

    /// Mark `name` as taken. Returns false if it already was.
    pub fn reserve(&mut self, name: &str) -> bool {
        self.used.insert(name.to_string())
    }

    /// Return `proposed`, or `proposed` with the smallest free numeric suffix.
    pub fn add_unique(&mut self, proposed: &str) -> String {
        if self.reserve(proposed) {
            return proposed.to_string();
        }
        let mut counter = 1usize;
        loop {
            let candidate = format!("{proposed}{counter}");
            if self.reserve(&candidate) {
                tracing::trace!(proposed, allocated = %candidate, "name taken, using suffix");
                return candidate;
            }
            counter += 1;
        }
    }
}

/// Rewrites raw column names before they become field identifiers.
#[derive(Clone)]
pub struct NameNormalizer(Arc<dyn Fn(&str) -> String + Send + Sync>);

impl NameNormalizer {
    /// Leaves names untouched.
    pub fn identity() -> Self {
        Self(Arc::new(str::to_string))
    }

    /// Any function from raw name to normalized name.
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Splits on `delimiters` and joins the pieces in camelCase.
    ///
    /// An empty delimiter set gives the identity normalizer.
    pub fn from_delimiters<I>(delimiters: I) -> Self
    where
        I: IntoIterator<Item = char>,
    {
        let delimiters: Vec<char> = delimiters.into_iter().collect();
        if delimiters.is_empty() {
            return Self::identity();
        }
        Self::custom(move |name| to_camel_case(name, &delimiters))
    }

    pub fn normalize(&self, name: &str) -> String {
        (self.0)(name)
    }
}

impl Default for NameNormalizer {
    fn default() -> Self {
        Self::identity()
    }
}

impl fmt::Debug for NameNormalizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("NameNormalizer")
    }
}

fn to_camel_case(name: &str, delimiters: &[char]) -> String {
    if !name.chars().any(char::is_alphanumeric) {
        return name.to_string();
    }
    let pieces: Vec<String> = name
        .split(|c| delimiters.contains(&c))
        .filter(|piece| !piece.trim().is_empty())
        .map(str::to_lowercase)
        .collect();

    // Adjacent numeric pieces stay apart: `v_1_2` becomes `v1_2`, not `v12`.
    let mut joined: Vec<String> = Vec::with_capacity(pieces.len());
    for piece in pieces {
        let numeric = piece.chars().all(|c| c.is_numeric());
        match joined.last_mut() {
            Some(last) if numeric && last.chars().all(|c| c.is_numeric()) => {
                last.push('_');
                last.push_str(&piece);
            }
            _ => joined.push(piece),
        }
    }

    let mut out = String::with_capacity(name.len());
    for (i, piece) in joined.iter().enumerate() {
        if i == 0 {
            out.push_str(piece);
            continue;
        }
        let mut chars = piece.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_names_are_bare() {
        let name = ValidFieldName::of("firstName");
        assert!(!name.needs_quote());
        assert_eq!(name.quoted_if_needed(), "firstName");

        assert!(!ValidFieldName::of("_id").needs_quote());
        assert!(!ValidFieldName::of("größe").needs_quote());
    }

    #[test]
    fn test_quoting_rules() {
        for raw in ["", "  ", "1a", "-b", "?c", "a b", "val", "open", "__", "a+b", "x.y"] {
            assert!(ValidFieldName::of(raw).needs_quote(), "{raw:?} should need quoting");
        }
    }

    #[test]
    fn test_non_decimal_numbers_need_quoting() {
        // Superscripts, vulgar fractions and roman numerals are not identifier characters.
        for raw in ["x²", "half½", "rⅷ", "٣a"] {
            assert!(ValidFieldName::of(raw).needs_quote(), "{raw:?} should need quoting");
        }
    }

    #[test]
    fn test_titlecase_and_modifier_letters_are_bare() {
        for raw in ["ǅx", "a々", "aʰ", "x٣"] {
            assert!(!ValidFieldName::of(raw).needs_quote(), "{raw:?} should stay bare");
        }
    }

    #[test]
    fn test_substitutions() {
        assert_eq!(ValidFieldName::of("List<Int>").identifier(), "List{Int}");
        assert_eq!(ValidFieldName::of("a::b").identifier(), "a - b");
        assert_eq!(ValidFieldName::of("key: value").identifier(), "key - value");
        assert_eq!(ValidFieldName::of("a.b/c").identifier(), "a b-c");
        assert_eq!(ValidFieldName::of("arr[0]").identifier(), "arr{0}");
        assert_eq!(ValidFieldName::of("it`s").identifier(), "it's");
        assert_eq!(ValidFieldName::of("line\nbreak").identifier(), "line break");
        assert_eq!(ValidFieldName::of("a b").quoted_if_needed(), "`a b`");
    }

    #[test]
    fn test_quoted_identifiers_drop_forbidden_chars() {
        let names = [
            "a<b>", "ns::name", "k: v", "1.5", "path/to", "x[1]", "back`tick", "semi;colon",
            "back\\slash", "cr\rlf\n", "all of ( ) { } ! ? @ % ^ & * # $ -",
        ];
        for raw in names {
            let name = ValidFieldName::of(raw);
            assert!(name.needs_quote(), "{raw:?}");
            assert!(
                !name.identifier().contains(FORBIDDEN_IN_QUOTES),
                "{raw:?} -> {:?}",
                name.identifier()
            );
        }
    }

    #[test]
    fn test_plus_combines_flags() {
        let joined = ValidFieldName::of("group") + ValidFieldName::of("1st");
        assert_eq!(joined.identifier(), "group1st");
        assert!(joined.needs_quote());

        let bare = ValidFieldName::of("a") + ValidFieldName::of("b");
        assert!(!bare.needs_quote());
    }

    #[test]
    fn test_unique_names() {
        let mut names = UniqueNameGenerator::new();
        assert_eq!(names.add_unique("Type"), "Type");
        assert_eq!(names.add_unique("Type"), "Type1");
        assert_eq!(names.add_unique("Type1"), "Type11");
        assert_eq!(names.add_unique("Type"), "Type2");

        let mut all = HashSet::new();
        for _ in 0..50 {
            assert!(all.insert(names.add_unique("Type")));
        }
    }

    #[test]
    fn test_reserved_names_are_skipped() {
        let mut names = UniqueNameGenerator::with_reserved(["Person"]);
        assert_eq!(names.add_unique("Person"), "Person1");
    }

    #[test]
    fn test_camel_case_normalizer() {
        let normalizer = NameNormalizer::from_delimiters(['_', ' ']);
        assert_eq!(normalizer.normalize("first_name"), "firstName");
        assert_eq!(normalizer.normalize("Last Name"), "lastName");
        assert_eq!(normalizer.normalize("__"), "__");
        assert_eq!(normalizer.normalize("v_1_2"), "v1_2");
        assert_eq!(normalizer.normalize("plain"), "plain");

        let identity = NameNormalizer::from_delimiters([]);
        assert_eq!(identity.normalize("first_name"), "first_name");
    }
}
