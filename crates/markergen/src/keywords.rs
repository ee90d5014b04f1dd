//! Reserved words of the Kotlin declaration syntax.
//!
//! Field identifiers equal to any of these must be rendered in backticks.

/// Hard keywords: never usable as bare identifiers.
pub const HARD_KEYWORDS: &[&str] = &[
    "as", "as?", "break", "class", "continue", "do", "else", "false", "for", "fun", "if", "in",
    "!in", "interface", "is", "!is", "null", "object", "package", "return", "super", "this",
    "throw", "true", "try", "typealias", "typeof", "val", "var", "when", "while",
];

/// Modifier keywords: quoted as well, since generated properties carry modifiers.
pub const MODIFIER_KEYWORDS: &[&str] = &[
    "abstract",
    "actual",
    "annotation",
    "companion",
    "const",
    "crossinline",
    "data",
    "enum",
    "expect",
    "external",
    "final",
    "infix",
    "inline",
    "inner",
    "internal",
    "lateinit",
    "noinline",
    "open",
    "operator",
    "out",
    "override",
    "private",
    "protected",
    "public",
    "reified",
    "sealed",
    "suspend",
    "tailrec",
    "vararg",
];

/// Whether `word` is a hard or modifier keyword.
pub fn is_reserved(word: &str) -> bool {
    HARD_KEYWORDS.contains(&word) || MODIFIER_KEYWORDS.contains(&word)
}
