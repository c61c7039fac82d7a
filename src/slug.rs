use regex::Regex;

use std::sync::LazyLock;

static DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9áéíóúñü\s_-]").expect("valid regex"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));
static UNDERSCORES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"_+").expect("valid regex"));

/// Turns free text (a product code or name) into a catalog identifier.
///
/// The text is lowercased, anything other than ASCII letters and digits,
/// Spanish accented vowels, `ñ`, `ü`, hyphens, underscores and whitespace is
/// dropped, and whitespace runs become a single underscore.
///
/// # Examples
///
/// ```
/// # use eleventa::slugify;
/// assert_eq!(slugify("Jamón Serrano 200g"), "jamón_serrano_200g");
/// assert_eq!(slugify("A-1 / B"), "a-1_b");
/// ```
#[must_use]
pub fn slugify(text: &str) -> String {
    let lower = text.to_lowercase();
    let kept = DISALLOWED.replace_all(&lower, "");
    let joined = WHITESPACE.replace_all(&kept, "_");
    UNDERSCORES.replace_all(&joined, "_").into_owned()
}
