use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

/// Characters Windows or Unix refuse in a file name, plus control characters.
static UNSAFE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[<>:"/\\|?*\x00-\x1f]"#).expect("valid regex"));

/// Make `name` usable as a single path component.
pub fn sanitize_component(name: &str) -> Cow<'_, str> {
    let cleaned = UNSAFE_CHARS.replace_all(name, "_");
    match &*cleaned {
        "" => Cow::Borrowed("_"),
        "." | ".." => Cow::Owned(cleaned.replace('.', "_")),
        _ => cleaned,
    }
}

/// `<base>/<username>/<customer>/<customer>_taglist.csv`
pub fn report_path(base: &Path, username: &str, customer: &str) -> PathBuf {
    let customer = sanitize_component(customer);
    base.join(&*sanitize_component(username))
        .join(&*customer)
        .join(format!("{customer}_taglist.csv"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_names_pass_through() {
        assert!(matches!(sanitize_component("Acme Corp"), Cow::Borrowed("Acme Corp")));
    }

    #[test]
    fn separators_and_reserved_chars_are_replaced() {
        assert_eq!(sanitize_component("a/b\\c:d"), "a_b_c_d");
        assert_eq!(sanitize_component("what?*"), "what__");
        assert_eq!(sanitize_component(".."), "__");
        assert_eq!(sanitize_component(""), "_");
    }

    #[test]
    fn report_path_layout() {
        let p = report_path(Path::new("out"), "jdoe", "Acme/West");
        assert_eq!(
            p,
            Path::new("out")
                .join("jdoe")
                .join("Acme_West")
                .join("Acme_West_taglist.csv")
        );
    }
}
