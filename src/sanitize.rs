//! Cleanup filter for generated responses.
//!
//! The generation backend tends to leak code-comment tails and runs of
//! punctuation into its output. [`sanitize`] strips them before a reply is
//! stored or shown.

use std::sync::OnceLock;

use regex::Regex;

struct Rule {
    pattern: Regex,
    replacement: &'static str,
}

fn rules() -> &'static [Rule] {
    static RULES: OnceLock<Vec<Rule>> = OnceLock::new();
    RULES.get_or_init(|| {
        [
            (r"(?Rm)//.*$", ""),
            (r"(?Rm)--.*$", ""),
            (r"(?:\.-)+", "."),
            (r"'{2,}", "'"),
            (r"={2,}", "="),
            (r"\*{3,}", ""),
            (r"-{3,}", ""),
            (r"\.{3,}", "..."),
        ]
        .into_iter()
        .map(|(pattern, replacement)| Rule {
            pattern: Regex::new(pattern).expect("sanitize rule must compile"),
            replacement,
        })
        .collect()
    })
}

fn apply_rules(text: &str) -> String {
    let mut out = text.to_string();
    for rule in rules() {
        out = rule.pattern.replace_all(&out, rule.replacement).into_owned();
    }
    out.trim().to_string()
}

/// Clean a generated response.
///
/// Applies the rule list in order, then trims. Removing a run of `*` or `-`
/// can splice together a new match for an earlier rule (`a-***-b` becomes
/// `a--b`), so the list is re-applied until the text stops changing. Every
/// changing pass makes the text shorter, which bounds the loop.
///
/// ```
/// use chatdeck::sanitize::sanitize;
///
/// assert_eq!(sanitize("Hello // note"), "Hello");
/// assert_eq!(sanitize("wait....."), "wait...");
/// ```
pub fn sanitize(text: &str) -> String {
    let mut current = apply_rules(text);
    loop {
        let next = apply_rules(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}
