//! Raw argument normalization.
//!
//! Turns one raw argument string into a canonical [`Entry`]. Anything that
//! does not look like a flag yields `None` and is dropped by the caller.

/// Literal prefix marking a negated flag (`-noFOO` negates `-FOO`).
const NEGATION_PREFIX: &str = "-no";

/// A normalized flag: key with a single leading dash plus an optional value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Canonical key, always starting with `-` (e.g. `-foo`).
    pub key: String,
    /// Text after the first `=`, or `None` when the flag had no `=`.
    pub value: Option<String>,
}

impl Entry {
    /// The stored value, with an absent value reading as the empty string.
    pub fn value_str(&self) -> &str {
        self.value.as_deref().unwrap_or("")
    }

    /// If this entry is a negation, the key it negates.
    ///
    /// `-noFOO` maps to `-FOO`. The match is case-sensitive and a bare
    /// `-no` negates nothing.
    pub fn negated_key(&self) -> Option<String> {
        let rest = self.key.strip_prefix(NEGATION_PREFIX)?;
        if rest.is_empty() {
            return None;
        }
        Some(format!("-{}", rest))
    }
}

/// Normalize one raw argument.
///
/// Returns `None` for tokens that are not flags: no leading dash, or no
/// flag name after the dash.
pub fn normalize(raw: &str) -> Option<Entry> {
    if !raw.starts_with('-') {
        return None;
    }

    // Treat --foo the same as -foo
    let text = if raw.starts_with("--") { &raw[1..] } else { raw };

    let (key, value) = match text.find('=') {
        Some(eq_pos) => (&text[..eq_pos], Some(text[eq_pos + 1..].to_string())),
        None => (text, None),
    };

    if key.len() < 2 {
        return None;
    }

    Some(Entry {
        key: key.to_string(),
        value,
    })
}
