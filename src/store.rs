//! Argument store: resolution of normalized flags and typed lookups.

use crate::token::{normalize, Entry};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, trace};

/// Parsed flags, queryable by key.
///
/// Built once from a full argument list. Values are kept as strings and
/// only coerced when read through one of the typed getters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgStore {
    /// Last value per key, after negations are resolved.
    single: HashMap<String, String>,
    /// Every value supplied per key, in input order.
    multi: HashMap<String, Vec<String>>,
}

/// Key-sorted, serializable view of an [`ArgStore`].
#[derive(Debug, Serialize)]
pub struct Snapshot<'a> {
    pub single: BTreeMap<&'a str, &'a str>,
    pub multi: BTreeMap<&'a str, &'a [String]>,
}

impl ArgStore {
    /// Build a store from an argument list that does not include the
    /// program name.
    pub fn from_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let entries: Vec<Entry> = args
            .into_iter()
            .filter_map(|raw| {
                let raw = raw.as_ref();
                let entry = normalize(raw);
                if entry.is_none() {
                    trace!(token = raw, "ignoring non-flag argument");
                }
                entry
            })
            .collect();

        Self::resolve(&entries)
    }

    /// Build a store from a full `argv`, skipping element 0 (the program).
    pub fn parse_argv<I, S>(argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::from_args(argv.into_iter().skip(1))
    }

    /// Build a store from the current process arguments.
    ///
    /// Arguments that are not valid UTF-8 are converted lossily.
    pub fn from_env() -> Self {
        Self::parse_argv(
            std::env::args_os().map(|arg| arg.to_string_lossy().into_owned()),
        )
    }

    /// Discard everything and rebuild from a new `argv`.
    pub fn reparse_argv<I, S>(&mut self, argv: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        *self = Self::parse_argv(argv);
    }

    fn resolve(entries: &[Entry]) -> Self {
        let mut single = HashMap::new();
        let mut multi: HashMap<String, Vec<String>> = HashMap::new();
        let mut negations = Vec::new();

        for entry in entries {
            trace!(key = %entry.key, value = ?entry.value, "recording flag");
            multi
                .entry(entry.key.clone())
                .or_default()
                .push(entry.value_str().to_string());

            match entry.negated_key() {
                Some(target) => negations.push((target, entry)),
                None => {
                    single.insert(entry.key.clone(), entry.value_str().to_string());
                }
            }
        }

        // A positive flag anywhere in the list beats every negation of it
        let positives: HashSet<String> = single.keys().cloned().collect();

        for (target, entry) in negations {
            if positives.contains(&target) {
                debug!(
                    negation = %entry.key,
                    target = %target,
                    "negation overridden by explicit flag"
                );
                continue;
            }
            let resolved = if is_truthy(entry.value_str()) { "0" } else { "1" };
            single.insert(target, resolved.to_string());
        }

        Self { single, multi }
    }

    /// Whether `key` resolved to a value.
    pub fn is_set(&self, key: &str) -> bool {
        self.single.contains_key(key)
    }

    /// Boolean value of `key`, `false` if absent.
    pub fn get_bool(&self, key: &str) -> bool {
        self.get_bool_or(key, false)
    }

    /// Boolean value of `key`, or `default` if absent.
    ///
    /// Only the exact value `"0"` is false; anything else, including a flag
    /// given without `=value`, is true.
    pub fn get_bool_or(&self, key: &str, default: bool) -> bool {
        match self.single.get(key) {
            Some(value) => is_truthy(value),
            None => default,
        }
    }

    /// String value of `key`, `""` if absent.
    pub fn get_str(&self, key: &str) -> &str {
        self.get_str_or(key, "")
    }

    /// String value of `key`, or `default` if absent.
    pub fn get_str_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.single.get(key).map(String::as_str).unwrap_or(default)
    }

    /// Integer value of `key`, or `default` if absent.
    ///
    /// A present but non-numeric value yields `0`, not `default`.
    pub fn get_int(&self, key: &str, default: i64) -> i64 {
        match self.single.get(key) {
            Some(value) => parse_int(value),
            None => default,
        }
    }

    /// Every raw value supplied for `key`, in input order.
    pub fn get_all(&self, key: &str) -> &[String] {
        self.multi.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Set `key` to `value` unless it already has a value.
    ///
    /// Returns `true` if the value was inserted.
    pub fn soft_set(&mut self, key: &str, value: &str) -> bool {
        if self.single.contains_key(key) {
            return false;
        }
        debug!(key, value, "soft-setting flag");
        self.single.insert(key.to_string(), value.to_string());
        self.multi
            .entry(key.to_string())
            .or_default()
            .push(value.to_string());
        true
    }

    /// Boolean form of [`ArgStore::soft_set`].
    pub fn soft_set_bool(&mut self, key: &str, value: bool) -> bool {
        self.soft_set(key, if value { "1" } else { "0" })
    }

    /// Sorted view of both maps, for display and serialization.
    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            single: self
                .single
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str()))
                .collect(),
            multi: self
                .multi
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_slice()))
                .collect(),
        }
    }
}

fn is_truthy(value: &str) -> bool {
    value != "0"
}

/// `atoi`-style conversion: leading whitespace, optional sign, then the
/// longest run of digits. No digits gives 0. Saturates on overflow.
fn parse_int(value: &str) -> i64 {
    // C isspace also covers vertical tab
    let s = value.trim_start_matches(|c: char| c.is_ascii_whitespace() || c == '\x0B');
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let mut result: i64 = 0;
    for b in digits.bytes().take_while(u8::is_ascii_digit) {
        let d = i64::from(b - b'0');
        result = if negative {
            result.saturating_mul(10).saturating_sub(d)
        } else {
            result.saturating_mul(10).saturating_add(d)
        };
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Parse a whitespace-separated command line behind a dummy program name.
    fn reset(line: &str) -> ArgStore {
        let mut argv = vec!["testprog"];
        argv.extend(line.split_whitespace());
        ArgStore::parse_argv(argv)
    }

    #[test]
    fn test_bool_flag_present() {
        let store = reset("-PKC");
        assert!(store.get_bool("-PKC"));
        assert!(store.get_bool_or("-PKC", false));
        assert!(store.get_bool_or("-PKC", true));

        assert!(!store.get_bool("-fo"));
        assert!(!store.get_bool_or("-fo", false));
        assert!(store.get_bool_or("-fo", true));

        assert!(!store.get_bool("-PKCo"));
        assert!(!store.get_bool_or("-PKCo", false));
        assert!(store.get_bool_or("-PKCo", true));
    }

    #[test]
    fn test_bool_explicit_zero() {
        let store = reset("-PKC=0");
        assert!(!store.get_bool("-PKC"));
        assert!(!store.get_bool_or("-PKC", false));
        assert!(!store.get_bool_or("-PKC", true));
    }

    #[test]
    fn test_bool_explicit_one() {
        let store = reset("-PKC=1");
        assert!(store.get_bool("-PKC"));
        assert!(store.get_bool_or("-PKC", false));
        assert!(store.get_bool_or("-PKC", true));
    }

    #[test]
    fn test_bool_any_non_zero_value_is_true() {
        let store = reset("-a= -b=false -c=00");
        assert!(store.get_bool("-a"));
        assert!(store.get_bool("-b"));
        assert!(store.get_bool("-c"));
    }

    #[test]
    fn test_negation() {
        for line in ["-noPKC", "-noPKC=1", "--noPKC=1"] {
            let store = reset(line);
            assert!(!store.get_bool("-PKC"), "{line}");
            assert!(!store.get_bool_or("-PKC", false), "{line}");
            assert!(!store.get_bool_or("-PKC", true), "{line}");
        }
    }

    #[test]
    fn test_negation_disabled() {
        let store = reset("-noPKC=0");
        assert!(store.get_bool("-PKC"));
        assert!(store.get_bool_or("-PKC", true));
        assert!(store.get_bool_or("-PKC", false));
    }

    #[test]
    fn test_negation_key_not_stored_as_plain_flag() {
        let store = reset("-noPKC");
        assert!(!store.is_set("-noPKC"));
        assert_eq!(store.get_str_or("-noPKC", "unset"), "unset");
    }

    #[test]
    fn test_positive_wins_over_negation_in_any_order() {
        for line in [
            "-PKC -noPKC",
            "-noPKC -PKC",
            "-PKC --noPKC",
            "-PKC=1 -noPKC=1",
        ] {
            let store = reset(line);
            assert!(store.get_bool("-PKC"), "{line}");
            assert!(store.get_bool_or("-PKC", false), "{line}");
            assert!(store.get_bool_or("-PKC", true), "{line}");
        }
    }

    #[test]
    fn test_positive_zero_wins_over_disabled_negation() {
        let store = reset("-PKC=0 -noPKC=0");
        assert!(!store.get_bool("-PKC"));
        assert!(!store.get_bool_or("-PKC", false));
        assert!(!store.get_bool_or("-PKC", true));
    }

    #[test]
    fn test_last_negation_wins() {
        assert!(reset("-noPKC -noPKC=0").get_bool("-PKC"));
        assert!(!reset("-noPKC=0 -noPKC").get_bool("-PKC"));
    }

    #[test]
    fn test_double_dash() {
        let store = reset("--PKC");
        assert!(store.get_bool("-PKC"));

        let store = reset("--PKC=verbose --bar=1");
        assert_eq!(store.get_str_or("-PKC", ""), "verbose");
        assert_eq!(store.get_int("-bar", 0), 1);

        assert_eq!(reset("--PKC=1"), reset("-PKC=1"));
    }

    #[test]
    fn test_string_absent() {
        let store = reset("");
        assert_eq!(store.get_str("-PKC"), "");
        assert_eq!(store.get_str_or("-PKC", ""), "");
        assert_eq!(store.get_str_or("-PKC", "eleven"), "eleven");
    }

    #[test]
    fn test_string_flag_without_value_is_empty() {
        let store = reset("-PKC -bar");
        assert_eq!(store.get_str_or("-PKC", ""), "");
        assert_eq!(store.get_str_or("-PKC", "eleven"), "");
    }

    #[test]
    fn test_string_explicit_empty() {
        let store = reset("-PKC=");
        assert_eq!(store.get_str_or("-PKC", ""), "");
        assert_eq!(store.get_str_or("-PKC", "eleven"), "");
    }

    #[test]
    fn test_string_values() {
        let store = reset("-PKC=11");
        assert_eq!(store.get_str_or("-PKC", ""), "11");
        assert_eq!(store.get_str_or("-PKC", "eleven"), "11");

        let store = reset("-PKC=eleven");
        assert_eq!(store.get_str_or("-PKC", ""), "eleven");
        assert_eq!(store.get_str_or("-PKC", "x"), "eleven");
    }

    #[test]
    fn test_int_absent_uses_default() {
        let store = reset("");
        assert_eq!(store.get_int("-PKC", 11), 11);
        assert_eq!(store.get_int("-PKC", 0), 0);
    }

    #[test]
    fn test_int_flag_without_value_is_zero() {
        let store = reset("-PKC -bar");
        assert_eq!(store.get_int("-PKC", 11), 0);
        assert_eq!(store.get_int("-bar", 11), 0);
    }

    #[test]
    fn test_int_independent_keys() {
        let store = reset("-PKC=11 -bar=12");
        assert_eq!(store.get_int("-PKC", 0), 11);
        assert_eq!(store.get_int("-bar", 11), 12);
    }

    #[test]
    fn test_int_non_numeric_is_zero_not_default() {
        let store = reset("-PKC=NaN -bar=NotANumber -baz=eleven");
        assert_eq!(store.get_int("-PKC", 1), 0);
        assert_eq!(store.get_int("-bar", 11), 0);
        assert_eq!(store.get_int("-baz", 5), 0);
    }

    #[test]
    fn test_int_leading_digits() {
        let store = reset("-a=-42 -b=+7 -c=12abc -d=99999999999999999999 -e=-99999999999999999999");
        assert_eq!(store.get_int("-a", 0), -42);
        assert_eq!(store.get_int("-b", 0), 7);
        assert_eq!(store.get_int("-c", 0), 12);
        assert_eq!(store.get_int("-d", 0), i64::MAX);
        assert_eq!(store.get_int("-e", 0), i64::MIN);
    }

    #[test]
    fn test_parse_int_whitespace_and_sign_only() {
        assert_eq!(parse_int("  8"), 8);
        assert_eq!(parse_int("\x0B\t\n\r\x0C 12"), 12);
        assert_eq!(parse_int("-"), 0);
        assert_eq!(parse_int(""), 0);
    }

    #[test]
    fn test_unmentioned_keys() {
        let store = reset("-PKC=1 stray positional");
        assert!(!store.get_bool("-other"));
        assert_eq!(store.get_str("-other"), "");
        assert_eq!(store.get_int("-other", 42), 42);
        assert!(!store.is_set("stray"));
        assert!(!store.is_set("-stray"));
    }

    #[test]
    fn test_last_value_wins() {
        let store = reset("-connect=a -connect=b");
        assert_eq!(store.get_str("-connect"), "b");
    }

    #[test]
    fn test_multi_values_in_order() {
        let store = reset("-connect=a -connect -connect=c");
        assert_eq!(store.get_all("-connect"), ["a", "", "c"]);
        assert!(store.get_all("-missing").is_empty());
    }

    #[test]
    fn test_multi_values_record_raw_negations() {
        let store = reset("-noPKC -noPKC=0");
        assert_eq!(store.get_all("-noPKC"), ["", "0"]);
        assert!(store.get_all("-PKC").is_empty());
    }

    #[test]
    fn test_reparse_replaces_state() {
        let mut store = reset("-PKC -bar=3");
        assert!(store.get_bool("-PKC"));

        store.reparse_argv(["testprog", ""]);
        assert!(!store.get_bool("-PKC"));
        assert!(store.get_bool_or("-PKC", true));
        assert_eq!(store.get_int("-bar", 9), 9);
        assert!(store.get_all("-bar").is_empty());
    }

    #[test]
    fn test_program_name_skipped() {
        let store = ArgStore::parse_argv(["-PKC"]);
        assert!(!store.is_set("-PKC"));

        let store = ArgStore::from_args(["-PKC"]);
        assert!(store.is_set("-PKC"));
    }

    #[test]
    fn test_soft_set() {
        let mut store = reset("-listen=1");
        assert!(!store.soft_set("-listen", "0"));
        assert_eq!(store.get_str("-listen"), "1");

        assert!(store.soft_set("-port", "8333"));
        assert_eq!(store.get_int("-port", 0), 8333);
        assert_eq!(store.get_all("-port"), ["8333"]);
    }

    #[test]
    fn test_soft_set_respects_negation() {
        let mut store = reset("-nolisten");
        assert!(!store.soft_set_bool("-listen", true));
        assert!(!store.get_bool("-listen"));

        assert!(store.soft_set_bool("-upnp", false));
        assert!(!store.get_bool_or("-upnp", true));
    }

    #[test]
    fn test_snapshot_sorted() {
        let store = reset("-b=2 -a -noc");
        let snapshot = store.snapshot();
        let keys: Vec<_> = snapshot.single.keys().copied().collect();
        assert_eq!(keys, ["-a", "-b", "-c"]);
        assert_eq!(snapshot.single["-c"], "0");
        assert_eq!(snapshot.multi["-noc"], [""]);
    }
}
