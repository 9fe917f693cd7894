//! Trigger uid sanitizing

use regex::Regex;
use std::sync::OnceLock;
use uuid::Uuid;

/// Marker prepended to uids that do not start with a letter or digit
pub const UID_PREFIX: &str = "trigger";

fn invalid_chars() -> &'static Regex {
    static INVALID: OnceLock<Regex> = OnceLock::new();
    INVALID.get_or_init(|| Regex::new(r"[^A-Za-z0-9_-]").expect("uid pattern is valid"))
}

fn underscore_runs() -> &'static Regex {
    static RUNS: OnceLock<Regex> = OnceLock::new();
    RUNS.get_or_init(|| Regex::new(r"_{2,}").expect("uid pattern is valid"))
}

fn starts_alphanumeric(s: &str) -> bool {
    s.starts_with(|c: char| c.is_ascii_alphanumeric())
}

/// Turn an arbitrary string into a unique trigger uid
///
/// Characters outside `[A-Za-z0-9_-]` become `_`, a uid that does not start
/// with a letter or digit gets `prefix` in front, and a fresh uuid suffix is
/// always appended. A `prefix` that cannot start a uid itself is replaced by
/// [`UID_PREFIX`]. Runs of `_` are collapsed last, so the result never
/// contains `__` regardless of what was joined.
pub fn validate_uid(uid: &str, prefix: &str) -> String {
    let mut sanitized = invalid_chars().replace_all(uid, "_").into_owned();

    if !starts_alphanumeric(&sanitized) {
        let prefix = invalid_chars().replace_all(prefix, "_");
        let prefix = if starts_alphanumeric(&prefix) { &*prefix } else { UID_PREFIX };
        sanitized = format!("{}_{}", prefix, sanitized);
    }

    let suffixed = format!("{}_{}", sanitized, Uuid::new_v4().simple());
    underscore_runs().replace_all(&suffixed, "_").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn well_formed(uid: &str) -> bool {
        uid.starts_with(|c: char| c.is_ascii_alphanumeric())
            && !uid.contains("__")
            && uid
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    }

    #[test]
    fn test_replaces_invalid_chars() {
        let uid = validate_uid("Item-gMotion Sensors-changed", UID_PREFIX);
        assert!(uid.starts_with("Item-gMotion_Sensors-changed_"));
        assert!(well_formed(&uid));
    }

    #[test]
    fn test_prefix_when_not_alphanumeric() {
        let uid = validate_uid("_hidden", UID_PREFIX);
        assert!(uid.starts_with("trigger_hidden_"));
        assert!(well_formed(&uid));

        let uid = validate_uid("", UID_PREFIX);
        assert!(uid.starts_with("trigger_"));
        assert!(well_formed(&uid));
    }

    #[test]
    fn test_unusable_prefix_falls_back() {
        for prefix in ["", "_x", "#", "-rule"] {
            let uid = validate_uid("_hourly", prefix);
            assert!(uid.starts_with("trigger_hourly_"), "bad uid {uid} for {prefix:?}");
            assert!(well_formed(&uid));
        }

        let uid = validate_uid("#event", "my rule");
        assert!(uid.starts_with("my_rule_event_"));
        assert!(well_formed(&uid));
    }

    #[test]
    fn test_collapses_underscores() {
        let uid = validate_uid("a::b__c_", UID_PREFIX);
        assert!(uid.starts_with("a_b_c_"));
        assert!(well_formed(&uid));
    }

    #[test]
    fn test_always_unique() {
        let a = validate_uid("Time-cron", UID_PREFIX);
        let b = validate_uid("Time-cron", UID_PREFIX);
        assert_ne!(a, b);
    }

    #[test]
    fn test_twice_keeps_shape() {
        for input in ["", "__", "Item x", "#event", "ümlaut-item", "a_"] {
            let twice = validate_uid(&validate_uid(input, UID_PREFIX), UID_PREFIX);
            assert!(well_formed(&twice), "bad uid {twice} for {input:?}");
        }
    }
}
