//! Query engine configuration.

use std::env;

/// Condition engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryConfig {
    /// Fail on characters that start no token instead of skipping them
    /// (default: false).
    pub strict_lexing: bool,
}

impl QueryConfig {
    /// Create configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Create configuration from an arbitrary key lookup.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            strict_lexing: lookup("TISSDB_STRICT_LEXING").is_some_and(|v| parse_bool(&v)),
        }
    }
}

/// Interpret a `1`/`true`/`yes` style flag.
#[must_use]
pub fn parse_bool(value: &str) -> bool {
    let v = value.trim();
    v == "1" || v.eq_ignore_ascii_case("true") || v.eq_ignore_ascii_case("yes")
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn test_should_default_to_permissive_lexing() {
        assert!(!QueryConfig::default().strict_lexing);
        assert!(!QueryConfig::from_lookup(|_| None).strict_lexing);
    }

    #[test]
    fn test_should_read_strict_lexing_flag() {
        let vars = HashMap::from([("TISSDB_STRICT_LEXING", "TRUE")]);
        let config = QueryConfig::from_lookup(|k| vars.get(k).map(|v| (*v).to_owned()));
        assert!(config.strict_lexing);
    }

    #[test]
    fn test_should_parse_bool_flags() {
        assert!(parse_bool("1"));
        assert!(parse_bool("yes"));
        assert!(parse_bool(" True "));
        assert!(!parse_bool("0"));
        assert!(!parse_bool("off"));
    }
}
