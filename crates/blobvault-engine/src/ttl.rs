//! TTL-spec grammar
//!
//! Maps the raw spec string a caller sends ("5m", "1d", ...) onto a
//! duration. The table is explicit configuration rather than a module
//! constant so tests and deployments can swap it. Unrecognized specs fall
//! back to the default duration rather than failing; this mirrors the
//! existing caller contract (see DESIGN.md).

use blobvault_common::config::EngineConfig;
use chrono::TimeDelta;
use std::collections::HashMap;

/// Resolved time-to-live for one upload
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TtlSpec {
    /// The file never expires; accepted only on the named-upload path
    Infinite,
    /// The file expires after the given duration
    Finite(TimeDelta),
}

/// Lookup table from TTL-spec strings to durations
#[derive(Clone, Debug)]
pub struct TtlTable {
    entries: HashMap<String, TimeDelta>,
    default: TimeDelta,
}

impl TtlTable {
    /// The standard grammar: 5m, 30m, 1h/60m, 1d/24h, 1w/7d, default 1h
    #[must_use]
    pub fn standard() -> Self {
        let mut entries = HashMap::new();
        entries.insert("5m".to_string(), TimeDelta::minutes(5));
        entries.insert("30m".to_string(), TimeDelta::minutes(30));
        entries.insert("1h".to_string(), TimeDelta::hours(1));
        entries.insert("60m".to_string(), TimeDelta::hours(1));
        entries.insert("1d".to_string(), TimeDelta::hours(24));
        entries.insert("24h".to_string(), TimeDelta::hours(24));
        entries.insert("1w".to_string(), TimeDelta::days(7));
        entries.insert("7d".to_string(), TimeDelta::days(7));
        Self {
            entries,
            default: TimeDelta::hours(1),
        }
    }

    /// Build a table from explicit entries and a default
    #[must_use]
    pub fn new(entries: HashMap<String, TimeDelta>, default: TimeDelta) -> Self {
        Self { entries, default }
    }

    /// Build a table from engine configuration
    ///
    /// An empty configured table means the standard grammar with the
    /// configured default duration.
    #[must_use]
    pub fn from_config(config: &EngineConfig) -> Self {
        let default = TimeDelta::seconds(config.default_ttl_secs as i64);
        if config.ttl_table.is_empty() {
            let mut table = Self::standard();
            table.default = default;
            return table;
        }
        let entries = config
            .ttl_table
            .iter()
            .map(|(spec, secs)| (spec.clone(), TimeDelta::seconds(*secs as i64)))
            .collect();
        Self { entries, default }
    }

    /// Resolve a raw spec, allowing the infinite sentinel `"-1"`
    #[must_use]
    pub fn resolve(&self, raw: &str) -> TtlSpec {
        if raw == "-1" {
            return TtlSpec::Infinite;
        }
        TtlSpec::Finite(self.resolve_finite(raw))
    }

    /// Resolve a raw spec to a finite duration
    ///
    /// `"-1"` is not recognized here and resolves to the default, like any
    /// other unknown spec.
    #[must_use]
    pub fn resolve_finite(&self, raw: &str) -> TimeDelta {
        self.entries.get(raw).copied().unwrap_or(self.default)
    }
}

impl Default for TtlTable {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_grammar() {
        let table = TtlTable::standard();
        let cases = [
            ("5m", TimeDelta::minutes(5)),
            ("30m", TimeDelta::minutes(30)),
            ("1h", TimeDelta::hours(1)),
            ("60m", TimeDelta::hours(1)),
            ("1d", TimeDelta::hours(24)),
            ("24h", TimeDelta::hours(24)),
            ("1w", TimeDelta::days(7)),
            ("7d", TimeDelta::days(7)),
        ];
        for (raw, want) in cases {
            assert_eq!(table.resolve(raw), TtlSpec::Finite(want), "spec {raw}");
        }
    }

    #[test]
    fn test_infinite_sentinel() {
        let table = TtlTable::standard();
        assert_eq!(table.resolve("-1"), TtlSpec::Infinite);
        // The generated-name path never grants infinity
        assert_eq!(table.resolve_finite("-1"), TimeDelta::hours(1));
    }

    #[test]
    fn test_unrecognized_spec_falls_back_to_default() {
        let table = TtlTable::standard();
        assert_eq!(table.resolve("2h"), TtlSpec::Finite(TimeDelta::hours(1)));
        assert_eq!(table.resolve(""), TtlSpec::Finite(TimeDelta::hours(1)));
        assert_eq!(table.resolve("banana"), TtlSpec::Finite(TimeDelta::hours(1)));
    }

    #[test]
    fn test_alternate_table() {
        let mut entries = HashMap::new();
        entries.insert("blink".to_string(), TimeDelta::seconds(1));
        let table = TtlTable::new(entries, TimeDelta::seconds(10));
        assert_eq!(table.resolve("blink"), TtlSpec::Finite(TimeDelta::seconds(1)));
        assert_eq!(table.resolve("5m"), TtlSpec::Finite(TimeDelta::seconds(10)));
    }

    #[test]
    fn test_from_config_defaults_to_standard_entries() {
        let config = EngineConfig {
            default_ttl_secs: 120,
            ..EngineConfig::default()
        };
        let table = TtlTable::from_config(&config);
        assert_eq!(table.resolve("5m"), TtlSpec::Finite(TimeDelta::minutes(5)));
        assert_eq!(table.resolve("nope"), TtlSpec::Finite(TimeDelta::seconds(120)));
    }
}
