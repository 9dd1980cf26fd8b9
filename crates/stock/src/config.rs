//! Engine configuration (environment-driven).

use crate::dispatcher::SortDirection;

pub const DISPATCH_DIRECTION_VAR: &str = "STOCKFLOW_DISPATCH_DIRECTION";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StockConfig {
    /// Order in which competing sales are reassigned when no direction is given.
    pub default_direction: SortDirection,
}

impl StockConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    ///
    /// Unknown values fall back to the default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let default_direction = match lookup(DISPATCH_DIRECTION_VAR) {
            Some(raw) => raw.parse().unwrap_or_else(|e| {
                tracing::warn!(error = %e, "{DISPATCH_DIRECTION_VAR} ignored; using default");
                defaults.default_direction
            }),
            None => defaults.default_direction,
        };

        Self { default_direction }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_oldest_first() {
        assert_eq!(
            StockConfig::from_lookup(|_| None).default_direction,
            SortDirection::Asc
        );
    }

    #[test]
    fn reads_direction() {
        let config = StockConfig::from_lookup(|key| {
            (key == DISPATCH_DIRECTION_VAR).then(|| "desc".to_string())
        });
        assert_eq!(config.default_direction, SortDirection::Desc);
    }

    #[test]
    fn invalid_direction_falls_back() {
        let config = StockConfig::from_lookup(|_| Some("newest-ish".to_string()));
        assert_eq!(config, StockConfig::default());
    }
}
