//! Environment settings and the chart values derived from them.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Replica count used for any environment string outside [`Environment`].
pub const DEFAULT_REPLICA_COUNT: u32 = 2;

/// The deployment environment stored in the configuration store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl Environment {
    pub const ALL: [Environment; 3] = [
        Environment::Development,
        Environment::Staging,
        Environment::Production,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }

    /// Desired ingress controller replicas for this environment.
    pub fn replica_count(self) -> u32 {
        match self {
            Environment::Development => 1,
            Environment::Staging | Environment::Production => 2,
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = InvalidEnvironment;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|env| env.as_str() == s)
            .ok_or_else(|| InvalidEnvironment(s.to_owned()))
    }
}

/// Returned when parsing a string that is not one of the known environments.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid environment: {0}. Must be one of [development, staging, production]")]
pub struct InvalidEnvironment(pub String);

/// The subset of ingress-nginx chart values computed at install time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelmValues {
    pub controller: ControllerValues,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControllerValues {
    pub replica_count: u32,
}

impl HelmValues {
    /// Attribute name under which the replica count is exposed to the chart installation.
    pub const REPLICA_COUNT_ATTRIBUTE: &'static str = "HelmValues.controller.replicaCount";

    pub fn replica_count(&self) -> u32 {
        self.controller.replica_count
    }
}

/// Maps a raw environment string to chart values.
///
/// Unknown values fall back to [`DEFAULT_REPLICA_COUNT`] instead of failing,
/// so a typo in the stored setting still yields a deployable chart.
pub fn resolve(environment: &str) -> HelmValues {
    let replica_count = environment
        .parse::<Environment>()
        .map(Environment::replica_count)
        .unwrap_or(DEFAULT_REPLICA_COUNT);

    HelmValues {
        controller: ControllerValues { replica_count },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_environments() {
        assert_eq!(resolve("development").replica_count(), 1);
        assert_eq!(resolve("staging").replica_count(), 2);
        assert_eq!(resolve("production").replica_count(), 2);
    }

    #[test]
    fn unknown_environment_defaults() {
        for raw in ["", "prod", "Development", " staging", "qa"] {
            assert_eq!(resolve(raw).replica_count(), DEFAULT_REPLICA_COUNT, "{raw:?}");
        }
    }

    #[test]
    fn resolve_is_repeatable() {
        assert_eq!(resolve("development"), resolve("development"));
        assert_eq!(resolve("unknown"), resolve("unknown"));
    }

    #[test]
    fn values_serialize_as_chart_values() {
        let json = serde_json::to_value(resolve("development")).unwrap();
        assert_eq!(json, serde_json::json!({"controller": {"replicaCount": 1}}));
    }

    #[test]
    fn strict_parse_rejects_typos() {
        assert_eq!("staging".parse(), Ok(Environment::Staging));
        let err = "stagin".parse::<Environment>().unwrap_err();
        assert_eq!(err, InvalidEnvironment("stagin".into()));
        assert!(err.to_string().contains("Must be one of"));
    }
}
