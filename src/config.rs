//! Runtime configuration, read from flags or the function's environment variables.

use crate::handler::DEFAULT_PARAMETER_NAME;

/// Where the environment setting is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum StoreKind {
    /// AWS Systems Manager Parameter Store.
    Ssm,
    /// A Kubernetes ConfigMap, see [`ConfigMapStore`](crate::store::ConfigMapStore).
    ConfigMap,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Config {
    /// Name of the parameter holding the deployment environment.
    #[arg(long, env = "SSM_PARAMETER_NAME", default_value = DEFAULT_PARAMETER_NAME)]
    pub parameter_name: String,

    #[arg(long, env = "PARAMETER_STORE", value_enum, default_value_t = StoreKind::Ssm)]
    pub store: StoreKind,

    /// Namespace of the ConfigMap when `--store config-map` is used.
    #[arg(long, env = "CONFIG_MAP_NAMESPACE", default_value = "default")]
    pub config_map_namespace: String,

    /// Name of the ConfigMap when `--store config-map` is used.
    #[arg(long, env = "CONFIG_MAP_NAME", default_value = "platform-account")]
    pub config_map_name: String,
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Parser)]
    struct Cli {
        #[command(flatten)]
        config: Config,
    }

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "helm-values-resolver",
            "--parameter-name",
            "/custom/env",
            "--store",
            "config-map",
            "--config-map-namespace",
            "platform",
        ])
        .unwrap();

        assert_eq!(cli.config.parameter_name, "/custom/env");
        assert_eq!(cli.config.store, StoreKind::ConfigMap);
        assert_eq!(cli.config.config_map_namespace, "platform");
    }

    #[test]
    fn rejects_unknown_store() {
        assert!(Cli::try_parse_from(["helm-values-resolver", "--store", "etcd"]).is_err());
    }
}
