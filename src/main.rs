use anyhow::Context;
use clap::{Parser, Subcommand};
use env_logger::Env;
use helm_values_resolver::{
    config::StoreKind,
    lifecycle::LifecycleEvent,
    stack::Stack,
    store::{ConfigMapStore, ParameterStore, SsmParameterStore},
    Config, Environment, Handler,
};
use lambda_runtime::{service_fn, LambdaEvent};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(flatten)]
    config: Config,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve custom resource events from the Lambda runtime (the default).
    Serve,
    /// Print the stack template for an environment.
    Synth {
        #[arg(long, env = "ENVIRONMENT", default_value = "development")]
        environment: Environment,
    },
    /// Print the Helm values computed for a raw environment setting.
    Resolve { environment: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let args = Args::parse();
    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(args.config).await,
        Command::Synth { environment } => {
            let template = Stack::eks_helm(environment)
                .synth()
                .context("failed to synthesize stack")?;
            println!("{}", serde_json::to_string_pretty(&template)?);
            Ok(())
        }
        Command::Resolve { environment } => {
            let values = helm_values_resolver::resolve(&environment);
            println!("{}", serde_json::to_string_pretty(&values)?);
            Ok(())
        }
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    log::info!(
        "Serving with {:?} store, parameter {}",
        config.store,
        config.parameter_name
    );

    match config.store {
        StoreKind::Ssm => {
            let store = SsmParameterStore::from_env().await;
            run(Handler::new(store, config.parameter_name)).await
        }
        StoreKind::ConfigMap => {
            let client = kube_client::Client::try_default()
                .await
                .context("failed to create Kubernetes client")?;
            let store = ConfigMapStore::new(
                client,
                &config.config_map_namespace,
                config.config_map_name,
            );
            run(Handler::new(store, config.parameter_name)).await
        }
    }
}

async fn run<S: ParameterStore + Sync>(handler: Handler<S>) -> anyhow::Result<()> {
    let handler = &handler;
    lambda_runtime::run(service_fn(
        move |event: LambdaEvent<LifecycleEvent>| async move {
            Ok::<_, lambda_runtime::Error>(handler.handle(event.payload).await)
        },
    ))
    .await
    .map_err(|err| anyhow::anyhow!(err))
    .context("Lambda runtime stopped")
}
