//! hello-cluster - resolve deployment configuration and greet grains.
//!
//! # Usage
//!
//! Print the node configuration this environment resolves to:
//! ```bash
//! RUN_ON_AWS_ECS=true cargo run --bin hello-cluster -- resolve
//! ```
//!
//! Connect to a local cluster and call HelloWorld grains:
//! ```bash
//! cargo run --bin hello-cluster -- greet alice bob
//! ```
//!
//! `--set KEY=VALUE` overrides the process environment for one run.

use std::error::Error;
use std::time::Duration;

use clap::{Parser, Subcommand};
use hello_cluster::actors::{HelloWorld, HelloWorldRef, LocalCluster};
use hello_cluster::client::{ConnectOptions, ConnectionManager};
use hello_cluster::config::{
    ClientConfig, EnvKeyReader, LayeredKeyReader, MapKeyReader, NodeConfig, SystemHostResolver,
};
use hello_cluster::TokioTimeProvider;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// CLI arguments
#[derive(Parser, Debug)]
#[command(name = "hello-cluster")]
#[command(about = "Cluster client demo for HelloWorld grains", long_about = None)]
struct Args {
    /// Configuration override applied over the environment (repeatable)
    #[arg(long = "set", value_name = "KEY=VALUE", global = true)]
    overrides: Vec<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the resolved node configuration as JSON
    Resolve,
    /// Connect to a local cluster and greet each name
    Greet {
        /// Grain keys to greet
        #[arg(default_value = "world")]
        names: Vec<String>,

        /// Seconds to wait for a graceful close on shutdown
        #[arg(long, default_value_t = 5)]
        shutdown_timeout: u64,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,hello_cluster=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let overrides = MapKeyReader::from_pairs(args.overrides.iter().map(String::as_str))?;
    let reader = LayeredKeyReader::new().layer(EnvKeyReader).layer(overrides);

    match args.command {
        Command::Resolve => {
            let node = NodeConfig::resolve(&reader, &SystemHostResolver).await?;
            println!("{}", serde_json::to_string_pretty(&node)?);
            Ok(())
        }
        Command::Greet {
            names,
            shutdown_timeout,
        } => {
            let local = tokio::task::LocalSet::new();
            local
                .run_until(greet(
                    ClientConfig::resolve(&reader),
                    names,
                    Duration::from_secs(shutdown_timeout),
                ))
                .await
        }
    }
}

async fn greet(
    config: ClientConfig,
    names: Vec<String>,
    shutdown_timeout: Duration,
) -> Result<(), Box<dyn Error>> {
    let builder = LocalCluster::builder().register::<HelloWorld>();
    let mut manager = ConnectionManager::build(
        &builder,
        &config,
        ConnectOptions::default(),
        TokioTimeProvider::new(),
    )?;

    let shutdown = CancellationToken::new();
    let on_ctrl_c = shutdown.clone();
    tokio::task::spawn_local(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_ctrl_c.cancel();
        }
    });

    manager.start(&shutdown).await?;

    let invoker = manager.invoker();
    for name in names {
        let grain: HelloWorldRef<_> = invoker.get_grain(name.as_str());
        match grain.say_hello_world().await {
            Ok(greeting) => println!("{name}: {greeting}"),
            Err(e) => tracing::error!(key = %name, error = %e, "grain call failed"),
        }
    }

    let report = manager.health().check();
    tracing::info!(status = %report.status, state = ?report.state, "cluster client health");

    let deadline = CancellationToken::new();
    let timer = deadline.clone();
    tokio::task::spawn_local(async move {
        tokio::time::sleep(shutdown_timeout).await;
        timer.cancel();
    });
    manager.stop(&deadline).await;

    Ok(())
}
