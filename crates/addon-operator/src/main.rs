use std::sync::Arc;

use addon_operator::context::{Context, OperatorConfig};
use addon_operator::{addon_operator_controller, controller, server, telemetry};
use anyhow::Result;
use clap::{Parser, Subcommand};
use kube::Client;
use tracing::error;

const METRICS_PORT: u16 = 8080;

#[derive(Parser)]
#[command(
    name = "addon-operator",
    about = "Installs Addons through OLM and reports their upgrades to OCM"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the Addon and AddonOperator CRD YAML to stdout.
    Crd,
}

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init();

    let cli = Cli::parse();

    if let Some(Commands::Crd) = cli.command {
        return controller::print_crd();
    }

    let client = Client::try_default().await?;
    let ctx = Arc::new(Context::new(client, OperatorConfig::from_env()));
    let state = server::ServerState::new();

    // Run the metrics/health server and both controllers concurrently.
    // If any exits, shut down.
    tokio::select! {
        res = server::run(METRICS_PORT, state.clone()) => {
            error!("metrics server exited: {res:?}");
            res
        }
        res = controller::run(ctx.clone(), state) => {
            res
        }
        res = addon_operator_controller::run(ctx) => {
            res
        }
    }
}
