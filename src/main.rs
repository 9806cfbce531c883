// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use anyhow::{Context, Result};
use clap::Parser;
use pvc_controller::config::{Cli, Command};
use pvc_controller::external_shim_layer::cloudtrail::CloudTrailAuditTrail;
use pvc_controller::shim_layer::cluster_api::KubeClusterApi;
use pvc_controller::shim_layer::controller_runtime::{reconcile_once, run_controller};
use std::sync::Mutex;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::watch;
use tracing::*;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_directives()));
    let log_file = cli.open_log_file().context("Failed to open log file")?;
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(log_file.map(|file| {
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file))
        }))
        .init();

    info!("Started PVC Operator");
    let config = cli.controller_config();
    debug!("Using {:?}", config);

    let cluster = KubeClusterApi::try_default()
        .await
        .context("Failed to create Kubernetes client")?;
    let audit = CloudTrailAuditTrail::from_env().await;

    match cli.selected_command() {
        Command::Run => {
            let (shutdown_tx, shutdown_rx) = watch::channel(false);
            let mut sigterm =
                signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?;
            tokio::spawn(async move {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => info!("Received SIGINT"),
                    _ = sigterm.recv() => info!("Received SIGTERM"),
                }
                let _ = shutdown_tx.send(true);
            });
            run_controller(&cluster, &audit, &config, shutdown_rx).await?;
        }
        Command::Once => {
            let summary = reconcile_once(&cluster, &audit, &config).await?;
            info!("Processed {} managed PVCs", summary.managed);
        }
    }

    info!("Bye.");
    Ok(())
}
