// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
//! Command line and environment configuration.

use crate::shim_layer::heartbeat::DEFAULT_HEARTBEAT_FILE;
use clap::{Parser, Subcommand};
use std::fs::{File, OpenOptions};
use std::path::PathBuf;

/// Time between two reconcile passes. Not configurable.
pub const POLL_INTERVAL: std::time::Duration = std::time::Duration::from_secs(30);

pub const DEFAULT_GRACE_MINUTES: u32 = 60;

// Client libraries are very chatty at debug level.
const QUIET_TARGETS: &str = "kube=warn,kube_client=warn,hyper=warn,tower=warn,rustls=warn,aws_config=warn,aws_smithy_runtime=warn,aws_sdk_cloudtrail=warn";

/// Grows and reclaims PersistentVolumeClaims owned by StatefulSets.
///
/// A PVC annotated with `pvc-operator/statefulset: <name>` is deleted once that
/// StatefulSet is gone or scaled below the PVC's ordinal, and its volume has been
/// detached for longer than the grace period. It is grown to the size in the
/// StatefulSet's `pvc-operator/storage-size` annotation, and never shrunk.
#[derive(Parser, Debug)]
#[command(name = "pvc-controller", version, long_about = None)]
pub struct Cli {
    /// Log at debug level instead of info
    #[arg(long, env = "OPERATOR_DEBUG")]
    pub debug: bool,

    /// Minutes a volume must stay detached before its PVC may be deleted
    #[arg(long, env = "PVC_GRACE_MINUTES", default_value_t = DEFAULT_GRACE_MINUTES)]
    pub grace_minutes: u32,

    /// Liveness and readiness marker file
    #[arg(long, env = "HEARTBEAT_FILE", default_value = DEFAULT_HEARTBEAT_FILE)]
    pub heartbeat_file: PathBuf,

    /// Also append log lines to this file, e.g. /app/logs/operator-pvc-manager.log
    #[arg(long, env = "LOG_FILE")]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Reconcile every 30 seconds until terminated (default)
    Run,
    /// Reconcile once and exit
    Once,
}

/// Process-wide settings, fixed at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    pub grace_window: chrono::Duration,
    pub poll_interval: std::time::Duration,
    pub heartbeat_file: PathBuf,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            grace_window: chrono::Duration::minutes(i64::from(DEFAULT_GRACE_MINUTES)),
            poll_interval: POLL_INTERVAL,
            heartbeat_file: PathBuf::from(DEFAULT_HEARTBEAT_FILE),
        }
    }
}

impl Cli {
    pub fn selected_command(&self) -> Command {
        self.command.unwrap_or(Command::Run)
    }

    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            grace_window: chrono::Duration::minutes(i64::from(self.grace_minutes)),
            poll_interval: POLL_INTERVAL,
            heartbeat_file: self.heartbeat_file.clone(),
        }
    }

    /// Opens the log file for appending, creating it if needed.
    pub fn open_log_file(&self) -> std::io::Result<Option<File>> {
        self.log_file
            .as_ref()
            .map(|path| OpenOptions::new().create(true).append(true).open(path))
            .transpose()
    }

    /// Filter directives used when `RUST_LOG` is not set.
    pub fn log_directives(&self) -> String {
        let level = if self.debug { "debug" } else { "info" };
        format!("{},{}", level, QUIET_TARGETS)
    }
}
