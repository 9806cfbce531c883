// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use std::path::{Path, PathBuf};

pub const DEFAULT_HEARTBEAT_FILE: &str = "/tmp/heartbeat";

pub const READY: &str = "ready\n";
pub const RUNNING: &str = "running\n";

/// Heartbeat is the liveness and readiness marker read by the Pod's exec probes.
/// `ready` is written once after the startup self-check, `running` after every pass.
#[derive(Debug, Clone)]
pub struct Heartbeat {
    path: PathBuf,
}

impl Heartbeat {
    pub fn new(path: impl Into<PathBuf>) -> Heartbeat {
        Heartbeat { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn ready(&self) -> std::io::Result<()> {
        write_heartbeat(&self.path, READY).await
    }

    pub async fn running(&self) -> std::io::Result<()> {
        write_heartbeat(&self.path, RUNNING).await
    }
}

pub async fn write_heartbeat(path: &Path, content: &str) -> std::io::Result<()> {
    tokio::fs::write(path, content).await
}
