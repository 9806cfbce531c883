// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
pub mod cloudtrail;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Number of audit events fetched per volume. The attach/detach event we are
/// looking for can get drowned out by other calls on the same volume, such as tagging.
pub const RECENT_EVENT_WINDOW: i32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentEventKind {
    Attach,
    Detach,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentEvent {
    pub kind: AttachmentEventKind,
    pub time: DateTime<Utc>,
    pub volume_id: String,
}

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("failed to build audit lookup request: {0}")]
    InvalidRequest(String),
    #[error("audit lookup failed: {0}")]
    LookupFailed(String),
}

// AuditTrail is the external api of the reconciler. It answers what happened
// to a volume, because Kubernetes does not record when a volume was detached.
#[async_trait]
pub trait AuditTrail: Send + Sync {
    /// Returns at most `max_results` events about `volume_id`, most recent first.
    async fn lookup_recent_events(
        &self,
        volume_id: &str,
        max_results: i32,
    ) -> Result<Vec<AttachmentEvent>, AuditError>;

    /// Issues one unfiltered lookup to verify network access and permissions.
    async fn probe(&self) -> Result<(), AuditError>;
}
