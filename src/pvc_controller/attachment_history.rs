// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use crate::external_shim_layer::{AttachmentEvent, AttachmentEventKind};
use chrono::{DateTime, Duration, Utc};

/// What the audit trail says about the mount state of a volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountVerdict {
    /// The most recent lifecycle event is an attach.
    Attached { at: DateTime<Utc> },
    DetachedWithinGrace { since: DateTime<Utc> },
    DetachedBeyondGrace { since: DateTime<Utc> },
    /// No attach or detach event among the recent events.
    NoEvidence,
}

impl MountVerdict {
    pub fn unmounted_long_enough(&self) -> bool {
        matches!(self, MountVerdict::DetachedBeyondGrace { .. })
    }
}

/// Scans `events` (most recent first) for the first attach or detach event.
///
/// A detach makes the volume deletable only when strictly more than
/// `grace_window` has passed since it. Anything ambiguous is not deletable.
pub fn mount_verdict(
    events: &[AttachmentEvent],
    grace_window: Duration,
    now: DateTime<Utc>,
) -> MountVerdict {
    for event in events {
        match event.kind {
            AttachmentEventKind::Attach => return MountVerdict::Attached { at: event.time },
            AttachmentEventKind::Detach => {
                return if now - event.time > grace_window {
                    MountVerdict::DetachedBeyondGrace { since: event.time }
                } else {
                    MountVerdict::DetachedWithinGrace { since: event.time }
                };
            }
            AttachmentEventKind::Other => continue,
        }
    }
    MountVerdict::NoEvidence
}
