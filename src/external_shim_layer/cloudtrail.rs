// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use crate::external_shim_layer::{AttachmentEvent, AttachmentEventKind, AuditError, AuditTrail};
use async_trait::async_trait;
use aws_sdk_cloudtrail::error::DisplayErrorContext;
use aws_sdk_cloudtrail::types::{Event, LookupAttribute, LookupAttributeKey};
use aws_sdk_cloudtrail::Client;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};
use tracing::*;

/// LookupEvents is rate limited to 2 requests per second per account and region.
pub const DEFAULT_MIN_REQUEST_INTERVAL: Duration = Duration::from_millis(500);

/// CloudTrailAuditTrail reads EC2 AttachVolume/DetachVolume events from CloudTrail.
/// CloudTrail delivers events with a delay of up to ~5 minutes, so a very recent
/// detach may not be visible yet; the reconciler treats that as "not safe".
pub struct CloudTrailAuditTrail {
    client: Client,
    min_request_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl CloudTrailAuditTrail {
    pub fn new(client: Client) -> CloudTrailAuditTrail {
        CloudTrailAuditTrail {
            client,
            min_request_interval: DEFAULT_MIN_REQUEST_INTERVAL,
            last_request: Mutex::new(None),
        }
    }

    /// Builds a client from the default AWS credential and region chain.
    pub async fn from_env() -> CloudTrailAuditTrail {
        let config = aws_config::load_from_env().await;
        CloudTrailAuditTrail::new(Client::new(&config))
    }

    // pace holds the lock across the sleep so concurrent callers queue up.
    async fn pace(&self) {
        let mut last_request = self.last_request.lock().await;
        if let Some(last) = *last_request {
            tokio::time::sleep_until(last + self.min_request_interval).await;
        }
        *last_request = Some(Instant::now());
    }
}

#[async_trait]
impl AuditTrail for CloudTrailAuditTrail {
    async fn lookup_recent_events(
        &self,
        volume_id: &str,
        max_results: i32,
    ) -> Result<Vec<AttachmentEvent>, AuditError> {
        let attribute = LookupAttribute::builder()
            .attribute_key(LookupAttributeKey::ResourceName)
            .attribute_value(volume_id)
            .build()
            .map_err(|e| AuditError::InvalidRequest(e.to_string()))?;

        self.pace().await;
        let output = self
            .client
            .lookup_events()
            .lookup_attributes(attribute)
            .max_results(max_results)
            .send()
            .await
            .map_err(|e| AuditError::LookupFailed(DisplayErrorContext(&e).to_string()))?;

        debug!(
            "LookupEvents returned {} events for {}",
            output.events().len(),
            volume_id
        );
        output
            .events()
            .iter()
            .map(|event| to_attachment_event(event, volume_id))
            .collect()
    }

    async fn probe(&self) -> Result<(), AuditError> {
        self.pace().await;
        self.client
            .lookup_events()
            .max_results(1)
            .send()
            .await
            .map_err(|e| AuditError::LookupFailed(DisplayErrorContext(&e).to_string()))?;
        Ok(())
    }
}

pub fn event_kind(event_name: Option<&str>) -> AttachmentEventKind {
    match event_name {
        Some("AttachVolume") => AttachmentEventKind::Attach,
        Some("DetachVolume") => AttachmentEventKind::Detach,
        _ => AttachmentEventKind::Other,
    }
}

// An event without a timestamp fails the whole lookup: skipping it could hide
// the most recent attach.
fn to_attachment_event(event: &Event, volume_id: &str) -> Result<AttachmentEvent, AuditError> {
    let event_time = event.event_time().ok_or_else(|| {
        AuditError::LookupFailed(format!(
            "event {} has no EventTime",
            event.event_id().unwrap_or("<unknown>")
        ))
    })?;
    let time = DateTime::<Utc>::from_timestamp(event_time.secs(), event_time.subsec_nanos())
        .ok_or_else(|| {
            AuditError::LookupFailed(format!("EventTime {:?} is out of range", event_time))
        })?;
    Ok(AttachmentEvent {
        kind: event_kind(event.event_name()),
        time,
        volume_id: volume_id.to_string(),
    })
}
