// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use crate::config::ControllerConfig;
use crate::external_shim_layer::AuditTrail;
use crate::kubernetes_api_objects::persistent_volume_claim::StorageClaim;
use crate::pvc_controller::annotation::is_managed;
use crate::pvc_controller::error::{ReconcileError, Severity};
use crate::pvc_controller::reconciler::PVCReconciler;
use crate::pvc_controller::step::ClaimOutcome;
use crate::reconciler::exec::io::*;
use crate::reconciler::exec::reconciler::Reconciler;
use crate::shim_layer::cluster_api::ClusterApi;
use crate::shim_layer::heartbeat::Heartbeat;
use crate::Error;
use chrono::{DateTime, Duration, Utc};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use tokio::sync::watch;
use tracing::*;

/// Counts of what one pass did. Unmanaged claims are not counted.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PassSummary {
    pub managed: usize,
    pub deleted: usize,
    pub resized: usize,
    pub unchanged: usize,
    pub failed: usize,
}

// run_controller verifies every dependency once, then polls all claims until
// shutdown is requested. Claims are processed strictly one after another, since
// the audit trail only serves a couple of requests per second.
pub async fn run_controller<C, A>(
    cluster: &C,
    audit: &A,
    config: &ControllerConfig,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), Error>
where
    C: ClusterApi + ?Sized,
    A: AuditTrail + ?Sized,
{
    let heartbeat = Heartbeat::new(&config.heartbeat_file);
    ready_check(cluster, audit, &heartbeat).await?;
    info!("Loaded up Kubernetes and audit trail clients, starting reconcile loop");

    loop {
        if *shutdown.borrow() {
            break;
        }
        debug!("Starting reconcile pass");
        match reconcile_pass(cluster, audit, config.grace_window, Utc::now(), &shutdown).await {
            Ok(summary) => {
                info!("Reconcile pass finished: {:?}", summary);
                if let Err(err) = heartbeat.running().await {
                    error!(
                        "Failed to write heartbeat {}: {}",
                        heartbeat.path().display(),
                        err
                    );
                }
            }
            Err(err) => error!("Reconcile pass failed: {}, will retry", err),
        }
        tokio::select! {
            _ = tokio::time::sleep(config.poll_interval) => {},
            changed = shutdown.changed() => {
                // A dropped sender can never signal again; stop as well.
                if changed.is_err() {
                    break;
                }
            },
        }
    }
    info!("controller terminated");
    Ok(())
}

// reconcile_once is the one-shot mode: readiness check and a single pass.
pub async fn reconcile_once<C, A>(
    cluster: &C,
    audit: &A,
    config: &ControllerConfig,
) -> Result<PassSummary, Error>
where
    C: ClusterApi + ?Sized,
    A: AuditTrail + ?Sized,
{
    let heartbeat = Heartbeat::new(&config.heartbeat_file);
    ready_check(cluster, audit, &heartbeat).await?;
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let summary = reconcile_pass(cluster, audit, config.grace_window, Utc::now(), &shutdown_rx).await?;
    info!("Reconcile pass finished: {:?}", summary);
    heartbeat.running().await?;
    Ok(summary)
}

/// Probes each dependency once and writes the `ready` marker.
/// Any failure means the loop must not start.
pub async fn ready_check<C, A>(cluster: &C, audit: &A, heartbeat: &Heartbeat) -> Result<(), Error>
where
    C: ClusterApi + ?Sized,
    A: AuditTrail + ?Sized,
{
    cluster
        .probe()
        .await
        .map_err(|e| Error::ReadinessCheckFailed(format!("Kubernetes API: {}", e)))?;
    audit
        .probe()
        .await
        .map_err(|e| Error::ReadinessCheckFailed(format!("audit trail: {}", e)))?;
    heartbeat.ready().await?;
    Ok(())
}

pub async fn reconcile_pass<C, A>(
    cluster: &C,
    audit: &A,
    grace_window: Duration,
    now: DateTime<Utc>,
    shutdown: &watch::Receiver<bool>,
) -> Result<PassSummary, Error>
where
    C: ClusterApi + ?Sized,
    A: AuditTrail + ?Sized,
{
    let claims = cluster.list_claims().await.map_err(|e| {
        Error::ShimLayerError(format!("List PersistentVolumeClaim failed: {}", e))
    })?;
    let reconciler = PVCReconciler::new(grace_window, now);
    let mut summary = PassSummary::default();

    for claim in claims.iter() {
        if *shutdown.borrow() {
            info!("Shutdown requested, ending pass early");
            break;
        }
        debug!("Processing PVC {}", claim.key());
        if !is_managed(claim) {
            continue;
        }
        summary.managed += 1;

        // Every line logged for this claim carries its key.
        let span = info_span!("Reconciling", pvc = %claim.key());
        let result = AssertUnwindSafe(
            reconcile_with(&reconciler, claim, cluster, audit).instrument(span.clone()),
        )
        .catch_unwind()
        .await;
        span.in_scope(|| match result {
            Ok(Ok(ClaimOutcome::Deleted(_))) => summary.deleted += 1,
            Ok(Ok(ClaimOutcome::Resized(_))) => summary.resized += 1,
            Ok(Ok(ClaimOutcome::Unchanged(_))) => summary.unchanged += 1,
            Ok(Err(err)) => {
                report_claim_error(claim, &err);
                summary.failed += 1;
            }
            Err(_) => {
                error!("Reconciling {} panicked, moving on to the next claim", claim.key());
                summary.failed += 1;
            }
        });
    }
    Ok(summary)
}

// reconcile_with drives PVCReconciler::reconcile_core for a single claim.
// It starts from reconcile_init_state and, for each request returned by
// reconcile_core, calls the matching collaborator and feeds the response into
// the next step, until the reconciler reports done or error.
// Failed calls are handed back to reconcile_core, never retried here.
pub async fn reconcile_with<C, A>(
    reconciler: &PVCReconciler,
    claim: &StorageClaim,
    cluster: &C,
    audit: &A,
) -> Result<ClaimOutcome, ReconcileError>
where
    C: ClusterApi + ?Sized,
    A: AuditTrail + ?Sized,
{
    let mut state = reconciler.reconcile_init_state();
    let mut resp_option: Option<Response> = None;

    loop {
        if reconciler.reconcile_done(&state) || reconciler.reconcile_error(&state) {
            debug!("Finished in step {:?}", state.reconcile_step);
            return state.into_outcome();
        }
        let (state_prime, request_option) = reconciler.reconcile_core(claim, resp_option, state);
        resp_option = match request_option {
            Some(Request::KRequest(req)) => Some(Response::KResponse(
                call_kube_api(cluster, req).await,
            )),
            Some(Request::ExternalRequest(req)) => Some(Response::ExternalResponse(
                call_external_api(audit, req).await,
            )),
            None => None,
        };
        state = state_prime;
    }
}

async fn call_kube_api<C>(cluster: &C, req: KubeAPIRequest) -> KubeAPIResponse
where
    C: ClusterApi + ?Sized,
{
    let key = req.key();
    let resp = match req {
        KubeAPIRequest::ListWorkloads { namespace, name } => {
            KubeAPIResponse::ListWorkloads(cluster.list_workloads(&namespace, &name).await)
        }
        KubeAPIRequest::GetVolume { name } => {
            KubeAPIResponse::GetVolume(cluster.get_volume(&name).await)
        }
        KubeAPIRequest::DeleteClaim { namespace, name } => {
            KubeAPIResponse::DeleteClaim(cluster.delete_claim(&namespace, &name).await)
        }
        KubeAPIRequest::PatchClaimSize {
            namespace,
            name,
            size,
        } => KubeAPIResponse::PatchClaimSize(
            cluster.patch_claim_size(&namespace, &name, size).await,
        ),
    };
    let failed = match &resp {
        KubeAPIResponse::ListWorkloads(res) => res.as_ref().err(),
        KubeAPIResponse::GetVolume(res) => res.as_ref().err(),
        KubeAPIResponse::DeleteClaim(res) | KubeAPIResponse::PatchClaimSize(res) => {
            res.as_ref().err()
        }
    };
    match failed {
        Some(err) => debug!("{} failed with error: {}", key, err),
        None => debug!("{} done", key),
    }
    resp
}

async fn call_external_api<A>(audit: &A, req: ExternalRequest) -> ExternalResponse
where
    A: AuditTrail + ?Sized,
{
    let key = req.key();
    match req {
        ExternalRequest::LookupRecentEvents {
            volume_id,
            max_results,
        } => {
            let res = audit.lookup_recent_events(&volume_id, max_results).await;
            match &res {
                Ok(events) => debug!("{} returned {} events", key, events.len()),
                Err(err) => debug!("{} failed with error: {}", key, err),
            }
            ExternalResponse::LookupRecentEvents(res)
        }
    }
}

fn report_claim_error(claim: &StorageClaim, err: &ReconcileError) {
    match err.severity() {
        Severity::Warning => warn!("Skipping PVC {}: {}", claim.key(), err),
        Severity::Error => error!("Skipping PVC {}: {}", claim.key(), err),
    }
}
