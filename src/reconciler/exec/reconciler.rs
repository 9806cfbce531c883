// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use crate::reconciler::exec::io::{Request, Response};

// A reconciler is a step function: each call of reconcile_core consumes the
// response to the previous request and returns the next state together with at
// most one new request. The shim layer sends the request and feeds the response
// back until reconcile_done or reconcile_error holds.
pub trait Reconciler {
    type R;
    type T;

    fn reconcile_init_state(&self) -> Self::T;

    fn reconcile_core(
        &self,
        obj: &Self::R,
        resp_o: Option<Response>,
        state: Self::T,
    ) -> (Self::T, Option<Request>);

    fn reconcile_done(&self, state: &Self::T) -> bool;

    fn reconcile_error(&self, state: &Self::T) -> bool;
}
