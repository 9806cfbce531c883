// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
pub mod cluster_api;
pub mod controller_runtime;
pub mod heartbeat;
