// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
pub mod error;
pub mod persistent_volume;
pub mod persistent_volume_claim;
pub mod quantity;
pub mod resource;
pub mod stateful_set;
