// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
pub mod annotation;
pub mod attachment_history;
pub mod decision;
pub mod error;
pub mod reconciler;
pub mod step;
