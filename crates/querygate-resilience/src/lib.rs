// SPDX-FileCopyrightText: 2026 Querygate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Resilience primitives for SQL generators.
//!
//! [`RetryingGenerator`] wraps any [`SqlGenerator`](querygate_core::SqlGenerator)
//! and retries transient failures on a fixed escalating schedule. The wrapped
//! generator never knows it is being retried.

pub mod retry;

pub use retry::{RETRYABLE_MARKERS, RetryPolicy, RetryingGenerator, is_retryable};
