// SPDX-FileCopyrightText: 2026 Querygate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query-safety validation for model-generated SQL.
//!
//! The [`ValidationPipeline`] runs an ordered chain of independent rules and
//! stops at the first rejection. Table and row-limit extraction sit behind the
//! [`SqlInspector`] trait so the regex heuristics can be swapped for a real
//! parser without touching rule order or callers.

pub mod inspect;
pub mod limit;
pub mod pipeline;
pub mod redact;
pub mod rules;

pub use inspect::{RegexInspector, SqlInspector, TopClause};
pub use limit::enforce_row_limit;
pub use pipeline::{ValidationPipeline, ValidationRule};
pub use redact::redact;
