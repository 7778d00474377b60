// SPDX-FileCopyrightText: 2026 Querygate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation handling shared by every SQL generator backend.
//!
//! - [`Conversation`]: caller-owned session state (messages, variables, language)
//! - [`detect_language`]: English vs Hinglish detection
//! - [`build_prompt`]: the instruction/schema/history prompt sent to models
//! - [`parse_response`]: turns a model reply into a [`GenerationResult`](querygate_core::GenerationResult)

pub mod conversation;
pub mod language;
pub mod prompt;
pub mod response;

pub use conversation::Conversation;
pub use language::detect_language;
pub use prompt::{Prompt, build_prompt};
pub use response::{DEFAULT_CLARIFICATION, parse_response};
