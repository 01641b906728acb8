// SPDX-FileCopyrightText: 2026 Proctor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules for CRUD operations on storage entities.

pub mod candidates;
pub mod interviews;
pub mod profiles;
pub mod queue;
pub mod transcripts;
pub mod turns;
