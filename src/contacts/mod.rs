// ABOUTME: Contact resolution module turning free-text names and roles into canonical identities
// ABOUTME: Exposes the matcher-cascade resolver and the role alias table
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Beacon Project Intelligence

//! # Contact Resolution
//!
//! The model refers to stakeholders by whatever string it saw ("the PM",
//! "jane doe", an email address). This module maps those strings to
//! canonical contact ids; a miss is `None`, never an error.

mod resolver;

pub use resolver::{canonical_role, ContactResolver};
