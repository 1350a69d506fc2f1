//! # Engine Module
//!
//! Sanitization and repair logic of the receptor preparation pipeline.
//!
//! ## Overview
//!
//! The engine turns a raw structure into a clean one in two stages. The [`sanitizer`] selects
//! one model, resolves alternate-location disorder through the [`disorder`] resolver and drops
//! waters or hetero groups, all by filtering at serialization time with the
//! [`selector::SanitizingSelector`]. The [`repair`] chain then applies an ordered list of
//! operations, each delegating the heavy lifting to an out-of-process engine behind the
//! [`external`] boundary while owning sequencing, precondition bookkeeping and findings.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Selection policy, engine settings and the prepare config
//!   builder
//! - **Sanitization** ([`disorder`], [`selector`], [`sanitizer`]) - Model, disorder, water and
//!   hetero filtering
//! - **Repair** ([`repair`], [`findings`]) - Operation chain and the findings it reports
//! - **External engines** ([`external`]) - pdbfixer and MODELLER drivers, hand-off files and
//!   the adapter that seeds engine state
//! - **Progress Monitoring** ([`progress`]) - Phase and task events for front ends
//! - **Error Handling** ([`error`]) - The pipeline's fatal error taxonomy

pub mod config;
pub mod disorder;
pub mod error;
pub mod external;
pub mod findings;
pub mod progress;
pub mod repair;
pub mod sanitizer;
pub mod selector;
