//! Normalization pipeline for D&D Beyond character documents.
//!
//! [`core_api::Engine`] opens a source document into a [`core_api::Session`],
//! which owns the modifier index and the derived statblock and hands out the
//! attack, spell, feature and inventory extractions.

pub mod ability;
pub mod armor;
pub mod attacks;
pub mod core_api;
pub mod damage;
pub mod diagnostics;
pub mod dice;
pub mod document;
pub mod features;
pub mod heuristics;
pub mod inventory;
pub mod modifiers;
pub mod skills;
pub mod spells;
pub mod stats;
