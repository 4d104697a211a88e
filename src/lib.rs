//! Trait Compass - Adaptive Psychometric Assessment Engine
//!
//! This crate implements adaptive item selection for a fixed-length
//! questionnaire: a confidence model over psychological dimensions and a
//! four-stage state machine that spends the question budget where it buys
//! the most certainty.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
