//! Affect Lab - Sequential Emotional State Experiments
//!
//! This crate walks tutoring conversations turn by turn, asks a language
//! model to predict the student's emotional state after each tutor reply, and
//! feeds each prediction back in as the next turn's current state.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
