//! Core primitives shared by every component

pub mod rules;
pub mod time;
