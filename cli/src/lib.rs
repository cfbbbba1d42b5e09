//! noob CLI - submit build files to a remote build engine.

pub mod commands;
