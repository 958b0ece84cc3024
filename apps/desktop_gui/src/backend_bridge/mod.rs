//! Backend side of the GUI: command types and the worker thread that owns the
//! submission controller.

pub mod commands;
pub mod runtime;
