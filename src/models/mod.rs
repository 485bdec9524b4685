//! Domain model module declarations.

pub mod line;
