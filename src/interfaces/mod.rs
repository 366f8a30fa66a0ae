//! Transport layer: turns CSV command rows into lifecycle manager calls and
//! writes the resulting payments back out.

pub mod commands;
pub mod csv;
