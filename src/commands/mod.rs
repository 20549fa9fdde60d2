//! One-shot CLI commands.

pub mod check;
pub mod help;
pub mod reload;
pub mod simulate;
pub mod stop;
