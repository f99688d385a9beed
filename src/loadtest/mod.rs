//! Command handlers.

pub mod output;
pub mod run;

pub use output::write_summary;
pub use run::run;
