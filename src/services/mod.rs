pub mod diagnostics;
pub mod status_reporter;
