mod session;
mod presentation;
mod grid;
mod help;
mod sample_plan;

pub use session::run_tui;
pub use sample_plan::seed_sample_plan;
