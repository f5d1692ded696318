//! CLI command implementations

mod detect;
mod login;
mod prompt;
mod resolve;
pub mod style;
mod validate;

pub use detect::{run_detect, run_providers};
pub use login::{LoginOptions, run_login};
pub use prompt::TerminalPrompter;
pub use resolve::AUTO;
pub use validate::run_validate;
