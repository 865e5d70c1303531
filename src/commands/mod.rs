//! # CLI Command Implementations
//!
//! One file per subcommand of the `repo-pin` tool. Each module has:
//! - An `Args` struct deriving `clap::Args` with the command's options.
//! - An `execute` function that takes the parsed `Args` and the global
//!   `--color` value and calls into the `repo_pin` library.

pub mod sync;
pub mod validate;
