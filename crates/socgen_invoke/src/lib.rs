//! Running the external netlist generators.
//!
//! Build configurations are rendered into generator flags, wrapped into a
//! build-tool command line and run as a blocking child process. Failures
//! are reported as [`ProcessError`]s and never retried.

#![warn(missing_docs)]

pub mod args;
pub mod checkout;
pub mod command;
pub mod error;
pub mod process;

pub use args::render_args;
pub use checkout::{git_checkout, Checkout};
pub use command::GeneratorCommand;
pub use error::ProcessError;
pub use process::{invoke, CancelFlag, InvokeOptions};
