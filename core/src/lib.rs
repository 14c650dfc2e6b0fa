//! Declarative command trees with argv dispatch and piped composition.
//!
//! This crate turns a tree of declared commands into a working program:
//!
//! - [`Argument`]: a positional slot (`<name>`, `<name?>`, `<name...>`).
//! - [`Flag`]: a boolean switch declared as `"-f, --force"`.
//! - [`CliOption`]: a switch that takes the next token as its value, with an
//!   optional default and coercion ([`parsers`]).
//! - [`Command`]: a node owning the above plus children, an action and an
//!   `extends` list of shared commands whose switches it inherits and whose
//!   actions run before its own.
//! - [`CommandArgs`]: the parsed input handed to every action.
//!
//! [`Command::run`] scans argv, routes it down the tree, validates it and runs
//! the target's extends chain followed by its action. Help and version output
//! are rendered by [`help`].
//!
//! # Example
//!
//! ```
//! use command_pipe_core::*;
//! use futures::executor::block_on;
//! use serde_json::json;
//!
//! let build = Command::new("build <args?...>")
//!     .unwrap()
//!     .with_option(CliOption::new("-s, --source").unwrap().with_default("./"))
//!     .with_sync_action(|input| {
//!         let mut out = PipeResult::new();
//!         out.insert("built".into(), json!(input.option_str("source")));
//!         Ok(out)
//!     });
//!
//! let publish = Command::new("publish <args?...>")
//!     .unwrap()
//!     .with_option(CliOption::new("--url").unwrap())
//!     .extends(build.clone())
//!     .with_sync_action(|input| Ok(input.pipe_result));
//!
//! let root = Command::new("tool")
//!     .unwrap()
//!     .with_command(build)
//!     .unwrap()
//!     .with_command(publish)
//!     .unwrap();
//!
//! match block_on(root.execute(["publish", "--url", "http://x"])) {
//!     Outcome::Resolved(result) => assert_eq!(result["built"], json!("./")),
//!     other => panic!("unexpected outcome: {other:?}"),
//! }
//! ```

mod args;
mod argument;
mod cli;
mod command;
mod dispatch;
mod error;
mod flag;
pub mod help;
mod option;
pub mod parsers;
mod pipeline;

pub use args::{CommandArgs, PipeResult};
pub use argument::{Argument, ArgumentOptions};
pub use cli::{CliOptions, PackageMetadata, program, program_name};
pub use command::{
    Action, Command, DEBUG_FLAG, EXTENDS_ORDER_OFFSET, Extension, HELP_FLAG, OverrideArgs,
    Subcommand, VERSION_FLAG,
};
pub use dispatch::{Dispatch, Exit, ExitReason, Outcome};
pub use error::{ActionError, ConstructionError, MetadataError, Result, UsageError};
pub use flag::{BUILTIN_FLAG_ORDER, DEFAULT_FLAG_ORDER, Flag, FlagOptions};
pub use help::Scope;
pub use option::{CliOption, DEFAULT_OPTION_ORDER, OptionOptions, ValueParser};
