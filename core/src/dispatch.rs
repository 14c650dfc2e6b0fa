//! Argv scanning, validation and subcommand routing.
//!
//! Dispatch is split in two phases. [`Command::dispatch`] is synchronous and
//! pure: it walks argv down the tree and yields either an invocation or an
//! [`Exit`] carrying rendered help/version text. [`Command::execute`] then runs
//! the invocation through the extends pipeline, and [`Command::run`] applies
//! the process-level side effects (printing, exit codes).

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::debug;

use crate::args::{CommandArgs, PipeResult};
use crate::command::{Command, DEBUG_FLAG, HELP_FLAG, VERSION_FLAG};
use crate::error::{ActionError, UsageError};
use crate::help::{self, Scope};
use crate::pipeline;

/// Why an invocation ended without running an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitReason {
    /// `--help` was given.
    Help,
    /// `--version` was given.
    Version,
    /// Argv did not fit the command.
    Usage(UsageError),
}

/// Terminal outcome of parsing: text for stdout and a process exit code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exit {
    pub reason: ExitReason,
    pub output: String,
    pub code: i32,
}

/// Result of walking argv down the command tree.
#[derive(Debug)]
pub enum Dispatch<'a> {
    /// `command` is the target and `input` its parsed arguments.
    Invoke {
        command: &'a Command,
        input: CommandArgs,
    },
    /// Help, version or a usage error.
    Exit(Exit),
}

/// Result of a complete invocation.
#[derive(Debug)]
pub enum Outcome {
    /// The action chain resolved with this value.
    Resolved(PipeResult),
    /// The action chain rejected. `debug` is set when `--cli-debug` was given.
    Rejected { error: ActionError, debug: bool },
    /// Parsing stopped before any action ran.
    Exit(Exit),
}

impl Outcome {
    /// Text for the error channel, if the invocation failed in an action.
    pub fn error_report(&self) -> Option<String> {
        match self {
            Self::Rejected { error, debug: true } => Some(error.trace()),
            Self::Rejected { error, debug: false } => Some(error.to_string()),
            _ => None,
        }
    }
}

/// Accumulators threaded from a parent's parse pass into its child's.
#[derive(Debug, Clone, Default)]
struct ParseContext {
    scope: Scope,
    options: BTreeMap<String, Value>,
    flags: BTreeMap<String, bool>,
}

impl Command {
    /// Parses `argv` and routes it to the command that should run.
    ///
    /// # Examples
    ///
    /// ```
    /// use command_pipe_core::{Command, Dispatch, ExitReason, UsageError};
    ///
    /// let tool = Command::new("tool <name>")
    ///     .unwrap()
    ///     .with_sync_action(|_| Ok(Default::default()));
    ///
    /// let argv = vec!["alice".to_string()];
    /// match tool.dispatch(&argv) {
    ///     Dispatch::Invoke { input, .. } => assert_eq!(input.args, ["alice"]),
    ///     Dispatch::Exit(_) => unreachable!(),
    /// }
    ///
    /// match tool.dispatch(&[]) {
    ///     Dispatch::Exit(exit) => {
    ///         assert_eq!(exit.code, 1);
    ///         assert_eq!(exit.reason, ExitReason::Usage(UsageError::MissingArgument("name".into())));
    ///     }
    ///     Dispatch::Invoke { .. } => unreachable!(),
    /// }
    /// ```
    pub fn dispatch(&self, argv: &[String]) -> Dispatch<'_> {
        let context = ParseContext {
            scope: Scope::of(self),
            ..Default::default()
        };
        self.dispatch_in(argv, context)
    }

    fn dispatch_in(&self, argv: &[String], mut context: ParseContext) -> Dispatch<'_> {
        let options = self.options();
        let mut args: Vec<String> = Vec::new();
        let mut trail: &[String] = &[];

        let mut index = 0;
        while index < argv.len() {
            let token = &argv[index];

            if !token.starts_with('-') {
                args.push(token.clone());
                if !self.children().is_empty() {
                    trail = &argv[index + 1..];
                    break;
                }
                index += 1;
                continue;
            }

            let switch = token.trim_start_matches('-');
            if let Some(option) = self.find_option(switch) {
                let Some(value) = argv.get(index + 1).filter(|v| !v.is_empty()) else {
                    return self.usage_exit(
                        &context.scope,
                        UsageError::MissingOptionValue(token.clone()),
                    );
                };
                debug!(command = %self.name(), option = option.name(), "Resolved option from argv");
                context
                    .options
                    .insert(option.name().to_string(), option.parse(value));
                index += 2;
                continue;
            }

            if let Some(flag) = self.find_flag(switch) {
                let name = flag.name();
                context.flags.insert(name.to_string(), true);
                if name == VERSION_FLAG {
                    return Dispatch::Exit(Exit {
                        reason: ExitReason::Version,
                        output: help::version(&context.scope),
                        code: 0,
                    });
                }
                if name == HELP_FLAG {
                    return Dispatch::Exit(Exit {
                        reason: ExitReason::Help,
                        output: help::help(self, &context.scope),
                        code: 0,
                    });
                }
            } else if self.is_strict() {
                return self.usage_exit(&context.scope, UsageError::UnknownSwitch(token.clone()));
            } else {
                debug!(command = %self.name(), switch = %token, "Ignoring unknown switch");
            }
            index += 1;
        }

        for option in &options {
            if context.options.contains_key(option.name()) {
                continue;
            }
            if let Some(value) = option.default_value() {
                debug!(command = %self.name(), option = option.name(), "Applying option default");
                context.options.insert(option.name().to_string(), value);
            }
        }

        if self.children().is_empty() {
            if let Err(err) = self.validate_positionals(&args) {
                return self.usage_exit(&context.scope, err);
            }
        }

        if let Some(child) = args.first().and_then(|first| self.find_child(first)) {
            debug!(command = %self.name(), child = %child.name(), "Routing to subcommand");
            let scope = context.scope.enter(child);
            return child.dispatch_in(trail, ParseContext { scope, ..context });
        }

        if self.action().is_some() {
            return Dispatch::Invoke {
                command: self,
                input: CommandArgs {
                    args,
                    options: context.options,
                    flags: context.flags,
                    pipe_result: PipeResult::new(),
                },
            };
        }

        self.usage_exit(&context.scope, UsageError::NoAction)
    }

    fn validate_positionals(&self, args: &[String]) -> Result<(), UsageError> {
        let declared = self.arguments();
        for (index, argument) in declared.iter().enumerate() {
            if argument.required() && args.get(index).is_none() {
                return Err(UsageError::MissingArgument(argument.name().to_string()));
            }
        }
        if let Some(last) = declared.last() {
            if !last.rest() && args.len() > declared.len() {
                return Err(UsageError::TooManyArguments {
                    expected: declared.len(),
                    actual: args.len(),
                });
            }
        }
        Ok(())
    }

    fn usage_exit(&self, scope: &Scope, err: UsageError) -> Dispatch<'_> {
        debug!(command = %self.name(), error = %err, "Usage error");
        Dispatch::Exit(Exit {
            reason: ExitReason::Usage(err),
            output: help::help(self, scope),
            code: 1,
        })
    }

    /// Parses `argv` and runs the matched action chain without touching the
    /// process.
    pub async fn execute<I, S>(&self, argv: I) -> Outcome
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let argv: Vec<String> = argv.into_iter().map(Into::into).collect();
        match self.dispatch(&argv) {
            Dispatch::Exit(exit) => Outcome::Exit(exit),
            Dispatch::Invoke { command, input } => {
                let debug = input.flag(DEBUG_FLAG);
                match pipeline::invoke(command, input).await {
                    Ok(result) => Outcome::Resolved(result),
                    Err(error) => Outcome::Rejected { error, debug },
                }
            }
        }
    }

    /// Parses `argv`, runs the matched action chain and applies the outcome.
    ///
    /// Help, version and usage errors are printed to stdout and terminate the
    /// process with their exit code. Action failures are reported on stderr and
    /// returned; no exit code is forced for them.
    pub fn run<I, S>(&self, argv: I) -> Outcome
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let outcome = futures::executor::block_on(self.execute(argv));
        if let Outcome::Exit(exit) = &outcome {
            print!("{}", exit.output);
            std::process::exit(exit.code);
        }
        if let Some(report) = outcome.error_report() {
            eprintln!("{report}");
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{CliOption, Flag, parsers};

    fn argv(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    fn noop(cmd: Command) -> Command {
        cmd.with_sync_action(|_| Ok(PipeResult::new()))
    }

    fn invoked(dispatch: Dispatch<'_>) -> (String, CommandArgs) {
        match dispatch {
            Dispatch::Invoke { command, input } => (command.name().to_string(), input),
            Dispatch::Exit(exit) => panic!("unexpected exit: {exit:?}"),
        }
    }

    fn exited(dispatch: Dispatch<'_>) -> Exit {
        match dispatch {
            Dispatch::Invoke { command, .. } => panic!("unexpected invoke of {}", command.name()),
            Dispatch::Exit(exit) => exit,
        }
    }

    #[test]
    fn test_option_consumes_next_token() {
        let cmd = noop(
            Command::new("copy <files...>")
                .unwrap()
                .with_option(CliOption::new("-o, --out").unwrap()),
        );
        let (_, input) = invoked(cmd.dispatch(&argv(&["a", "-o", "dist", "b"])));
        assert_eq!(input.args, ["a", "b"]);
        assert_eq!(input.options["out"], json!("dist"));
    }

    #[test]
    fn test_missing_option_value() {
        let cmd = noop(Command::new("x").unwrap().with_option(CliOption::new("--out").unwrap()));
        let exit = exited(cmd.dispatch(&argv(&["--out"])));
        assert_eq!(exit.code, 1);
        assert_eq!(
            exit.reason,
            ExitReason::Usage(UsageError::MissingOptionValue("--out".into()))
        );

        let exit = exited(cmd.dispatch(&argv(&["--out", ""])));
        assert_eq!(exit.code, 1);
    }

    #[test]
    fn test_any_number_of_dashes_is_a_switch() {
        let cmd = noop(Command::new("x").unwrap().with_flag(Flag::new("-f, --force").unwrap()));
        let (_, input) = invoked(cmd.dispatch(&argv(&["---force"])));
        assert!(input.flag("force"));
        let (_, input) = invoked(cmd.dispatch(&argv(&["--f"])));
        assert!(input.flag("force"));
    }

    #[test]
    fn test_unknown_switch_strict_and_lenient() {
        let strict = noop(Command::new("x").unwrap());
        let exit = exited(strict.dispatch(&argv(&["--bogus"])));
        assert_eq!(exit.code, 1);
        assert_eq!(
            exit.reason,
            ExitReason::Usage(UsageError::UnknownSwitch("--bogus".into()))
        );
        assert!(exit.output.contains("Usage: x"));

        let lenient = noop(Command::new("x").unwrap().with_strict(false));
        let (_, input) = invoked(lenient.dispatch(&argv(&["--bogus"])));
        assert!(input.flags.is_empty());
        assert!(input.args.is_empty());
    }

    #[test]
    fn test_help_and_version_exit_zero() {
        let cmd = noop(Command::new("x").unwrap().with_version("3.1.4"));
        let exit = exited(cmd.dispatch(&argv(&["-V"])));
        assert_eq!(exit.reason, ExitReason::Version);
        assert_eq!(exit.code, 0);
        assert_eq!(exit.output, "Version: 3.1.4\n");

        let exit = exited(cmd.dispatch(&argv(&["--HELP"])));
        assert_eq!(exit.reason, ExitReason::Help);
        assert_eq!(exit.code, 0);
        assert!(exit.output.contains("output usage information"));
    }

    #[test]
    fn test_too_many_arguments() {
        let cmd = noop(Command::new("x <one> <two?>").unwrap());
        let (_, input) = invoked(cmd.dispatch(&argv(&["a"])));
        assert_eq!(input.args, ["a"]);
        let exit = exited(cmd.dispatch(&argv(&["a", "b", "c"])));
        assert_eq!(
            exit.reason,
            ExitReason::Usage(UsageError::TooManyArguments {
                expected: 2,
                actual: 3
            })
        );
    }

    #[test]
    fn test_no_declared_arguments_accepts_positionals() {
        let cmd = noop(Command::new("x").unwrap());
        let (_, input) = invoked(cmd.dispatch(&argv(&["a", "b"])));
        assert_eq!(input.args, ["a", "b"]);
    }

    #[test]
    fn test_defaults_apply_parser() {
        let cmd = noop(
            Command::new("x").unwrap().with_option(
                CliOption::new("--pattern")
                    .unwrap()
                    .with_default("a,b")
                    .with_parser(parsers::list),
            ),
        );
        let (_, input) = invoked(cmd.dispatch(&[]));
        assert_eq!(input.options["pattern"], json!(["a", "b"]));
    }

    #[test]
    fn test_routing_carries_parent_switches_and_trail() {
        let child = noop(
            Command::new("deploy <env>")
                .unwrap()
                .with_option(CliOption::new("--region").unwrap()),
        );
        let root = Command::new("tool")
            .unwrap()
            .with_flag(Flag::new("-v, --verbose").unwrap())
            .with_command(child)
            .unwrap();

        let (name, input) = invoked(root.dispatch(&argv(&["-v", "DEPLOY", "prod", "--region", "eu"])));
        assert_eq!(name, "deploy");
        assert_eq!(input.args, ["prod"]);
        assert!(input.flag("verbose"));
        assert_eq!(input.options["region"], json!("eu"));
    }

    #[test]
    fn test_parent_scope_is_used_for_child_help() {
        let root = Command::new("tool")
            .unwrap()
            .with_version("9.9.9")
            .with_command(noop(Command::new("deploy <env>").unwrap()))
            .unwrap();

        let exit = exited(root.dispatch(&argv(&["deploy"])));
        assert_eq!(exit.code, 1);
        assert!(exit.output.contains("Usage: tool deploy <env>"));

        let exit = exited(root.dispatch(&argv(&["deploy", "--version"])));
        assert_eq!(exit.output, "Version: 9.9.9\n");
    }

    #[test]
    fn test_parent_without_match_falls_back_to_own_action() {
        let root = noop(
            Command::new("tool")
                .unwrap()
                .with_command(noop(Command::new("deploy").unwrap()))
                .unwrap(),
        );
        let (name, input) = invoked(root.dispatch(&argv(&["status", "ignored"])));
        assert_eq!(name, "tool");
        assert_eq!(input.args, ["status"]);
    }

    #[test]
    fn test_no_route_and_no_action_is_usage_error() {
        let root = Command::new("tool")
            .unwrap()
            .with_command(noop(Command::new("deploy").unwrap()))
            .unwrap();
        let exit = exited(root.dispatch(&[]));
        assert_eq!(exit.reason, ExitReason::Usage(UsageError::NoAction));
        assert!(exit.output.contains("Commands:"));
    }

    #[test]
    fn test_local_flag_beats_inherited_on_shared_alias() {
        let base = Command::new("base")
            .unwrap()
            .with_flag(Flag::new("-s, --silent").unwrap());
        let cmd = noop(
            Command::new("cmd")
                .unwrap()
                .with_flag(Flag::new("-s, --strict-mode").unwrap())
                .extends(base),
        );
        let (_, input) = invoked(cmd.dispatch(&argv(&["-s"])));
        assert!(input.flag("strict-mode"));
        assert!(!input.flag("silent"));
    }

    #[test]
    fn test_inherited_option_is_resolved() {
        let build = Command::new("build")
            .unwrap()
            .with_option(CliOption::new("-s, --source").unwrap().with_default("./"));
        let publish = noop(Command::new("publish").unwrap().extends(build));
        let (_, input) = invoked(publish.dispatch(&argv(&["-s", "/src"])));
        assert_eq!(input.options["source"], json!("/src"));
    }
}
