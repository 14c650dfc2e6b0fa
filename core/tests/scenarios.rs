use std::sync::{Arc, Mutex};

use command_pipe_core::{
    ActionError, CliOption, Command, CommandArgs, ExitReason, Flag, Outcome, PipeResult,
    UsageError, parsers,
};
use futures::executor::block_on;
use serde_json::{Value, json};

type Seen = Arc<Mutex<Vec<(String, CommandArgs)>>>;

fn build_command(seen: &Seen) -> Command {
    let seen = Arc::clone(seen);
    Command::new("build <args?...>")
        .unwrap()
        .with_description("Build the definitions")
        .with_option(CliOption::new("-s, --source").unwrap().with_default("./"))
        .with_option(
            CliOption::new("-t, --pattern")
                .unwrap()
                .with_default("/**/*.ts,!/**/*.spec.ts")
                .with_parser(parsers::list),
        )
        .with_flag(Flag::new("--no-cache").unwrap())
        .with_sync_action(move |input| {
            seen.lock().unwrap().push(("build".into(), input));
            let mut out = PipeResult::new();
            out.insert("artifact".into(), json!("dist/defs.json"));
            Ok(out)
        })
}

fn publish_command(seen: &Seen, build: Arc<Command>) -> Command {
    let seen = Arc::clone(seen);
    Command::new("publish <args?...>")
        .unwrap()
        .with_description("Publish the definitions")
        .with_option(CliOption::new("--url").unwrap().with_default("http://localhost"))
        .extends(build)
        .with_sync_action(move |input| {
            seen.lock().unwrap().push(("publish".into(), input.clone()));
            Ok(input.pipe_result)
        })
}

fn program(seen: &Seen) -> Command {
    let build = Arc::new(build_command(seen));
    Command::new("microdocs")
        .unwrap()
        .with_version("1.0.0")
        .with_command(Arc::clone(&build))
        .unwrap()
        .with_command(publish_command(seen, build))
        .unwrap()
}

fn seen_calls(seen: &Seen) -> Vec<(String, CommandArgs)> {
    seen.lock().unwrap().clone()
}

#[test]
fn build_without_arguments_applies_defaults() {
    let seen = Seen::default();
    let outcome = block_on(program(&seen).execute(["build"]));
    assert!(matches!(outcome, Outcome::Resolved(_)));

    let calls = seen_calls(&seen);
    assert_eq!(calls.len(), 1);
    let (name, input) = &calls[0];
    assert_eq!(name, "build");
    assert!(input.args.is_empty());
    assert_eq!(input.options["source"], json!("./"));
    assert_eq!(input.options["pattern"], json!(["/**/*.ts", "!/**/*.spec.ts"]));
    assert!(!input.flags.contains_key("no-cache"));
}

#[test]
fn build_collects_rest_arguments_and_option_value() {
    let seen = Seen::default();
    block_on(program(&seen).execute(["build", "a", "b", "--source", "/x"]));

    let calls = seen_calls(&seen);
    let (_, input) = &calls[0];
    assert_eq!(input.args, ["a", "b"]);
    assert_eq!(input.options["source"], json!("/x"));
}

#[test]
fn publish_runs_build_first_and_sees_its_result() {
    let seen = Seen::default();
    let outcome = block_on(program(&seen).execute(["publish", "--url", "http://x", "--no-cache"]));

    let calls = seen_calls(&seen);
    let order: Vec<&str> = calls.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(order, ["build", "publish"]);

    // build observes the shared input, including publish's own option
    let (_, build_input) = &calls[0];
    assert_eq!(build_input.options["url"], json!("http://x"));
    assert!(build_input.flag("no-cache"));

    let (_, publish_input) = &calls[1];
    assert_eq!(
        publish_input.pipe_result.get("artifact"),
        Some(&json!("dist/defs.json"))
    );
    assert_eq!(publish_input.options["source"], json!("./"));

    match outcome {
        Outcome::Resolved(result) => {
            assert_eq!(Value::Object(result), json!({"artifact": "dist/defs.json"}))
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[test]
fn unknown_switch_is_a_usage_error_with_exit_code_one() {
    let seen = Seen::default();
    let outcome = block_on(program(&seen).execute(["--bogus"]));
    match outcome {
        Outcome::Exit(exit) => {
            assert_eq!(exit.code, 1);
            assert_eq!(
                exit.reason,
                ExitReason::Usage(UsageError::UnknownSwitch("--bogus".into()))
            );
            assert!(exit.output.contains("Usage: microdocs [command]"));
            assert!(exit.output.contains("Commands:"));
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert!(seen_calls(&seen).is_empty());
}

#[test]
fn subcommand_help_lists_inherited_switches_after_local_options() {
    let seen = Seen::default();
    let outcome = block_on(program(&seen).execute(["publish", "--help"]));
    let Outcome::Exit(exit) = outcome else {
        panic!("expected help exit");
    };
    assert_eq!(exit.code, 0);
    assert!(exit.output.contains("Usage: microdocs publish [options] <args?...>"));

    let position = |needle: &str| exit.output.find(needle).unwrap();
    // --url is local (order 1000); build's --source/--pattern/--no-cache are
    // inherited at 1050, so they cluster after it but before help/version
    assert!(position("--url") < position("--source"));
    assert!(position("--url") < position("--no-cache"));
    assert!(position("--source") < position("--pattern"));
    assert!(position("--pattern") < position("--help"));
    assert!(position("--no-cache") < position("--help"));
}

#[test]
fn failing_extension_rejects_without_running_owner() {
    let ran_owner = Arc::new(Mutex::new(false));
    let flag = Arc::clone(&ran_owner);
    let lint = Command::new("lint")
        .unwrap()
        .with_sync_action(|_| Err(ActionError::msg("lint failed")));
    let release = Command::new("release")
        .unwrap()
        .extends(lint)
        .with_sync_action(move |_| {
            *flag.lock().unwrap() = true;
            Ok(PipeResult::new())
        });

    let outcome = block_on(release.execute(Vec::<String>::new()));
    match &outcome {
        Outcome::Rejected { error, debug } => {
            assert_eq!(error.to_string(), "lint failed");
            assert!(!debug);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(outcome.error_report().as_deref(), Some("lint failed"));
    assert!(!*ran_owner.lock().unwrap());
}

#[test]
fn debug_flag_switches_report_to_trace() {
    let root = command_pipe_core::program(command_pipe_core::CliOptions {
        name: Some("tool".into()),
        ..Default::default()
    })
    .unwrap()
    .with_sync_action(|_| {
        Err(ActionError::new(std::io::Error::other("disk full")))
    });

    let outcome = block_on(root.execute(["--cli-debug"]));
    assert!(matches!(outcome, Outcome::Rejected { debug: true, .. }));
    let report = outcome.error_report().unwrap();
    assert!(report.starts_with("disk full"));
    assert!(report.contains("Source("));
}
