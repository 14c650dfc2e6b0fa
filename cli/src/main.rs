use std::sync::Arc;

use command_pipe_core::{
    ActionError, CliOption, CliOptions, Command, CommandArgs, Flag, Outcome, PipeResult,
    package_metadata, parsers, program,
};
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn build_command() -> command_pipe_core::Result<Command> {
    Ok(Command::new("build <args?...>")?
        .with_description("Build the definitions")
        .with_order(1)
        .with_option(
            CliOption::new("-s, --source <dir>")?
                .with_description("source folder")
                .with_default("./"),
        )
        .with_option(
            CliOption::new("-t, --pattern <globs>")?
                .with_description("patterns to match source files")
                .with_default("/**/*.ts,!/**/*.spec.ts")
                .with_parser(parsers::list),
        )
        .with_flag(Flag::new("--no-cache")?.with_description("ignore cached results"))
        .with_sync_action(|input| {
            print_input("build", &input)?;
            let mut result = PipeResult::new();
            let source = input.option_str("source").unwrap_or(".").trim_end_matches('/');
            result.insert(
                "artifact".into(),
                json!(format!("{source}/definitions.json")),
            );
            Ok(result)
        }))
}

fn publish_command(build: Arc<Command>) -> command_pipe_core::Result<Command> {
    Ok(Command::new("publish <args?...>")?
        .with_description("Publish the definitions")
        .with_order(2)
        .with_option(
            CliOption::new("--url <url>")?
                .with_description("target server")
                .with_default("http://localhost:3000"),
        )
        .extends(build)
        .with_sync_action(|input| {
            let url = input.option_str("url").unwrap_or_default();
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ActionError::msg(format!("unsupported url: {url}")));
            }
            print_input("publish", &input)?;
            Ok(input.pipe_result)
        }))
}

fn print_input(stage: &str, input: &CommandArgs) -> Result<(), ActionError> {
    let input = serde_json::to_value(input)?;
    let raw = serde_json::to_string(&json!({ "stage": stage, "input": input }))?;
    println!("{raw}");
    Ok(())
}

fn root() -> command_pipe_core::Result<Command> {
    let build = Arc::new(build_command()?);
    program(CliOptions {
        package: Some(package_metadata!()),
        name: Some("pipe-demo".to_string()),
        ..Default::default()
    })?
    .with_command(Arc::clone(&build))?
    .with_command(publish_command(build)?)
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = match root() {
        Ok(cli) => cli,
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(2);
        }
    };

    info!("Starting pipe-demo v{}", env!("CARGO_PKG_VERSION"));
    if let Outcome::Rejected { .. } = cli.run(std::env::args().skip(1)) {
        std::process::exit(1);
    }
}
