//! Command handlers

use crate::commands::{AddArgs, CheckArgs, Cli, Commands, ResolveArgs};
use crate::error::CliResult;
use registro::{
    ArtifactContent, ArtifactRequest, ContextConfig, FileContentWithExtension, RegistroContext,
    TestTracker,
};
use std::fs::File;
use std::io::{self, Write};
use tracing::info;

/// Artifacts directory template used when no config file is given.
///
/// Separate invocations must agree on the directory, so it carries no
/// timestamp or test name.
pub const CLI_ARTIFACTS_PATH_TEMPLATE: &str = "{artifacts-root}";

/// Effective context configuration: file, then command-line overrides
pub fn effective_config(cli: &Cli) -> CliResult<ContextConfig> {
    let mut config = match &cli.config {
        Some(path) => ContextConfig::from_yaml_file(path)?,
        None => ContextConfig::new().with_artifacts_path_template(CLI_ARTIFACTS_PATH_TEMPLATE),
    };
    if let Some(root) = &cli.artifacts_root {
        config = config.with_artifacts_root(root);
    }
    if let Some(template) = &cli.artifacts_path {
        config = config.with_artifacts_path_template(template);
    }
    for (key, value) in &cli.vars {
        config = config.with_variable(key, value);
    }
    Ok(config)
}

/// Build the context described by the global options
pub fn build_context(cli: &Cli) -> CliResult<RegistroContext> {
    let tracker = TestTracker::new();
    if let Some(name) = &cli.test_name {
        tracker.start(name, cli.test_suite.as_deref());
    }

    Ok(RegistroContext::builder()
        .with_config(effective_config(cli)?)
        .with_tracker(tracker)
        .build()?)
}

/// Run the parsed command, writing normal output to `out`
pub fn run(cli: &Cli, out: &mut impl Write) -> CliResult<()> {
    match &cli.command {
        Commands::Resolve(args) => run_resolve(cli, args, out),
        Commands::Add(args) => run_add(cli, args, out),
        Commands::Check(args) => run_check(cli, args, out),
        Commands::Config => {
            let yaml = effective_config(cli)?.to_yaml()?;
            write!(out, "{yaml}")?;
            Ok(())
        }
    }
}

fn run_resolve(cli: &Cli, args: &ResolveArgs, out: &mut impl Write) -> CliResult<()> {
    let context = build_context(cli)?;
    let resolved = context.fill_template_string(&args.template)?;
    writeln!(out, "{resolved}")?;
    Ok(())
}

fn run_add(cli: &Cli, args: &AddArgs, out: &mut impl Write) -> CliResult<()> {
    let mut context = build_context(cli)?;
    let relative_file_path = context.fill_template_string(&args.path)?;

    let content = match (&args.text, &args.from) {
        (Some(text), _) => ArtifactContent::text(text.as_str()),
        (None, Some(path)) => ArtifactContent::stream(File::open(path)?),
        (None, None) => ArtifactContent::stream(io::stdin()),
    };

    let mut request = ArtifactRequest::new().path(relative_file_path);
    request = match &args.extension {
        Some(extension) => request.file_content(FileContentWithExtension::new(content, extension)),
        None => request.content(content),
    };
    if let Some(artifact_type) = &args.artifact_type {
        request = request.artifact_type(artifact_type);
    }
    if let Some(title) = &args.title {
        request = request.title(title);
    }

    let event = context.add(request)?;
    info!(path = %event.absolute_file_path.display(), "Artifact added");

    if args.json {
        writeln!(out, "{}", serde_json::to_string_pretty(&event)?)?;
    } else {
        writeln!(out, "{}", event.absolute_file_path.display())?;
    }
    Ok(())
}

fn run_check(cli: &Cli, args: &CheckArgs, out: &mut impl Write) -> CliResult<()> {
    let context = build_context(cli)?;
    let store = context.store();

    let provider_name = if args.dir {
        let subject = store.locate_directory(&args.path)?;
        let _ = subject.should().exist()?;
        subject.provider_name().to_string()
    } else {
        let subject = store.locate_file(&args.path)?;
        let _ = subject.should().exist()?;
        subject.provider_name().to_string()
    };
    writeln!(out, "{provider_name} exists")?;
    Ok(())
}
