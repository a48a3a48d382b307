use clap::{CommandFactory, Parser};
use clap_complete::{generate, Shell as CompletionShell};
use colored::Colorize;
use graphreap::{Config, ExtraRootPolicy, Output, Reporter, Shell};
use miette::{IntoDiagnostic, Result};
use std::io::{BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// graphreap - Delete what a rebound variable alone kept alive
#[derive(Parser, Debug)]
#[command(name = "graphreap")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Scripts to run in order; reads from stdin when none are given
    scripts: Vec<PathBuf>,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Kinds never collected (can be specified multiple times)
    #[arg(long, value_name = "KIND")]
    ignore_kind: Vec<String>,

    /// Entity id whose references never count as outside support
    /// (can be specified multiple times)
    #[arg(long, value_name = "ID")]
    extra_root: Vec<u64>,

    /// Never collect the extra roots themselves
    #[arg(long)]
    protect_extra_roots: bool,

    /// Start with live editing disabled
    #[arg(long)]
    no_live: bool,

    /// Write the active document to this file when done
    #[arg(long, value_name = "FILE")]
    export: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode - only rebind summaries and errors
    #[arg(short, long)]
    quiet: bool,

    /// Generate shell completions
    #[arg(long, value_name = "SHELL")]
    completions: Option<CompletionShell>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Handle shell completions
    if let Some(shell) = cli.completions {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        generate(shell, &mut cmd, name, &mut std::io::stdout());
        return Ok(());
    }

    init_logging(cli.verbose, cli.quiet);

    info!("graphreap v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(&cli)?;
    let reporter = Reporter::new().with_quiet(cli.quiet);

    let mut shell = Shell::new(config);
    if cli.scripts.is_empty() {
        run_interactive(&mut shell, &reporter)?;
    } else {
        for script in &cli.scripts {
            shell = run_script_file(shell, script, &reporter)?;
        }
    }

    if let Some(path) = &cli.export {
        let bytes = shell.session().export(path)?;
        reporter.info(&format!("Exported {} bytes to {}", bytes, path.display()));
    }

    Ok(())
}

fn init_logging(verbose: bool, quiet: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = if let Some(config_path) = &cli.config {
        Config::from_file(config_path)?
    } else {
        // Try to load from default locations
        let cwd = std::env::current_dir().into_diagnostic()?;
        Config::from_default_locations(&cwd)?
    };

    // Override with CLI arguments
    if !cli.ignore_kind.is_empty() {
        config.ignored_kinds.extend(cli.ignore_kind.iter().cloned());
    }
    if !cli.extra_root.is_empty() {
        config.extra_roots.extend(cli.extra_root.iter().copied());
    }
    if cli.protect_extra_roots {
        config.extra_root_policy = ExtraRootPolicy::Protected;
    }
    if cli.no_live {
        config.live_editing = false;
    }

    Ok(config)
}

/// Run one script, resolving its relative paths against the script's directory
fn run_script_file(shell: Shell, path: &Path, reporter: &Reporter) -> Result<Shell> {
    let source = std::fs::read_to_string(path)
        .into_diagnostic()
        .map_err(|e| e.wrap_err(format!("cannot read script {}", path.display())))?;
    let base_dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    info!("Running {}", path.display());
    let mut shell = shell.with_base_dir(base_dir);
    for (index, line) in source.lines().enumerate() {
        let outputs = shell.run_line(index + 1, line)?;
        print_outputs(reporter, &outputs);
    }
    Ok(shell)
}

/// Read lines from stdin; a failing line is reported and the session goes on
fn run_interactive(shell: &mut Shell, reporter: &Reporter) -> Result<()> {
    let stdin = std::io::stdin();
    let prompt = stdin.is_terminal();
    let mut line_no = 0;

    loop {
        if prompt {
            print!("{} ", ">>>".dimmed());
            std::io::stdout().flush().into_diagnostic()?;
        }

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).into_diagnostic()? == 0 {
            break;
        }
        line_no += 1;

        match shell.run_line(line_no, &line) {
            Ok(outputs) => print_outputs(reporter, &outputs),
            Err(e) => reporter.error(&e.to_string()),
        }
    }

    Ok(())
}

fn print_outputs(reporter: &Reporter, outputs: &[Output]) {
    for output in outputs {
        match output {
            Output::Rebind(report) => reporter.rebind(report),
            Output::Info(message) => reporter.info(message),
        }
    }
}
