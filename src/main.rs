use buildscript::cli::{
    self, CheckOptions, CheckResult, CliError, EditOptions, MergeOptions, MergeOutcome,
};
use buildscript::{Operation, parse_script};
use clap::{Parser as ClapParser, Subcommand};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(ClapParser)]
#[command(name = "buildscript")]
#[command(about = "Parse, convert and merge build scripts and build expressions")]
#[command(version)]
struct Cli {
    /// Log filter (e.g. `debug`, `buildscript=trace`)
    #[arg(long, global = true, env = "BUILDSCRIPT_LOG", default_value = "warn")]
    log: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a build script
    Check {
        /// Build script file
        file: PathBuf,

        /// Only validate syntax, don't transform
        #[arg(long)]
        syntax_only: bool,
    },

    /// Convert a build script to build expression JSON
    ToJson {
        /// Build script file
        file: PathBuf,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,
    },

    /// Convert build expression JSON to a build script
    FromJson {
        /// JSON file (reads from stdin if not provided)
        file: Option<PathBuf>,
    },

    /// List the requirements of the active solve
    Requirements {
        /// Build script file
        file: PathBuf,
    },

    /// Add a requirement (`namespace/name[@constraints]`)
    Add {
        file: PathBuf,
        requirement: String,

        /// Write the result back to the file
        #[arg(short, long)]
        write: bool,
    },

    /// Remove a requirement
    Remove {
        file: PathBuf,
        requirement: String,

        /// Write the result back to the file
        #[arg(short, long)]
        write: bool,
    },

    /// Replace the version constraints of a requirement
    Update {
        file: PathBuf,
        requirement: String,

        /// Write the result back to the file
        #[arg(short, long)]
        write: bool,
    },

    /// Merge a local build expression into a remote one
    Merge {
        /// Local build expression JSON
        local: PathBuf,

        /// Remote build expression JSON
        remote: PathBuf,

        /// Merge strategies JSON
        #[arg(short, long)]
        strategies: PathBuf,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,
    },

    /// Show two build scripts with conflict markers around their differences
    Diff {
        local: PathBuf,
        remote: PathBuf,
    },
}

fn init_logging(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .without_time()
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli.log);

    let result = match cli.command {
        Commands::Check { file, syntax_only } => run_check(&file, syntax_only),
        Commands::ToJson { file, pretty } => cli::read_file(&file)
            .and_then(|source| cli::script_to_json(&source, pretty))
            .map(|json| println!("{}", json)),
        Commands::FromJson { file } => run_from_json(file.as_deref()),
        Commands::Requirements { file } => run_requirements(&file),
        Commands::Add {
            file,
            requirement,
            write,
        } => run_edit(&file, Operation::Add, requirement, write),
        Commands::Remove {
            file,
            requirement,
            write,
        } => run_edit(&file, Operation::Remove, requirement, write),
        Commands::Update {
            file,
            requirement,
            write,
        } => run_edit(&file, Operation::Update, requirement, write),
        Commands::Merge {
            local,
            remote,
            strategies,
            pretty,
        } => run_merge(&local, &remote, &strategies, pretty),
        Commands::Diff { local, remote } => run_diff(&local, &remote),
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn run_check(file: &Path, syntax_only: bool) -> Result<(), CliError> {
    let options = CheckOptions {
        source: cli::read_file(file)?,
        syntax_only,
    };

    match cli::execute_check(&options)? {
        CheckResult::SyntaxValid => println!("Syntax is valid"),
        CheckResult::Success(_) => println!("Build script is valid"),
    }
    Ok(())
}

fn run_from_json(file: Option<&Path>) -> Result<(), CliError> {
    let input = match file {
        Some(path) => cli::read_file(path)?,
        None if !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
        None => return Err(CliError::NoInput),
    };
    print!("{}", cli::json_to_script(&input)?);
    Ok(())
}

fn run_requirements(file: &Path) -> Result<(), CliError> {
    let script = parse_script(&cli::read_file(file)?)?;
    for requirement in script.requirements()? {
        println!("{}", requirement);
    }
    Ok(())
}

fn run_edit(
    file: &Path,
    operation: Operation,
    requirement: String,
    write: bool,
) -> Result<(), CliError> {
    let options = EditOptions {
        source: cli::read_file(file)?,
        operation,
        requirement,
    };
    let text = cli::execute_edit(&options)?;
    if write {
        std::fs::write(file, text)?;
    } else {
        print!("{}", text);
    }
    Ok(())
}

fn run_merge(
    local: &Path,
    remote: &Path,
    strategies: &Path,
    pretty: bool,
) -> Result<(), CliError> {
    let options = MergeOptions {
        local: cli::read_file(local)?,
        remote: cli::read_file(remote)?,
        strategies: cli::read_file(strategies)?,
    };

    match cli::execute_merge(&options)? {
        MergeOutcome::Merged(expression) => {
            let json = if pretty {
                expression.to_json_pretty()?
            } else {
                expression.to_json_string()?
            };
            println!("{}", json);
            Ok(())
        }
        MergeOutcome::Conflicted { reason, diff } => {
            print!("{}", diff);
            Err(buildscript::Error::from(reason).into())
        }
    }
}

fn run_diff(local: &Path, remote: &Path) -> Result<(), CliError> {
    let local = parse_script(&cli::read_file(local)?)?;
    let remote = parse_script(&cli::read_file(remote)?)?;
    print!("{}", buildscript::diff(&local, &remote));
    Ok(())
}
