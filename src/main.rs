use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

/// plugin-resolver - Plugin Version Resolver
///
/// Find installed plugin artifacts in a plugin repository laid out as
/// <root>/<plugin-id>/<classifier>/<version>/.
///
/// Constraints: "1.2.3" (exact), "[1.0,2.0)" (range), "*" (any), "latest".
///
/// Examples:
///   plugin-resolver resolve foo 1.2.0        # Print the directory of foo 1.2.0
///   plugin-resolver check plugins.json       # Resolve every plugin in a manifest
#[derive(Parser, Debug)]
#[command(author, version = env!("PLUGIN_RESOLVER_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Plugin repository root (overrides defaults; also via PLUGIN_RESOLVER_ROOT)
    #[arg(
        long = "root",
        short = 'r',
        env = "PLUGIN_RESOLVER_ROOT",
        value_name = "PATH",
        global = true
    )]
    pub root: Option<PathBuf>,

    /// Classifier used when a request names none (defaults to "plugin")
    #[arg(long = "classifier", short = 'c', value_name = "NAME", global = true)]
    pub classifier: Option<String>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// List installed plugins
    List(ListArgs),

    /// Resolve a plugin version constraint to an installed artifact
    Resolve(ResolveArgs),

    /// Resolve every plugin listed in a manifest file
    Check(CheckArgs),
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Only list this plugin id
    #[arg(value_name = "PLUGIN_ID")]
    pub plugin_id: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct ResolveArgs {
    #[arg(value_name = "PLUGIN_ID")]
    pub plugin_id: String,

    /// Version constraint, e.g. "1.2.3", "[1.0,2.0)", "latest"
    #[arg(value_name = "CONSTRAINT")]
    pub constraint: String,

    /// Fail instead of picking the newest version when several match
    #[arg(long)]
    pub strict: bool,
}

#[derive(clap::Args, Debug)]
pub struct CheckArgs {
    /// Path to the plugin manifest (JSON)
    #[arg(value_name = "MANIFEST")]
    pub manifest: PathBuf,

    /// Fail instead of picking the newest version when several match
    #[arg(long)]
    pub strict: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let runtime = plugin_resolver::runtime::RealRuntime;

    match cli.command {
        Commands::List(args) => plugin_resolver::commands::list(
            runtime,
            cli.root,
            cli.classifier,
            args.plugin_id.as_deref(),
        )?,
        Commands::Resolve(args) => plugin_resolver::commands::resolve(
            runtime,
            cli.root,
            cli.classifier,
            &args.plugin_id,
            &args.constraint,
            args.strict,
        )?,
        Commands::Check(args) => plugin_resolver::commands::check(
            runtime,
            cli.root,
            cli.classifier,
            &args.manifest,
            args.strict,
        )?,
    }
    Ok(())
}
