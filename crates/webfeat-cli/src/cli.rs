use clap::{ArgAction, Parser, Subcommand, ValueHint};

#[derive(Parser)]
#[command(
    author,
    version,
    about,
    help_template = "{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}",
    arg_required_else_help = true
)]
pub struct Args {
    /// Set output verbosity
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress outputs
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output as json
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Disable colors in output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Provide custom config file
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<String>,

    /// Set proxy
    #[arg(required = false, long, short = 'P', global = true)]
    pub proxy: Option<String>,

    /// Set user agent
    #[arg(required = false, long, short = 'A', global = true)]
    pub user_agent: Option<String>,

    /// Overall deadline, e.g. 90s or 5m ("none" disables it)
    #[arg(required = false, long, global = true)]
    pub timeout: Option<String>,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download and parse the manifest from the latest release
    #[clap(name = "fetch", visible_alias = "f")]
    Fetch {
        /// Write the normalized manifest JSON to this file
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        output: Option<String>,

        /// Repository to read releases from, as owner/name
        #[arg(short, long)]
        repository: Option<String>,

        /// Release asset holding the manifest
        #[arg(short, long)]
        asset: Option<String>,

        #[command(flatten)]
        report: ReportArgs,
    },

    /// Parse a manifest file on disk
    #[command(arg_required_else_help = true)]
    #[clap(name = "parse", visible_alias = "p")]
    Parse {
        /// Manifest file, plain or gzip-compressed
        #[arg(required = true, value_hint = ValueHint::FilePath)]
        file: String,

        /// Treat the file as gzip even without the gzip magic bytes
        #[arg(long)]
        gzip: bool,

        #[command(flatten)]
        report: ReportArgs,
    },

    /// Print the effective configuration
    Config,
}

#[derive(clap::Args)]
pub struct ReportArgs {
    /// Print the tests of this feature
    #[arg(short, long)]
    pub feature: Option<String>,

    /// Print the features covering this test path
    #[arg(short, long)]
    pub test: Option<String>,
}
