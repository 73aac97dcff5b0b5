use clap::{Args, Subcommand, ValueEnum};
use std::path::PathBuf;

pub mod patch;
pub mod session;

/// Inputs shared by every command that runs the patcher
#[derive(Args, Debug, Clone)]
pub struct SessionArgs {
    /// Store JSON file (languages, current language, terms)
    #[arg(short, long)]
    pub store: PathBuf,

    /// Patch directory, one subdirectory per contributor
    #[arg(short, long)]
    pub patches: PathBuf,

    /// Config file (defaults to the platform config directory)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Write the patched store here instead of over the input
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Which patches `list` shows
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ListFilter {
    #[default]
    All,
    Applied,
    Inactive,
}

/// Activation of an exported patch
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ActivationArg {
    #[default]
    OnInit,
    OnFlag,
    Manual,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compile every startup patch into the store
    Compile {
        #[command(flatten)]
        session: SessionArgs,
    },

    /// Compile, then apply named patches regardless of their activation
    Apply {
        #[command(flatten)]
        session: SessionArgs,

        /// Patch name(s) to apply
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Compile, then raise flags and apply the patches waiting on them
    Flag {
        #[command(flatten)]
        session: SessionArgs,

        /// Flag id(s) that are now set
        #[arg(required = true)]
        flags: Vec<String>,
    },

    /// Compile, then list the registered patches
    List {
        #[command(flatten)]
        session: SessionArgs,

        /// Which patches to show
        #[arg(value_enum, default_value_t = ListFilter::All)]
        filter: ListFilter,
    },

    /// Parse a text or JSON patch and report problems
    Check {
        /// Patch file (`.json` for the structured form, anything else is text)
        file: PathBuf,
    },

    /// Convert a text patch into the structured JSON form
    Export {
        /// Text patch file
        file: PathBuf,

        /// Patch name (defaults to the file stem)
        #[arg(short, long)]
        name: Option<String>,

        /// Language name
        #[arg(short, long)]
        language: String,

        /// Language code
        #[arg(long)]
        code: String,

        /// When the patch applies
        #[arg(short, long, value_enum, default_value_t = ActivationArg::OnInit)]
        activation: ActivationArg,

        /// Flag id for `on-flag` patches
        #[arg(short, long)]
        flag: Option<String>,

        /// Order within the contributor (higher folds first)
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        order: i32,

        /// Output JSON file (defaults to the input with a `.json` extension)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

impl Commands {
    /// Execute the selected command.
    ///
    /// # Errors
    /// Returns an error if the underlying command fails.
    pub fn execute(&self, quiet: bool) -> anyhow::Result<()> {
        match self {
            Commands::Compile { session: args } => session::compile(args, quiet),
            Commands::Apply {
                session: args,
                names,
            } => session::apply(args, names, quiet),
            Commands::Flag {
                session: args,
                flags,
            } => session::flag(args, flags, quiet),
            Commands::List {
                session: args,
                filter,
            } => session::list(args, *filter, quiet),
            Commands::Check { file } => patch::check(file),
            Commands::Export {
                file,
                name,
                language,
                code,
                activation,
                flag,
                order,
                output,
            } => patch::export(
                file,
                name.as_deref(),
                language,
                code,
                *activation,
                flag.as_deref(),
                *order,
                output.as_deref(),
            ),
        }
    }
}
