use clap::Args;

#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Directory to scan for annotated scripts.
    pub directory: String,
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub recursive: bool,
    /// Exclude scanned paths by glob pattern, relative to the directory.
    #[arg(long = "exclude", value_name = "GLOB")]
    pub exclude: Vec<String>,
    /// Include hidden files and directories.
    #[arg(long, default_value_t = false)]
    pub include_hidden: bool,
}

#[derive(Debug, Args)]
pub struct QueryArgs {
    #[arg(allow_hyphen_values = true)]
    pub query: String,
    /// Skip the semantic provider stage even when one is configured.
    #[arg(long, default_value_t = false)]
    pub no_ai: bool,
    /// Keep at most this many ranked hits.
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(Debug, Args)]
pub struct NameArg {
    pub name: String,
}
