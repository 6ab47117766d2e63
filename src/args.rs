/// Serve the Flappy Bird web game from a local directory
#[derive(Clone, Debug, clap::Parser)]
#[command(version, about)]
pub(crate) struct Args {
    /// Port to serve from
    #[arg(
        short = 'P',
        long,
        value_name = "NUM",
        default_value_t = file_host::DEFAULT_PORT
    )]
    pub(crate) port: u16,

    /// Directory to serve [default: the directory holding this executable]
    #[arg(long, value_name = "DIR")]
    pub(crate) root: Option<std::path::PathBuf>,

    /// Don't open a browser
    #[arg(long)]
    pub(crate) no_open: bool,

    #[command(flatten)]
    pub(crate) verbose: clap_verbosity_flag::Verbosity,
}
