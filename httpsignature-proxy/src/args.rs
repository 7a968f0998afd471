use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Clone, Copy, PartialEq, ValueEnum)]
pub enum SignatureScheme {
    Rfc9421,
    Cavage,
}

#[derive(Args)]
pub struct StartArgs {
    /// Path to the configuration file
    #[arg(env = "HTTPSIGNATURE_PROXY_CONFIG", long, short)]
    pub config: PathBuf,

    /// Port to listen on. Overrides the configuration file
    #[arg(long, short)]
    pub port: Option<u16>,

    /// Log at debug level unless `RUST_LOG` is set
    #[arg(long, short)]
    pub verbose: bool,
}

#[derive(Args)]
pub struct ParseHeaderArgs {
    /// The header to parse (`Signature-Input` for RFC 9421, `Signature` or `Authorization` for Cavage)
    pub header: String,

    /// The scheme this header uses
    #[arg(
        default_value_t = SignatureScheme::Rfc9421,
        long,
        short,
        value_enum,
    )]
    pub scheme: SignatureScheme,

    /// Accompanying `Signature` header (RFC 9421 only)
    #[arg(long)]
    pub signature: Option<String>,
}

#[derive(Subcommand)]
pub enum ProxySubcommand {
    /// Start the proxy
    Start(StartArgs),

    /// Print the version and exit
    Version,

    /// Parse an HTTP Signature header and report any format errors
    ParseHeader(ParseHeaderArgs),
}

/// Localhost HTTP Signatures proxy
#[derive(Parser)]
#[command(about, author, version = crate::VERSION)]
pub struct ProxyArgs {
    #[clap(subcommand)]
    pub subcommand: ProxySubcommand,
}
