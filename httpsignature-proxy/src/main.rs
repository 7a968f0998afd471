use self::args::{ProxyArgs, ProxySubcommand, StartArgs};
use clap::Parser;
use color_eyre::eyre::{self, Context};
use const_format::concatcp;
use sigproxy_config::Configuration;
use sigproxy_keystore::KeyStore;
use sigproxy_proxy::{signal, Listener, Proxy};
use std::{process::ExitCode, sync::Arc};
use tracing::info;

mod args;
mod parse_header;
mod util;

pub const VERSION: &str = concatcp!(env!("CARGO_PKG_VERSION"), "-", env!("VERGEN_GIT_SHA"));

async fn start(args: StartArgs) -> eyre::Result<()> {
    sigproxy_observability::initialise(args.verbose)?;

    let mut config = Configuration::load(&args.config)
        .await
        .wrap_err_with(|| format!("Failed to load configuration from {}", args.config.display()))?;
    if let Some(port) = args.port {
        config.server.port = port;
    }

    let keys = KeyStore::from_config(&config.keys)
        .await
        .wrap_err("Failed to load keys")?;
    for entry in keys.entries() {
        println!(
            "Initialised {:?} key \"{}\" ({})",
            entry.role(),
            entry.identifier,
            entry.algorithm
        );
    }

    let proxy = Proxy::new(&config, Arc::new(keys)).wrap_err("Failed to set up the proxy")?;
    let listener = Listener::bind(&config.server)
        .await
        .wrap_err_with(|| format!("Failed to bind to port {}", config.server.port))?;

    info!(
        address = %listener.local_addr()?,
        mode = ?proxy.mode(),
        upstream = %config.proxy.upstream,
        "proxy started",
    );

    listener.run(Arc::new(proxy), signal::shutdown()).await;

    Ok(())
}

fn main() -> eyre::Result<ExitCode> {
    color_eyre::install()?;
    let args = ProxyArgs::parse();

    match args.subcommand {
        ProxySubcommand::Start(args) => {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;

            runtime.block_on(start(args))?;
        }
        ProxySubcommand::Version => {
            println!("{} {VERSION}", env!("CARGO_PKG_NAME"));
        }
        ProxySubcommand::ParseHeader(args) => {
            if let Err(report) = parse_header::do_it(args) {
                eprintln!("{report:?}");
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
