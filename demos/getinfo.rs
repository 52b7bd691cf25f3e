use std::process::ExitCode;

use lnd_rest::{
    config::DEFAULT_REST_HOST,
    credentials::FileCredentials,
    models::{ChannelBalance, NodeInfo},
    Lnd,
};

/// Connect to a node and print its info and channel balance.
///
/// Usage: cargo run --example getinfo -- --tls-cert ~/.lnd/tls.cert \
///     --macaroon ~/.lnd/data/chain/bitcoin/mainnet/readonly.macaroon [--host https://127.0.0.1:8080]
#[tokio::main]
async fn main() -> ExitCode {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();

    let args: Vec<String> = std::env::args().collect();
    let host = flag_value(&args, "--host").unwrap_or_else(|| DEFAULT_REST_HOST.to_string());
    let (Some(tls_cert), Some(macaroon)) = (
        flag_value(&args, "--tls-cert"),
        flag_value(&args, "--macaroon"),
    ) else {
        eprintln!("usage: getinfo --tls-cert <path> --macaroon <path> [--host <url>]");
        return ExitCode::from(2);
    };

    // A client that fails its liveness check is useless here, so stop.
    let lnd = match Lnd::connect(host, &FileCredentials::new(tls_cert, macaroon)).await {
        Ok(lnd) => lnd,
        Err(e) => {
            eprintln!("failed to connect to lnd: {e}");
            return ExitCode::FAILURE;
        }
    };

    match run(&lnd).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(lnd: &Lnd) -> Result<(), Box<dyn std::error::Error>> {
    let info: NodeInfo = lnd.get_info().await?.parse()?;
    println!(
        "{} ({}) height={} synced={}",
        info.alias, info.identity_pubkey, info.block_height, info.synced_to_chain
    );
    let balance: ChannelBalance = lnd.balance_channel().await?.parse()?;
    println!(
        "local={} sat remote={} sat",
        balance.local_balance.sat, balance.remote_balance.sat
    );
    Ok(())
}

fn flag_value(args: &[String], flag: &str) -> Option<String> {
    args.windows(2)
        .find(|pair| pair[0] == flag)
        .map(|pair| pair[1].clone())
}
