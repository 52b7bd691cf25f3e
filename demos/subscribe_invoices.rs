use lnd_rest::{config::DEFAULT_REST_HOST, credentials::FileCredentials, Lnd};
use tracing::info;

/// Create an invoice, then print invoice updates until the node closes the stream.
///
/// Usage: cargo run --example subscribe_invoices -- <lnd-dir> [network] [host]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();

    let mut args = std::env::args().skip(1);
    let lnd_dir = args.next().ok_or("Must provide the lnd directory")?;
    let network = args.next().unwrap_or_else(|| "mainnet".to_string());
    let host = args.next().unwrap_or_else(|| DEFAULT_REST_HOST.to_string());

    let lnd = Lnd::connect(host, &FileCredentials::lnd_dir(lnd_dir, &network)).await?;

    let mut events = lnd.invoices_subscribe().await?;
    let created = lnd.create_invoice(1_000, "subscribe demo").await?;
    info!(
        payment_request = created.str("payment_request").unwrap_or_default(),
        "invoice created"
    );

    while let Some(invoice) = events.next_invoice().await? {
        println!(
            "{:>8} sat  {:?}  {}",
            invoice.value, invoice.state, invoice.memo
        );
    }
    Ok(())
}
