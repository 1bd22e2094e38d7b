//! multisigctl binary

#[tokio::main]
async fn main() -> multisig_cli::CliResult<()> {
    multisig_cli::run().await
}
