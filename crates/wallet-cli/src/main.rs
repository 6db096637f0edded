mod cli;

use anyhow::Context;
use clap::Parser;
use serde_json::{json, Value};
use tracing::{debug, error};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use wallet_core::{
    envelope, list_networks, ChainHandler, ChainWallet, SendRequest, TokenSendRequest,
    WalletConfig, WalletError,
};

use cli::{Cli, Command};

/// Logs go to stderr so stdout carries only the JSON result.
fn init_logging(verbose: bool) -> anyhow::Result<()> {
    let default = if verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {e}"))
}

fn load_config(cli: &Cli) -> Result<WalletConfig, WalletError> {
    match &cli.config {
        Some(path) => {
            debug!(path = %path.display(), "loading configuration");
            WalletConfig::load(path)
        }
        None => Ok(WalletConfig::with_defaults()),
    }
}

fn networks(config: &WalletConfig) -> Value {
    envelope(&Ok::<_, WalletError>(json!({
        "networks": list_networks(config),
    })))
}

async fn execute(command: Command, config: &WalletConfig) -> Value {
    let Some(network) = command.network() else {
        return networks(config);
    };
    let wallet = match ChainWallet::open(network, config) {
        Ok(wallet) => wallet,
        Err(e) => return envelope::<()>(&Err(e)),
    };

    match command {
        Command::Networks => networks(config),
        Command::Generate(_) => envelope(&wallet.generate_wallet()),
        Command::FromMnemonic { mnemonic, .. } => {
            envelope(&wallet.wallet_from_mnemonic(mnemonic.as_deref()))
        }
        Command::Import { private_key, .. } => envelope(&wallet.import_private_key(&private_key)),
        Command::Validate { address, .. } => {
            let valid = wallet.validate_address(&address);
            envelope(&Ok::<_, WalletError>(json!({
                "address": address,
                "valid": valid,
                "network": wallet.network_name(),
            })))
        }
        Command::Balance { address, .. } => envelope(&wallet.get_balance(&address).await),
        Command::Utxos { address, .. } => envelope(&wallet.unspent_outputs(&address).await),
        Command::Send(args) => {
            let request = SendRequest {
                from: args.from,
                to: args.to,
                amount: args.amount,
                private_key: args.private_key,
            };
            envelope(&wallet.send_native(&request).await)
        }
        Command::Status { tx_hash, .. } => envelope(&wallet.transaction_status(&tx_hash).await),
        Command::Faucet(_) => envelope(&Ok::<_, WalletError>(wallet.faucet_info())),
        Command::TokenBalance { address, token, .. } => {
            envelope(&wallet.token_balance(&address, &token).await)
        }
        Command::TokenSend { send, token } => {
            let request = TokenSendRequest {
                from: send.from,
                to: send.to,
                token,
                amount: send.amount,
                private_key: send.private_key,
            };
            envelope(&wallet.send_token(&request).await)
        }
        Command::TokenInfo { token, .. } => envelope(&wallet.token_info(&token).await),
        Command::GasPrice(_) => envelope(&wallet.gas_price().await),
        Command::NetworkInfo(_) => envelope(&wallet.network_info().await),
        Command::MetamaskConfig(_) => envelope(&wallet.metamask_config()),
        Command::Airdrop { address, amount, .. } => {
            envelope(&wallet.request_airdrop(&address, &amount).await)
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    let output = match load_config(&cli) {
        Ok(config) => execute(cli.command, &config).await,
        Err(e) => envelope::<()>(&Err(e)),
    };

    let succeeded = output["success"].as_bool().unwrap_or(false);
    if !succeeded {
        error!("{}", output["error"].as_str().unwrap_or("command failed"));
    }
    println!(
        "{}",
        serde_json::to_string_pretty(&output).context("failed to render result")?
    );

    if !succeeded {
        std::process::exit(1);
    }
    Ok(())
}
