//! Attestor daemon — entry point for serving or running one-shot attestations.

mod app;
mod cli;
mod shutdown;

use attestor_codec::encode_contract_proof;
use attestor_engine::{presets, AttestationFailure, Web2JsonSource};
use attestor_types::{AttestationId, DecodedProof};
use attestor_utils::{init_logging, LogFormat};
use clap::Parser;
use tokio_util::sync::CancellationToken;

use crate::app::App;
use crate::cli::{Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.resolve_config()?;

    let format: LogFormat = config.log_format.parse().map_err(anyhow::Error::msg)?;
    init_logging(format, &config.log_level);

    if let Command::ShowConfig = cli.command {
        print!("{}", config.to_toml_string()?);
        return Ok(());
    }

    let shutdown = CancellationToken::new();
    tokio::spawn(shutdown::cancel_on_signal(shutdown.clone()));

    let app = App::build(config, shutdown.clone())?;
    let sweepers = app.spawn_sweepers();

    let outcome = match cli.command {
        Command::Serve => {
            let server = app.spawn_server()?;
            tracing::info!(listen = %app.config.listen_addr, "attestor running");
            shutdown.cancelled().await;
            let _ = server.await;
            Ok(())
        }
        Command::Attest {
            url,
            method,
            jq,
            abi,
        } => {
            let source = Web2JsonSource {
                url,
                http_method: method,
                post_process_jq: jq,
                abi_signature: abi,
            };
            let result = app.attestor.attest(&source, &shutdown).await;
            report(result)
        }
        Command::AttestPr {
            owner,
            repo,
            number,
        } => {
            // The verifier reads the pre-fetched copy from our /cache endpoint.
            let server = app.spawn_server()?;
            let definition = presets::pull_request(&owner, &repo, number)?;
            let result = app.attestor.attest_proxied(&definition, &shutdown).await;
            shutdown.cancel();
            let _ = server.await;
            report(result)
        }
        Command::ShowConfig => Ok(()),
    };

    shutdown.cancel();
    for handle in sweepers {
        let _ = handle.await;
    }
    outcome
}

/// Print the proof and the calldata-ready payload as JSON on stdout.
fn report(
    result: Result<(AttestationId, DecodedProof), AttestationFailure>,
) -> anyhow::Result<()> {
    let (id, proof) = result?;
    let payload = encode_contract_proof(&proof);
    let output = serde_json::json!({
        "id": id,
        "votingRound": proof.data.voting_round,
        "proof": proof,
        "contractPayload": format!("0x{}", hex::encode(payload)),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
