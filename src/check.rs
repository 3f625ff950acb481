use futures::StreamExt;
use std::io::Write;
use tracing::{error, info, warn};

use crate::error::{Error, Result};
use crate::generator::ModelClient;
use crate::ollama::{OllamaClient, check_server_availability, get_available_models, server_url};

/// Connection test against one Ollama server.
///
/// Checks it, prints the installed models and, when `model` is given,
/// streams the answer to a short prompt to stdout.
pub async fn run_check(ip: Option<&str>, model: Option<&str>, prompt: &str) -> Result<()> {
    let base_url = server_url(ip);
    let client = reqwest::Client::new();
    info!(%base_url, "checking Ollama server");

    if !check_server_availability(&client, &base_url).await {
        error!(%base_url, "server is not reachable; check that it is running and the address is correct");
        return Err(Error::Connection(base_url));
    }
    info!("server is available");

    let models = get_available_models(&client, &base_url).await;
    if models.is_empty() {
        warn!("no installed models found");
    } else {
        println!("Available models:");
        for m in &models {
            println!("- {}", m);
        }
    }

    let Some(model) = model else {
        return Ok(());
    };
    if !models.iter().any(|m| m == model) {
        return Err(Error::ModelUnavailable(model.to_string()));
    }

    info!(%model, "sending test prompt");
    let ollama = OllamaClient::new(client, base_url);
    let mut fragments = ollama.fragments(model, prompt);
    let mut stdout = std::io::stdout();

    println!("\n=== Response ===");
    while let Some(fragment) = fragments.next().await {
        print!("{}", fragment?);
        stdout.flush()?;
    }
    println!("\n=== End of response ===");
    Ok(())
}
