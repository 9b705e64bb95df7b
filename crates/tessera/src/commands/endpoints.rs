//! Endpoints command - resolves the provider endpoints the server would use.

use anyhow::Result;
use clap::Args;
use console::Style;
use serde::Serialize;
use tessera_oidc::{ProviderEndpoints, discovery};

use super::Context;

/// Arguments for the endpoints command.
#[derive(Args, Debug)]
pub struct EndpointsArgs {}

/// Resolved endpoints for JSON output.
#[derive(Debug, Serialize)]
struct EndpointsOutput {
    provider: String,
    discovered: bool,
    issuer: Option<String>,
    authorization_endpoint: String,
    token_endpoint: String,
    userinfo_endpoint: String,
}

/// Run the endpoints command.
pub async fn run(_args: EndpointsArgs, ctx: &Context) -> Result<()> {
    let client = reqwest::Client::builder()
        .timeout(ctx.oidc.http_timeout)
        .build()?;

    let document = discovery::load_or_default(&client, &ctx.oidc).await;
    let endpoints = ProviderEndpoints::resolve(&ctx.oidc, &document);

    let output = EndpointsOutput {
        provider: ctx.oidc.provider_url.clone(),
        discovered: endpoints.discovered,
        issuer: document.issuer,
        authorization_endpoint: endpoints.authorization,
        token_endpoint: endpoints.token,
        userinfo_endpoint: endpoints.userinfo,
    };

    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let dim = Style::new().dim();
    let source = if output.discovered {
        Style::new().green().apply_to("discovery document")
    } else {
        Style::new().yellow().apply_to("fallback paths")
    };

    println!();
    println!("  {} {}", dim.apply_to("Provider:     "), output.provider);
    println!("  {} {}", dim.apply_to("Source:       "), source);
    if let Some(issuer) = &output.issuer {
        println!("  {} {}", dim.apply_to("Issuer:       "), issuer);
    }
    println!(
        "  {} {}",
        dim.apply_to("Authorization:"),
        output.authorization_endpoint
    );
    println!("  {} {}", dim.apply_to("Token:        "), output.token_endpoint);
    println!("  {} {}", dim.apply_to("Userinfo:     "), output.userinfo_endpoint);
    println!();

    Ok(())
}
