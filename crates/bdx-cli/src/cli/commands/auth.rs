//! Authentication command handlers.

use anyhow::{Context, Result};

use bdx_client::ApiClient;

/// Logs in, optionally registering first. A 409 from registration means the
/// account already exists and the login proceeds anyway.
pub async fn login(client: &ApiClient, email: &str, password: &str, register: bool) -> Result<()> {
    if register {
        match client.register(email, password).await {
            Ok(()) => println!("Registered {email}"),
            Err(e) if e.status() == Some(409) => {
                tracing::debug!(email, "already registered, logging in");
            }
            Err(e) => return Err(e).context("register"),
        }
    }

    client.login(email, password).await.context("login")?;
    println!("Logged in as {email}");
    Ok(())
}

pub async fn logout(client: &ApiClient) -> Result<()> {
    client.logout().await.context("logout")?;
    println!("Logged out");
    Ok(())
}

pub async fn register(client: &ApiClient, email: &str, password: &str) -> Result<()> {
    client.register(email, password).await.context("register")?;
    println!("Registered {email}");
    Ok(())
}

pub async fn inventory(client: &ApiClient) -> Result<()> {
    let inventory = client.inventory().await.context("fetch inventory")?;
    println!(
        "{}",
        serde_json::to_string_pretty(&inventory).context("render inventory")?
    );
    Ok(())
}
