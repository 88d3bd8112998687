//! CLI authentication: email/password login and the saved session

use anyhow::{anyhow, bail, Result};
use shared::{AuthResponse, LoginRequest, RegisterRequest};
use std::io::{self, BufRead, Write};

use crate::api::ApiClient;
use crate::config::Config;

/// Read one line from stdin after printing `label`
fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Passwords are never read from an interactive prompt, which would echo them
fn require_password(password: Option<String>) -> Result<String> {
    match password {
        Some(p) if !p.is_empty() => Ok(p),
        _ => Err(anyhow!(
            "Password required: pass --password or set SATHI_PASSWORD"
        )),
    }
}

fn value_or_prompt(value: Option<String>, label: &str) -> Result<String> {
    let value = match value {
        Some(v) => v,
        None => prompt(label)?,
    };
    if value.trim().is_empty() {
        bail!("{} cannot be empty", label.trim_end_matches([':', ' ']));
    }
    Ok(value)
}

pub async fn register(
    config: &mut Config,
    server_url: &str,
    email: Option<String>,
    password: Option<String>,
    full_name: Option<String>,
) -> Result<()> {
    let email = value_or_prompt(email, "Email: ")?;
    let password = require_password(password)?;

    let client = ApiClient::new(server_url, None);
    let auth = client
        .register(&RegisterRequest {
            email: email.clone(),
            password,
            full_name,
        })
        .await?;

    println!("\x1b[1;32m✅ Account created\x1b[0m");
    save_session(config, server_url, &email, auth)
}

pub async fn login(
    config: &mut Config,
    server_url: &str,
    email: Option<String>,
    password: Option<String>,
) -> Result<()> {
    let email = value_or_prompt(email, "Email: ")?;
    let password = require_password(password)?;

    let client = ApiClient::new(server_url, None);
    let auth = client
        .login(&LoginRequest {
            email: email.clone(),
            password,
        })
        .await?;

    println!("\x1b[1;32m✅ Login successful!\x1b[0m");
    save_session(config, server_url, &email, auth)
}

fn save_session(config: &mut Config, server_url: &str, email: &str, auth: AuthResponse) -> Result<()> {
    println!("\x1b[90mUser ID: {} ({})\x1b[0m", auth.user_id, auth.role.as_str());
    config.remote.server = Some(server_url.to_string());
    config.remote.token = Some(auth.token);
    config.remote.user_id = Some(auth.user_id);
    config.remote.email = Some(email.trim().to_lowercase());
    config.remote.role = Some(auth.role);
    config.save()
}

/// Logout by clearing the stored session
pub fn logout(config: &mut Config) -> Result<()> {
    config.remote.clear_session();
    config.save()?;
    println!("\x1b[32m✅ Logged out successfully\x1b[0m");
    Ok(())
}

/// Show current login status
pub fn whoami(config: &Config, server_url: &str) {
    match (&config.remote.token, &config.remote.user_id) {
        (Some(_), Some(user_id)) => {
            println!("\x1b[32m✓ Logged in\x1b[0m");
            println!("Server: {}", server_url);
            println!("User ID: {}", user_id);
            if let Some(email) = &config.remote.email {
                println!("Email: {}", email);
            }
            if let Some(role) = config.remote.role {
                println!("Role: {}", role.as_str());
            }
        }
        _ => {
            println!("\x1b[33m✗ Not logged in\x1b[0m");
            println!("Run '\x1b[1msathi login\x1b[0m' to authenticate");
        }
    }
}
