//! SamSoftware HR console client.

#![forbid(unsafe_code)]

mod command;
mod console_config;
mod shell;

use std::env;
use std::sync::Arc;

use samsoft_application::{AuthContext, LoadingIndicator};
use samsoft_core::AppError;
use samsoft_infrastructure::{
    HttpApiClient, HttpAuthApi, HttpResourceApi, JsonFileCredentialStore,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::command::{Command, USAGE};
use crate::console_config::ConsoleConfig;
use crate::shell::Shell;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let args: Vec<String> = env::args().skip(1).collect();
    let command = Command::parse(&args)?;
    if command == Command::Help {
        println!("{USAGE}");
        return Ok(());
    }

    let config = ConsoleConfig::load()?;
    let store = Arc::new(JsonFileCredentialStore::new(config.credentials_path.clone()));
    let auth = AuthContext::new(store);
    let client = Arc::new(HttpApiClient::new(
        config.api_base_url.clone(),
        config.request_timeout,
        auth.clone(),
        LoadingIndicator::new(),
    )?);
    let auth_api = Arc::new(HttpAuthApi::new(Arc::clone(&client)));
    let resources = Arc::new(HttpResourceApi::new(client));

    if let Err(error) = auth.hydrate(auth_api.as_ref()).await {
        warn!(error = %error, "failed to restore persisted session");
    }

    info!(
        api_base_url = %config.api_base_url,
        credentials_path = %config.credentials_path.display(),
        authenticated = auth.is_authenticated(),
        "console started"
    );

    let shell = Shell::new(auth, auth_api, resources, config.upload_policy);
    for line in shell.run(command).await {
        println!("{line}");
    }

    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
