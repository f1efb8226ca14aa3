use std::sync::Arc;
use std::time::Instant;

use tracing::info;

use finsync_domain::session::TokenStore;
use finsync_domain::shared::DomainError;
use finsync_domain::storage::KeyValueStore;
use finsync_infrastructure::config::FinanceConfig;
use finsync_infrastructure::http::{AccessToken, ApiClient};
use finsync_infrastructure::logging;
use finsync_infrastructure::persistence::{Database, SqliteKeyValueStore};
use finsync_infrastructure::security::TokenVault;

use crate::application::session::HttpAuthGateway;
use crate::presentation::state::{ClientParts, FinanceClient};

/// Start file logging under the configured data directory
pub fn init_logging(config: &FinanceConfig) -> anyhow::Result<()> {
    logging::init_logger(config.storage.log_dir())
}

pub async fn build_client(config: FinanceConfig) -> Result<FinanceClient, DomainError> {
    let startup_started_at = Instant::now();
    config.validate()?;

    let db_path = config.storage.database_path();
    info!("Database path: {}", db_path.display());

    let started_at = Instant::now();
    let database = Database::new(&db_path).await?;
    database.run_migrations().await?;
    info!(
        "✓ Storage ready ({}ms)",
        started_at.elapsed().as_millis()
    );

    let kv_store = Arc::new(SqliteKeyValueStore::new(database.pool().clone())) as Arc<dyn KeyValueStore>;

    let tokens = match (&config.storage.token_secret, config.storage.encrypt_token) {
        (Some(secret), true) => {
            let started_at = Instant::now();
            let vault = TokenVault::encrypted(kv_store.clone(), secret).await?;
            info!(
                "✓ Token encryption initialized ({}ms)",
                started_at.elapsed().as_millis()
            );
            vault
        }
        (None, true) => {
            return Err(DomainError::InvalidInput(
                "Token encryption requires a token secret".to_string(),
            ))
        }
        (_, false) => TokenVault::plain(kv_store.clone()),
    };
    let tokens = Arc::new(tokens) as Arc<dyn TokenStore>;

    let client = ApiClient::new(
        config.api_base_url.clone(),
        AccessToken::new(),
        &config.timeouts,
    )?;
    let gateway = Arc::new(HttpAuthGateway::new(client.clone()));

    let finance = FinanceClient::from_parts(ClientParts {
        config,
        client,
        gateway,
        kv_store,
        tokens,
    });

    info!(
        "✓ Client assembled ({}ms), API at {}",
        startup_started_at.elapsed().as_millis(),
        finance.config.api_base_url
    );
    Ok(finance)
}
