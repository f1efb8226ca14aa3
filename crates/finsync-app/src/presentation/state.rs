use std::sync::Arc;

use tracing::{info, warn};

use finsync_domain::session::{SessionState, TokenStore};
use finsync_domain::shared::DomainError;
use finsync_domain::storage::KeyValueStore;
use finsync_infrastructure::config::FinanceConfig;
use finsync_infrastructure::http::ApiClient;

use crate::application::cache::{QueryCache, QueryError};
use crate::application::services::{
    AnalyticsApi, CategoriesApi, DashboardApi, GoalsApi, PreferencesService, TransactionsApi,
};
use crate::application::session::{AuthGateway, SessionStore};

/// Resource services sharing one cache and one HTTP client
#[derive(Clone)]
pub struct Services {
    pub transactions: TransactionsApi,
    pub categories: CategoriesApi,
    pub goals: GoalsApi,
    pub dashboard: DashboardApi,
    pub analytics: AnalyticsApi,
    pub preferences: PreferencesService,
}

/// Collaborators a [`FinanceClient`] is assembled from
pub struct ClientParts {
    pub config: FinanceConfig,
    pub client: ApiClient,
    pub gateway: Arc<dyn AuthGateway>,
    pub kv_store: Arc<dyn KeyValueStore>,
    pub tokens: Arc<dyn TokenStore>,
}

/// Composition root handed to the UI layer. Every consumer receives the
/// session store, cache and services from here.
pub struct FinanceClient {
    pub config: FinanceConfig,
    pub session: Arc<SessionStore>,
    pub cache: QueryCache,
    pub services: Services,
}

impl FinanceClient {
    /// Open storage and wire every collaborator from `config`
    pub async fn connect(config: FinanceConfig) -> Result<Self, DomainError> {
        crate::presentation::bootstrap::build_client(config).await
    }

    pub fn from_parts(parts: ClientParts) -> Self {
        let ClientParts {
            config,
            client,
            gateway,
            kv_store,
            tokens,
        } = parts;

        // The session writes the same cell the client reads on every request
        let session = Arc::new(SessionStore::new(
            gateway,
            tokens,
            client.access_token().clone(),
        ));
        let cache = QueryCache::new();

        let transactions = TransactionsApi::new(client.clone(), cache.clone(), &config.cache);
        let services = Services {
            categories: CategoriesApi::new(client.clone(), cache.clone(), &config.cache),
            goals: GoalsApi::new(client.clone(), cache.clone(), &config.cache),
            dashboard: DashboardApi::new(
                client.clone(),
                cache.clone(),
                transactions.clone(),
                &config.cache,
            ),
            analytics: AnalyticsApi::new(client, cache.clone(), &config.cache),
            preferences: PreferencesService::new(kv_store),
            transactions,
        };

        Self {
            config,
            session,
            cache,
            services,
        }
    }

    /// Restore a persisted session. Safe to call from several places; the
    /// server is asked once per process.
    pub async fn start(&self) -> SessionState {
        self.session.validate_on_startup().await
    }

    /// Sign out and drop every cached resource so nothing from this
    /// session is served to the next one
    pub async fn logout(&self) {
        self.session.logout().await;
        self.cache.clear();
        info!("Client state cleared after logout");
    }

    /// Route a failed query through session handling. A 401 anywhere means
    /// the token is gone: the session expires and cached data is dropped.
    /// Returns whether the session was ended.
    pub async fn handle_error(&self, error: &QueryError) -> bool {
        if !error.is_unauthorized() {
            return false;
        }
        warn!("Server rejected the access token, ending session");
        self.session.expire().await;
        self.cache.clear();
        true
    }
}
