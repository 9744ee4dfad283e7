//! Application Startup
//!
//! Application building and server initialization.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use sqlx::PgPool;
use tokio::net::TcpListener;

use crate::application::services::{ChatService, ChatServiceImpl, ConversationService, ConversationServiceImpl};
use crate::config::Settings;
use crate::infrastructure::database;
use crate::infrastructure::repositories::{
    PgChannelMessageRepository, PgChannelRepository, PgConversationRepository,
    PgMembershipRepository, PgUserRepository,
};
use crate::presentation::http::routes;
use crate::presentation::middleware::{cors, logging};
use crate::presentation::websocket::{Gateway, InMemoryRoomRegistry, RoomRegistry};
use crate::shared::snowflake::SnowflakeGenerator;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub snowflake: Arc<SnowflakeGenerator>,
    pub gateway: Arc<Gateway>,
    pub settings: Arc<Settings>,
}

/// Application instance
pub struct Application {
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application from settings
    pub async fn build(settings: Settings) -> Result<Self> {
        // Create database pool
        let db = database::create_pool(&settings.database).await?;
        tracing::info!("Database connection pool created");

        // Run pending migrations
        database::run_migrations(&db).await?;
        tracing::info!("Migrations applied");

        // Create snowflake generator
        let snowflake = Arc::new(SnowflakeGenerator::new(
            settings.snowflake.machine_id as u64,
            0u64, // Default node_id
        ));

        // Long-lived services backing the gateway. The registry sits behind
        // a trait so a future pub/sub-bus implementation can replace it
        // without touching call sites.
        let registry: Arc<dyn RoomRegistry> = Arc::new(InMemoryRoomRegistry::new());
        let chat: Arc<dyn ChatService> = Arc::new(ChatServiceImpl::new(
            Arc::new(PgChannelRepository::new(db.clone())),
            Arc::new(PgMembershipRepository::new(db.clone())),
            Arc::new(PgChannelMessageRepository::new(db.clone())),
            Arc::new(PgUserRepository::new(db.clone())),
            snowflake.clone(),
        ));
        let conversations: Arc<dyn ConversationService> = Arc::new(ConversationServiceImpl::new(
            Arc::new(PgConversationRepository::new(db.clone())),
            Arc::new(PgUserRepository::new(db.clone())),
            snowflake.clone(),
        ));

        let gateway = Arc::new(Gateway::new(
            registry,
            chat,
            conversations,
            settings.websocket.heartbeat_interval_ms,
        ));

        // Create app state
        let state = AppState {
            db,
            snowflake,
            gateway,
            settings: Arc::new(settings.clone()),
        };

        // Build router with middleware
        let router = routes::create_router(state)
            .layer(logging::create_trace_layer())
            .layer(cors::create_cors_layer(&settings.cors));

        // Bind to address
        let addr = settings.server_addr();
        let listener = TcpListener::bind(&addr).await?;
        tracing::info!("Listening on {}", addr);

        Ok(Self { listener, router })
    }

    /// Run the server until stopped
    pub async fn run_until_stopped(self) -> Result<()> {
        axum::serve(self.listener, self.router).await?;
        Ok(())
    }

    /// Get the bound address
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}
