//! Main application structure and lifecycle management

use crate::{api::ApiServer, scheduler::Scheduler};
use anyhow::{Context, Result};
use config::Config;
use engine::{BookingEngine, Database, SqliteStores};
use gateway::{EvidenceUploader, PaymentGateway, RestEvidenceUploader, RestPaymentGateway};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// Main application state
pub struct AppState {
    pub config: Config,
    pub database: Database,
    pub engine: BookingEngine,
    pub uploader: Arc<dyn EvidenceUploader>,
    pub killswitch: Arc<RwLock<bool>>,
}

impl AppState {
    pub async fn is_killswitch_active(&self) -> bool {
        *self.killswitch.read().await
    }
}

/// Main application that coordinates all components
pub struct Application {
    state: Arc<AppState>,
    api_server: ApiServer,
    scheduler: Scheduler,
}

impl Application {
    /// Create a new application instance
    pub async fn new(config: Config) -> Result<Self> {
        info!("Initializing application components...");

        // Initialize database
        let database = Database::new(&config.database)
            .await
            .context("Failed to initialize database")?;

        // Run database migrations
        database
            .migrate()
            .await
            .context("Failed to run database migrations")?;

        // Wire the engine stack over the shared stores
        let stores = Arc::new(SqliteStores::new(database.clone()));
        let payment_gateway: Arc<dyn PaymentGateway> =
            Arc::new(RestPaymentGateway::new(config.gateway.clone()));
        let engine = BookingEngine::with_stores(stores, payment_gateway.clone(), &config)
            .context("Failed to build booking engine")?;

        let uploader: Arc<dyn EvidenceUploader> =
            Arc::new(RestEvidenceUploader::new(&config.gateway));

        // Create shared application state
        let state = Arc::new(AppState {
            config: config.clone(),
            database,
            engine,
            uploader,
            killswitch: Arc::new(RwLock::new(false)),
        });

        // Initialize API server
        let api_server = ApiServer::new(state.clone()).context("Failed to create API server")?;

        // Initialize scheduler
        let scheduler = Scheduler::new(state.clone(), payment_gateway);

        info!("Application components initialized successfully");

        Ok(Self {
            state,
            api_server,
            scheduler,
        })
    }

    /// Run the application
    pub async fn run(&mut self) -> Result<()> {
        info!("Starting application services...");

        // Start scheduler
        let scheduler_handle = {
            let mut scheduler = self.scheduler.clone();
            tokio::spawn(async move {
                if let Err(e) = scheduler.run().await {
                    tracing::error!("Scheduler error: {}", e);
                }
            })
        };

        info!("Background scheduler started");

        // Start API server (this will block until shutdown)
        info!(
            "Starting API server on {}:{}",
            self.state.config.server.host, self.state.config.server.port
        );

        tokio::select! {
            result = self.api_server.run() => {
                result.context("API server error")?;
            }
            result = scheduler_handle => {
                result.context("Scheduler task error")?;
            }
        }

        Ok(())
    }

    /// Shutdown the application gracefully
    pub async fn shutdown(&mut self) -> Result<()> {
        info!("Shutting down application...");

        // Set killswitch to stop processing new requests
        {
            let mut killswitch = self.state.killswitch.write().await;
            *killswitch = true;
        }
        info!("Killswitch activated - no new bookings will be accepted");

        // Shutdown API server
        self.api_server
            .shutdown()
            .await
            .context("Failed to shutdown API server")?;
        info!("API server shutdown complete");

        // Shutdown scheduler
        self.scheduler
            .shutdown()
            .await
            .context("Failed to shutdown scheduler")?;
        info!("Scheduler shutdown complete");

        // Close database connections
        self.state.database.close().await;
        info!("Database connections closed");

        info!("Application shutdown complete");
        Ok(())
    }
}
