//! Application context - owns every long-lived component

use std::sync::Arc;

use levelset_core::{Controller, ControllerError, LookupReconciler, Reconciler};
use levelset_domain::{Config, LevelsetError};
use levelset_infra::{ApiClient, Informer};
use thiserror::Error;
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Failures surfaced by [`AppContext`]
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] LevelsetError),

    #[error(transparent)]
    Controller(#[from] ControllerError),

    #[error("background task failed: {0}")]
    Task(#[from] JoinError),
}

/// API client, informer and controller sharing one stop signal
pub struct AppContext {
    pub config: Config,
    pub client: Arc<ApiClient>,
    pub informer: Arc<Informer>,
    pub controller: Arc<Controller<ApiClient>>,
    stop: CancellationToken,
}

impl AppContext {
    /// Build the context with the logging sample reconciler
    ///
    /// # Errors
    /// Returns `AppError::Config` if the configuration is invalid or the
    /// client cannot be built.
    pub fn new(config: Config) -> Result<Self, AppError> {
        Self::with_reconciler(config, Arc::new(LookupReconciler))
    }

    /// # Errors
    /// See [`AppContext::new`].
    pub fn with_reconciler(
        config: Config,
        reconciler: Arc<dyn Reconciler>,
    ) -> Result<Self, AppError> {
        config.validate()?;

        let client = Arc::new(ApiClient::new(&config.client).map_err(LevelsetError::from)?);
        let informer = Arc::new(Informer::new(client.clone(), &config.informer));
        let controller = Arc::new(Controller::new(
            client.clone(),
            informer.as_ref(),
            informer.mirror(),
            reconciler,
            config.controller.clone(),
        )?);

        info!(
            server = %client.server_url(),
            namespace = %config.informer.namespace,
            workers = config.controller.workers,
            "Application context initialised"
        );

        Ok(Self { config, client, informer, controller, stop: CancellationToken::new() })
    }

    /// Token that stops the informer and controller when cancelled
    pub fn stop_token(&self) -> CancellationToken {
        self.stop.clone()
    }

    pub fn shutdown(&self) {
        self.stop.cancel();
    }

    /// Run the informer and controller until the stop token fires
    ///
    /// If the controller exits on its own (a crash), the informer is
    /// stopped as well. Both tasks are always joined.
    ///
    /// # Errors
    /// Returns the controller's error, or `AppError::Task` if a task
    /// panicked outside its crash guard.
    pub async fn run(&self) -> Result<(), AppError> {
        let informer = tokio::spawn(Arc::clone(&self.informer).run(self.stop.clone()));
        let controller = tokio::spawn(Arc::clone(&self.controller).run(self.stop.clone()));

        let controller_result = controller.await;
        self.stop.cancel();
        let informer_result = informer.await;

        let outcome = controller_result?;
        informer_result?;
        if let Err(err) = &outcome {
            error!(error = %err, "Controller exited with an error");
        }
        info!(stats = ?self.controller.stats(), "Shut down");
        Ok(outcome?)
    }
}
