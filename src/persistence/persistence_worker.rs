use super::config_store::ConfigStore;
use super::OverlayConfig;
use color_eyre::Result;
use tokio::sync::mpsc::{channel, Sender};
use tokio::sync::oneshot;
use tracing::{debug, error, info};

macro_rules! handle_action {
    ($action:expr, $response_tx:expr) => {
        if $response_tx.send($action.await).is_err() {
            error!("Failed to send response");
        }
    };
}

/// Requests the UI thread can hand to the persistence task.
#[derive(Debug)]
pub enum PersistenceAction {
    Save {
        config: OverlayConfig,
        response_tx: oneshot::Sender<Result<()>>,
    },
    Reload {
        response_tx: oneshot::Sender<Result<OverlayConfig>>,
    },
}

/// Owns the config file and serves [`PersistenceAction`]s on a tokio task.
pub struct PersistenceWorker {
    tx: Sender<PersistenceAction>,
    worker_handle: tokio::task::JoinHandle<()>,
}

impl PersistenceWorker {
    pub fn spawn(store: ConfigStore) -> Self {
        let (tx, mut rx) = channel::<PersistenceAction>(32);
        info!("Starting persistence worker for {}", store.path().display());

        let handle = tokio::spawn(async move {
            while let Some(action) = rx.recv().await {
                debug!("Persistence action: {:?}", action);
                match action {
                    PersistenceAction::Save {
                        config,
                        response_tx,
                    } => {
                        handle_action!(store.save(&config), response_tx);
                    }
                    PersistenceAction::Reload { response_tx } => {
                        handle_action!(store.load(), response_tx);
                    }
                }
            }
            info!("Persistence worker stopped");
        });

        Self {
            tx,
            worker_handle: handle,
        }
    }

    pub fn get_sender(&self) -> Sender<PersistenceAction> {
        self.tx.clone()
    }

    pub fn is_running(&self) -> bool {
        !self.worker_handle.is_finished()
    }
}
