// UiBridge - Marshals work between the tokio runtime and the Slint event loop
//
// Two event loops coexist at runtime: Slint's single-threaded GUI loop on the
// main thread and tokio's worker pool running the subprocess I/O. The bridge
// carries closures across that boundary in both directions:
// - tokio task -> GUI: post() queues a widget mutation onto the Slint loop
// - GUI callback -> tokio: spawn() hands a future to the runtime

use slint::ComponentHandle;
use std::future::Future;
use tokio::sync::mpsc;

/// Marshals UI mutations onto the Slint event loop and futures onto tokio.
///
/// Widget mutations posted from worker threads travel through a bounded
/// channel into a relay thread, which queues them on the Slint loop via
/// `Weak::upgrade_in_event_loop`. The channel bound keeps a flooding worker
/// from piling up unrendered updates; overflow drops the update and logs.
pub struct UiBridge<T: ComponentHandle> {
    /// Runtime the GUI hands its async work to
    tokio_handle: tokio::runtime::Handle,

    /// Pending widget mutations, drained by the relay thread
    update_tx: mpsc::Sender<Box<dyn FnOnce(&T) + Send>>,
}

impl<T: ComponentHandle + 'static> UiBridge<T> {
    /// Create the bridge and start its relay thread.
    ///
    /// The relay thread holds only a weak handle, so the bridge never keeps
    /// the window alive on its own; once queuing into the Slint loop fails
    /// the thread exits.
    pub fn new(ui: &T, tokio_handle: tokio::runtime::Handle) -> Self {
        let (update_tx, mut update_rx) = mpsc::channel::<Box<dyn FnOnce(&T) + Send>>(100);

        let relay_weak = ui.as_weak();
        std::thread::spawn(move || {
            tracing::debug!("UI bridge relay thread started");

            while let Some(mutate) = update_rx.blocking_recv() {
                let queued = relay_weak.upgrade_in_event_loop(move |ui| {
                    mutate(&ui);
                });

                if let Err(e) = queued {
                    // Event loop is gone; nothing left to relay to
                    tracing::warn!("Failed to queue UI update: {:?}", e);
                    break;
                }
            }

            tracing::debug!("UI bridge relay thread terminated");
        });

        Self {
            tokio_handle,
            update_tx,
        }
    }

    /// Queue a widget mutation from any thread.
    ///
    /// The closure runs on the Slint event loop on its next iteration.
    pub fn post<F>(&self, mutate: F)
    where
        F: FnOnce(&T) + Send + 'static,
    {
        post_update(&self.update_tx, mutate);
    }

    /// Hand a future to the tokio runtime from a Slint callback
    pub fn spawn<F, Fut>(&self, make_future: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.tokio_handle.spawn(async move {
            make_future().await;
        });
    }

    /// Cheap cloneable handle for capture in Slint callbacks
    pub fn handle(&self) -> UiBridgeHandle<T> {
        UiBridgeHandle {
            tokio_handle: self.tokio_handle.clone(),
            update_tx: self.update_tx.clone(),
        }
    }
}

fn post_update<T: ComponentHandle>(
    tx: &mpsc::Sender<Box<dyn FnOnce(&T) + Send>>,
    mutate: impl FnOnce(&T) + Send + 'static,
) {
    match tx.try_send(Box::new(mutate)) {
        Ok(_) => {}
        Err(mpsc::error::TrySendError::Full(_)) => {
            tracing::warn!("UI update channel full - dropping update");
        }
        Err(mpsc::error::TrySendError::Closed(_)) => {
            tracing::warn!("UI update channel closed - relay thread has stopped");
        }
    }
}

/// Cloneable companion to [`UiBridge`] for capture in callbacks
pub struct UiBridgeHandle<T: ComponentHandle> {
    tokio_handle: tokio::runtime::Handle,
    update_tx: mpsc::Sender<Box<dyn FnOnce(&T) + Send>>,
}

// Manual Clone implementation to avoid requiring T: Clone
impl<T: ComponentHandle> Clone for UiBridgeHandle<T> {
    fn clone(&self) -> Self {
        Self {
            tokio_handle: self.tokio_handle.clone(),
            update_tx: self.update_tx.clone(),
        }
    }
}

impl<T: ComponentHandle + 'static> UiBridgeHandle<T> {
    /// See [`UiBridge::post`]
    pub fn post<F>(&self, mutate: F)
    where
        F: FnOnce(&T) + Send + 'static,
    {
        post_update(&self.update_tx, mutate);
    }

    /// See [`UiBridge::spawn`]
    pub fn spawn<F, Fut>(&self, make_future: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.tokio_handle.spawn(async move {
            make_future().await;
        });
    }
}
