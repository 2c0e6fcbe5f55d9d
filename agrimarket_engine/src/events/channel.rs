//! Stateless fire-and-forget pub-sub.
//!
//! Lifecycle operations publish events through [`EventProducer`]s; each [`EventHandler`] owns the receiving end of
//! a channel and runs the registered hook on every event it sees. Handlers only get the event itself, never the
//! engine's internal state. A publish failure is logged and swallowed: delivery is best-effort and never affects
//! the state change that triggered it.
use std::{
    future::Future,
    pin::Pin,
    sync::{atomic::{AtomicI64, Ordering}, Arc},
};

use log::*;
use tokio::sync::mpsc;

pub type Handler<E> = Arc<dyn Fn(E) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

pub struct EventHandler<E: Send + Sync + 'static> {
    listener: mpsc::Receiver<E>,
    sender: mpsc::Sender<E>,
    handler: Handler<E>,
}

impl<E: Send + Sync + 'static> EventHandler<E> {
    pub fn new(buffer_size: usize, handler: Handler<E>) -> Self {
        let (sender, listener) = mpsc::channel(buffer_size);
        Self { listener, sender, handler }
    }

    pub fn subscribe(&self) -> EventProducer<E> {
        EventProducer::new(self.sender.clone())
    }

    /// Consumes the handler and processes events until every producer has been dropped. Each event is handled on
    /// its own task; the loop waits for in-flight handlers before returning so a shutdown cannot strand them.
    pub async fn start_handler(mut self) {
        debug!("📬️ Starting event handler");
        // Drop our copy of the sender so the channel closes once the last subscriber goes away.
        drop(self.sender);
        let in_flight = Arc::new(AtomicI64::new(0));
        while let Some(event) = self.listener.recv().await {
            trace!("📬️ Handling event");
            let handler = Arc::clone(&self.handler);
            let counter = Arc::clone(&in_flight);
            counter.fetch_add(1, Ordering::SeqCst);
            tokio::spawn(async move {
                (handler)(event).await;
                counter.fetch_sub(1, Ordering::SeqCst);
                trace!("📬️ Event handled");
            });
        }
        while in_flight.load(Ordering::SeqCst) > 0 {
            debug!("📬️ Waiting for in-flight event handlers to complete");
            tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
        }
        debug!("📬️ Event handler has shut down");
    }
}

#[derive(Clone)]
pub struct EventProducer<E: Send + Sync> {
    sender: mpsc::Sender<E>,
}

impl<E: Send + Sync> EventProducer<E> {
    pub fn new(sender: mpsc::Sender<E>) -> Self {
        Self { sender }
    }

    pub async fn publish_event(&self, event: E) {
        if let Err(e) = self.sender.send(event).await {
            error!("📬️ Failed to send event: {e}");
        }
    }
}
