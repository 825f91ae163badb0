use log::*;
use tokio::task::JoinHandle;

use crate::{
    events::{EventHandler, EventProducer, Handler},
    traits::NotificationRequest,
};

/// Start the fire-and-forget notification worker.
///
/// The returned producer is handed to the order flow API; requests pushed into it are
/// delivered by `handler` on the worker's own tasks. The caller wires `handler` to its
/// [`crate::traits::NotificationSender`] implementation and logs delivery failures there;
/// by contract they are unobservable to the operation that queued the message.
///
/// Do not await the returned `JoinHandle`; it completes only once every producer has been
/// dropped and the queue has drained.
pub fn start_notification_worker(
    handler: Handler<NotificationRequest>,
    buffer_size: usize,
) -> (EventProducer<NotificationRequest>, JoinHandle<()>) {
    let event_handler = EventHandler::new(buffer_size, handler);
    let producer = event_handler.subscribe();
    let handle = tokio::spawn(async move {
        info!("🔔️ Notification worker started");
        event_handler.start_handler().await;
        info!("🔔️ Notification worker stopped");
    });
    (producer, handle)
}
