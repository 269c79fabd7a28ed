// Lock-free notification channel

use crate::messaging::notification::Notification;
use ringbuf::{HeapRb, traits::Split};
use std::sync::{Arc, Mutex};

pub type NotificationProducer = ringbuf::HeapProd<Notification>;
pub type NotificationConsumer = ringbuf::HeapCons<Notification>;

/// Producer side shared between everything that reports into one channel
pub type SharedNotificationProducer = Arc<Mutex<NotificationProducer>>;

pub fn create_notification_channel(
    capacity: usize,
) -> (NotificationProducer, NotificationConsumer) {
    let rb = HeapRb::<Notification>::new(capacity);
    rb.split()
}

/// Push a notification, dropping it if the buffer is full
///
/// Returns true if the notification was queued.
pub fn send_notification(sender: &SharedNotificationProducer, notification: Notification) -> bool {
    if let Ok(mut producer) = sender.lock() {
        ringbuf::traits::Producer::try_push(&mut *producer, notification).is_ok()
    } else {
        false
    }
}

/// Collect everything currently in the buffer
pub fn drain_notifications(consumer: &mut NotificationConsumer) -> Vec<Notification> {
    let mut notifications = Vec::new();
    while let Some(notification) = ringbuf::traits::Consumer::try_pop(consumer) {
        notifications.push(notification);
    }
    notifications
}
