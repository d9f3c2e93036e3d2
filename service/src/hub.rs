//
// Copyright 2017-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Server-side subscriber hub

use std::sync::Arc;
use tracing::trace;
use wirelink_protocol::{Identity, Subscribers};

/// Callback receiving `(sender, line)` for lines the server does not route itself
pub type MessageCallback = dyn Fn(Identity, &str) + Send + Sync;

/// Callback receiving the identity of a client that connected or disconnected
pub type ClientCallback = dyn Fn(Identity) + Send + Sync;

/// Subscriber lists for server events
///
/// Callbacks run synchronously on the task that raised the event, in registration order.
/// A callback registered while an event is being delivered sees the next event, not the
/// current one.
#[derive(Debug, Default)]
pub struct ServerHub {
    messages: Subscribers<MessageCallback>,
    connects: Subscribers<ClientCallback>,
    disconnects: Subscribers<ClientCallback>,
}

impl ServerHub {
    /// Create a hub with no subscribers
    pub fn new() -> Self {
        Self::default()
    }

    /// Receive lines that are not direct, global or disconnect commands
    pub fn subscribe<F>(&self, callback: F)
    where
        F: Fn(Identity, &str) + Send + Sync + 'static,
    {
        self.messages.push(Arc::new(callback));
    }

    /// Be told when a client finishes its handshake
    pub fn on_client_connect<F>(&self, callback: F)
    where
        F: Fn(Identity) + Send + Sync + 'static,
    {
        self.connects.push(Arc::new(callback));
    }

    /// Be told when a client is removed, whatever the cause
    pub fn on_client_disconnect<F>(&self, callback: F)
    where
        F: Fn(Identity) + Send + Sync + 'static,
    {
        self.disconnects.push(Arc::new(callback));
    }

    pub(crate) fn notify_message(&self, sender: Identity, line: &str) {
        let subscribers = self.messages.snapshot();
        trace!(%sender, subscribers = subscribers.len(), "Delivering line to subscribers");
        for callback in subscribers {
            callback(sender, line);
        }
    }

    pub(crate) fn notify_connect(&self, id: Identity) {
        for callback in self.connects.snapshot() {
            callback(id);
        }
    }

    pub(crate) fn notify_disconnect(&self, id: Identity) {
        for callback in self.disconnects.snapshot() {
            callback(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_message_subscribers_in_order() {
        let hub = ServerHub::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let id = Identity::generate();

        for tag in ["first", "second"] {
            let seen = seen.clone();
            hub.subscribe(move |sender, line| {
                seen.lock().unwrap().push(format!("{tag}:{sender}:{line}"));
            });
        }

        hub.notify_message(id, "hello");
        assert_eq!(
            *seen.lock().unwrap(),
            vec![format!("first:{id}:hello"), format!("second:{id}:hello")]
        );
    }

    #[test]
    fn test_connect_and_disconnect_are_separate_lists() {
        let hub = ServerHub::new();
        let connected = Arc::new(Mutex::new(Vec::new()));
        let disconnected = Arc::new(Mutex::new(Vec::new()));
        {
            let connected = connected.clone();
            hub.on_client_connect(move |id| connected.lock().unwrap().push(id));
        }
        {
            let disconnected = disconnected.clone();
            hub.on_client_disconnect(move |id| disconnected.lock().unwrap().push(id));
        }

        let id = Identity::generate();
        hub.notify_connect(id);
        assert_eq!(*connected.lock().unwrap(), vec![id]);
        assert!(disconnected.lock().unwrap().is_empty());

        hub.notify_disconnect(id);
        assert_eq!(*disconnected.lock().unwrap(), vec![id]);
    }

    #[test]
    fn test_subscribe_during_delivery_applies_to_next_event() {
        let hub = Arc::new(ServerHub::new());
        let late_calls = Arc::new(Mutex::new(0usize));
        {
            let hub_ref = Arc::downgrade(&hub);
            let late_calls = late_calls.clone();
            hub.subscribe(move |_, _| {
                if let Some(hub) = hub_ref.upgrade() {
                    let late_calls = late_calls.clone();
                    hub.subscribe(move |_, _| *late_calls.lock().unwrap() += 1);
                }
            });
        }

        let id = Identity::generate();
        hub.notify_message(id, "one");
        assert_eq!(*late_calls.lock().unwrap(), 0);

        hub.notify_message(id, "two");
        assert_eq!(*late_calls.lock().unwrap(), 1);
    }
}
