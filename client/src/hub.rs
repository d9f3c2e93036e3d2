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

//! Client-side subscriber hub

use std::sync::Arc;
use wirelink_protocol::Subscribers;

/// Callback receiving each line from the server, verbatim
pub type LineCallback = dyn Fn(&str) + Send + Sync;

/// Callback run when the server kicks this client
pub type KickCallback = dyn Fn() + Send + Sync;

/// Subscriber lists for client events
///
/// Callbacks run on the receive loop in registration order; the next line is not read until
/// every subscriber has returned.
#[derive(Debug, Default)]
pub struct ClientHub {
    messages: Subscribers<LineCallback>,
    kicks: Subscribers<KickCallback>,
}

impl ClientHub {
    /// Create a hub with no subscribers
    pub fn new() -> Self {
        Self::default()
    }

    /// Receive every line other than the kick signal
    pub fn subscribe<F>(&self, callback: F)
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.messages.push(Arc::new(callback));
    }

    /// Be told when the server kicks this client
    pub fn on_kick<F>(&self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.kicks.push(Arc::new(callback));
    }

    pub(crate) fn notify_message(&self, line: &str) {
        for callback in self.messages.snapshot() {
            callback(line);
        }
    }

    pub(crate) fn notify_kick(&self) {
        for callback in self.kicks.snapshot() {
            callback();
        }
    }
}
