// SPDX-License-Identifier: GPL-3.0-only

//! Scripted in-memory bus.
//!
//! Replies are keyed by method name and arguments. Every connection opened from one
//! [`FakeBus`] shares its script and call log.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

use crate::bus::{BusConnection, BusConnector, CallArg, ServiceTarget};
use crate::error::BusError;
use crate::value::ReplyValue;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub target: &'static str,
    pub interface: String,
    pub method: String,
    pub args: Vec<CallArg>,
}

#[derive(Default)]
struct FakeState {
    replies: HashMap<(String, Vec<CallArg>), Result<Vec<ReplyValue>, BusError>>,
    calls: Vec<RecordedCall>,
    failing_targets: HashMap<&'static str, String>,
    opened: usize,
    closed: usize,
}

#[derive(Clone, Default)]
pub struct FakeBus {
    state: Arc<Mutex<FakeState>>,
}

impl FakeBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut FakeState) -> R) -> R {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }

    /// Scripts the reply of `method` called with exactly `args`.
    pub fn reply(
        &self,
        method: &str,
        args: Vec<CallArg>,
        reply: Result<Vec<ReplyValue>, BusError>,
    ) -> &Self {
        self.with_state(|state| {
            state.replies.insert((method.to_owned(), args), reply);
        });
        self
    }

    /// Makes `open` fail for the target with this short name.
    pub fn fail_open(&self, target: &'static str, reason: &str) -> &Self {
        self.with_state(|state| {
            state.failing_targets.insert(target, reason.to_owned());
        });
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.with_state(|state| state.calls.clone())
    }

    pub fn calls_to(&self, method: &str) -> Vec<RecordedCall> {
        self.with_state(|state| {
            state
                .calls
                .iter()
                .filter(|call| call.method == method)
                .cloned()
                .collect()
        })
    }

    pub fn opened(&self) -> usize {
        self.with_state(|state| state.opened)
    }

    pub fn closed(&self) -> usize {
        self.with_state(|state| state.closed)
    }
}

#[async_trait]
impl BusConnector for FakeBus {
    async fn open(&self, target: &ServiceTarget) -> Result<Box<dyn BusConnection>, BusError> {
        self.with_state(|state| match state.failing_targets.get(target.name) {
            Some(reason) => Err(BusError::Connection(reason.clone())),
            None => {
                state.opened += 1;
                Ok(())
            }
        })?;

        Ok(Box::new(FakeConnection {
            bus: self.clone(),
            target: *target,
        }))
    }
}

struct FakeConnection {
    bus: FakeBus,
    target: ServiceTarget,
}

#[async_trait]
impl BusConnection for FakeConnection {
    fn target(&self) -> &ServiceTarget {
        &self.target
    }

    async fn invoke(
        &self,
        interface: &str,
        method: &str,
        args: &[CallArg],
    ) -> Result<Vec<ReplyValue>, BusError> {
        self.bus.with_state(|state| {
            state.calls.push(RecordedCall {
                target: self.target.name,
                interface: interface.to_owned(),
                method: method.to_owned(),
                args: args.to_vec(),
            });
            state
                .replies
                .get(&(method.to_owned(), args.to_vec()))
                .cloned()
                .unwrap_or_else(|| {
                    Err(BusError::call(
                        method,
                        "org.freedesktop.DBus.Error.UnknownMethod",
                    ))
                })
        })
    }

    async fn close(&self) -> Result<(), BusError> {
        self.bus.with_state(|state| state.closed += 1);
        Ok(())
    }
}
