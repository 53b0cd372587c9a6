// SPDX-License-Identifier: GPL-3.0-only

//! zbus backend

use async_trait::async_trait;
use zbus::{Connection, Proxy, zvariant::Structure};

use crate::bus::{BusConnection, BusConnector, CallArg, ServiceTarget};
use crate::error::BusError;
use crate::value::ReplyValue;

/// Connects to the system bus, or to `address` when one is configured.
#[derive(Debug, Clone, Default)]
pub struct ZbusConnector {
    address: Option<String>,
}

impl ZbusConnector {
    pub fn new(address: Option<String>) -> Self {
        Self { address }
    }
}

#[async_trait]
impl BusConnector for ZbusConnector {
    async fn open(&self, target: &ServiceTarget) -> Result<Box<dyn BusConnection>, BusError> {
        let connection = match &self.address {
            Some(address) => zbus::connection::Builder::address(address.as_str())
                .map_err(|e| BusError::Connection(format!("invalid bus address {address}: {e}")))?
                .build()
                .await,
            None => Connection::system().await,
        }
        .map_err(|e| BusError::Connection(e.to_string()))?;

        tracing::debug!(target_name = target.name, "Opened bus connection");

        Ok(Box::new(ZbusConnection {
            connection,
            target: *target,
        }))
    }
}

pub struct ZbusConnection {
    connection: Connection,
    target: ServiceTarget,
}

impl ZbusConnection {
    async fn call(&self, interface: &str, method: &str, args: &[CallArg]) -> zbus::Result<zbus::Message> {
        let proxy = Proxy::new(
            &self.connection,
            self.target.destination,
            self.target.path,
            interface,
        )
        .await?;

        match args {
            [] => proxy.call_method(method, &()).await,
            [CallArg::ExportId(id)] => proxy.call_method(method, &(*id,)).await,
            [CallArg::Address(address)] => proxy.call_method(method, &(address.as_str(),)).await,
            _ => Err(zbus::Error::Failure(format!(
                "{method} takes at most one argument, got {}",
                args.len()
            ))),
        }
    }
}

#[async_trait]
impl BusConnection for ZbusConnection {
    fn target(&self) -> &ServiceTarget {
        &self.target
    }

    async fn invoke(
        &self,
        interface: &str,
        method: &str,
        args: &[CallArg],
    ) -> Result<Vec<ReplyValue>, BusError> {
        let reply = self.call(interface, method, args).await.map_err(|err| match &err {
            zbus::Error::MethodError(name, msg, _info) => BusError::call(
                method,
                match msg.as_deref() {
                    Some(msg) if !msg.is_empty() => format!("{}: {msg}", name.as_str()),
                    _ => name.as_str().to_owned(),
                },
            ),
            _ => BusError::call(method, err.to_string()),
        })?;

        let body = reply.body();
        let fields: Structure<'_> = body
            .deserialize()
            .map_err(|e| BusError::protocol(method, format!("undecodable reply body: {e}")))?;

        Ok(fields.fields().iter().map(ReplyValue::from).collect())
    }

    async fn close(&self) -> Result<(), BusError> {
        self.connection
            .clone()
            .close()
            .await
            .map_err(|e| BusError::Connection(e.to_string()))
    }
}
