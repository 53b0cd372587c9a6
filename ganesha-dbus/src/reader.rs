// SPDX-License-Identifier: GPL-3.0-only

//! Typed readers over a [`BusConnection`].

use ganesha_types::{
    Client, ClientIoStats, EntityListing, Export, OperationCounters, StatsReply,
};

use crate::bus::{
    BusConnection, CallArg, GET_CLIENT_IO_OPS, GET_GLOBAL_OPS, GET_TOTAL_OPS, SHOW_CLIENTS,
    SHOW_EXPORTS,
};
use crate::error::BusError;
use crate::listing::{decode_clients, decode_exports};
use crate::mapper::{decode_client_io_reply, decode_ops_reply};

/// Export manager calls.
pub struct ExportsReader<'c> {
    connection: &'c dyn BusConnection,
}

impl<'c> ExportsReader<'c> {
    pub fn new(connection: &'c dyn BusConnection) -> Self {
        Self { connection }
    }

    pub async fn list_exports(&self) -> Result<EntityListing<Export>, BusError> {
        let target = self.connection.target();
        let values = self
            .connection
            .invoke(target.manager_interface, SHOW_EXPORTS, &[])
            .await?;
        decode_exports(&values)
    }

    /// Per-protocol operation totals of one export.
    pub async fn total_ops(
        &self,
        export_id: u16,
    ) -> Result<StatsReply<OperationCounters>, BusError> {
        let target = self.connection.target();
        let values = self
            .connection
            .invoke(
                target.stats_interface,
                GET_TOTAL_OPS,
                &[CallArg::ExportId(export_id)],
            )
            .await?;
        decode_ops_reply(GET_TOTAL_OPS, &values)
    }

    /// `GetGlobalOPS`; same reply layout as [`Self::total_ops`].
    pub async fn global_ops(
        &self,
        export_id: u16,
    ) -> Result<StatsReply<OperationCounters>, BusError> {
        let target = self.connection.target();
        let values = self
            .connection
            .invoke(
                target.stats_interface,
                GET_GLOBAL_OPS,
                &[CallArg::ExportId(export_id)],
            )
            .await?;
        decode_ops_reply(GET_GLOBAL_OPS, &values)
    }
}

/// Client manager calls.
pub struct ClientsReader<'c> {
    connection: &'c dyn BusConnection,
}

impl<'c> ClientsReader<'c> {
    pub fn new(connection: &'c dyn BusConnection) -> Self {
        Self { connection }
    }

    pub async fn list_clients(&self) -> Result<EntityListing<Client>, BusError> {
        let target = self.connection.target();
        let values = self
            .connection
            .invoke(target.manager_interface, SHOW_CLIENTS, &[])
            .await?;
        decode_clients(&values)
    }

    pub async fn client_io(&self, address: &str) -> Result<StatsReply<ClientIoStats>, BusError> {
        let target = self.connection.target();
        let values = self
            .connection
            .invoke(
                target.stats_interface,
                GET_CLIENT_IO_OPS,
                &[CallArg::Address(address.to_owned())],
            )
            .await?;
        decode_client_io_reply(GET_CLIENT_IO_OPS, &values)
    }
}
