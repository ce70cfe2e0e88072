// Live subscription manager - owns the push channel for one session.
// Closed -> Connecting -> Open -> Closed; a dropped channel is not retried.
use crate::domain::entity::RootSelection;
use crate::domain::telemetry::TelemetryStore;
use crate::infrastructure::ws::protocol::{
    CommandEnvelope, EntityData, EntityDataCmd, EntityFilter, InboundFrame, KeySpec,
    SUBSCRIPTION_CMD_ID, parse_frame, snapshot_followup, subscription_keys,
};
use anyhow::Context;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Closed,
    Connecting,
    Open,
}

pub struct SubscriptionManager {
    state: ChannelState,
    writer: Option<SplitSink<WsStream, Message>>,
    reader: Option<SplitStream<WsStream>>,
    keys: Vec<KeySpec>,
}

impl SubscriptionManager {
    /// A manager with no channel. Closing it is a no-op.
    pub fn closed() -> Self {
        Self {
            state: ChannelState::Closed,
            writer: None,
            reader: None,
            keys: subscription_keys(),
        }
    }

    /// Connect and issue the one entity-query subscription for this session.
    pub async fn open(
        ws_base_url: &str,
        token: &str,
        selection: &RootSelection,
    ) -> anyhow::Result<Self> {
        let url = format!(
            "{}/api/ws/plugins/telemetry?token={}",
            ws_base_url.trim_end_matches('/'),
            urlencoding::encode(token)
        );

        let mut manager = Self::closed();
        manager.state = ChannelState::Connecting;
        tracing::debug!(root = %selection.display_name, "opening push channel");

        let (ws, _) = connect_async(&url)
            .await
            .context("failed to open push channel")?;
        let (writer, reader) = ws.split();
        manager.writer = Some(writer);
        manager.reader = Some(reader);
        manager.state = ChannelState::Open;

        let filter = EntityFilter::for_root(selection);
        let cmd = EntityDataCmd::subscribe(filter, manager.keys.clone());
        manager.send(&CommandEnvelope::entity_data(cmd)).await?;
        tracing::info!(root = %selection.display_name, "entity subscription issued");
        Ok(manager)
    }

    pub fn state(&self) -> ChannelState {
        self.state
    }

    async fn send(&mut self, envelope: &CommandEnvelope) -> anyhow::Result<()> {
        let text = serde_json::to_string(envelope).context("failed to encode command")?;
        let writer = self.writer.as_mut().context("push channel is not open")?;
        writer
            .send(Message::Text(text))
            .await
            .context("failed to send command")?;
        Ok(())
    }

    /// Wait for the next frame of this subscription and merge it into the
    /// store. Returns `false` once the channel has closed; the caller treats
    /// every `true` as a data-changed signal.
    pub async fn next_merge(&mut self, store: &mut TelemetryStore) -> bool {
        loop {
            let Some(reader) = self.reader.as_mut() else {
                return false;
            };
            let message = match reader.next().await {
                Some(Ok(message)) => message,
                Some(Err(e)) => {
                    tracing::warn!(error = %e, "push channel error, closing");
                    self.close().await;
                    return false;
                }
                None => {
                    self.state = ChannelState::Closed;
                    return false;
                }
            };

            let text = match message {
                Message::Text(text) => text,
                Message::Close(_) => {
                    self.state = ChannelState::Closed;
                    return false;
                }
                _ => continue,
            };

            let frame = parse_frame(&text);
            if frame.cmd_id != Some(SUBSCRIPTION_CMD_ID) {
                continue;
            }
            if self.handle_frame(&frame, store).await {
                return true;
            }
        }
    }

    /// Apply one subscription frame. Snapshot frames trigger the latest-value
    /// follow-up before their membership list is merged.
    async fn handle_frame(&mut self, frame: &InboundFrame, store: &mut TelemetryStore) -> bool {
        let mut changed = false;
        if let Some(followup) = snapshot_followup(frame, &self.keys) {
            if let Err(e) = self.send(&followup).await {
                tracing::warn!(error = %e, "latest-value follow-up failed");
            }
        }
        if let Some(snapshot) = &frame.data {
            let merged = merge_entities(store, &snapshot.data);
            tracing::debug!(entities = merged, "initial snapshot merged");
            changed = true;
        }
        if let Some(update) = &frame.update {
            let merged = merge_entities(store, update);
            tracing::debug!(entities = merged, "incremental update merged");
            changed = true;
        }
        changed
    }

    /// Close the channel. Idempotent: safe on an already-closed or
    /// never-opened manager, and any close error is swallowed.
    pub async fn close(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            if let Err(e) = writer.send(Message::Close(None)).await {
                tracing::debug!(error = %e, "close handshake failed");
            }
        }
        self.reader = None;
        self.state = ChannelState::Closed;
    }
}

/// Merge a list of entity payloads into the store, one flat record per
/// entity. Items without an entity id are skipped.
pub fn merge_entities(store: &mut TelemetryStore, items: &[EntityData]) -> usize {
    let mut merged = 0;
    for item in items {
        let Some(entity) = &item.entity_id else {
            continue;
        };
        store.apply_fields(&entity.id, item.field_updates());
        merged += 1;
    }
    merged
}
