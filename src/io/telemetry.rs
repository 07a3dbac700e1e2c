//! MQTT telemetry publishing
//!
//! Publishes controller state to the remote telemetry endpoint:
//! - people-count feed - occupancy count as a decimal ASCII integer
//! - temperature feed - commanded target temperature as a decimal ASCII integer
//! - snapshot topic - periodic JSON state snapshot
//!
//! The control loop hands messages to a bounded channel with a non-blocking
//! send; the publisher actor drains the channel and publishes at QoS 0.
//! A failed publish is logged and dropped - the transport offers no
//! delivery guarantee worth building a retry layer on.

use crate::domain::types::{epoch_ms, ClimateTier};
use crate::infra::config::Config;
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use serde::Serialize;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

/// Messages that can be sent to the telemetry publisher
#[derive(Debug)]
pub enum TelemetryMessage {
    /// Occupancy count changed
    PeopleCount(u32),
    /// Commanded target temperature changed (0 = off / unforced)
    Temperature(i32),
    /// Periodic state snapshot
    Snapshot(SnapshotPayload),
}

/// Periodic JSON state snapshot
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotPayload {
    /// Site identifier
    pub site: String,
    /// Timestamp (epoch ms)
    pub ts: u64,
    /// Current occupancy count
    pub people: u32,
    /// Commanded target temperature (0 = off)
    pub temperature: i32,
    /// Occupancy band
    pub tier: ClimateTier,
}

/// Create the telemetry channel pair
pub fn create_telemetry_channel(
    capacity: usize,
    site_id: String,
) -> (TelemetrySender, mpsc::Receiver<TelemetryMessage>) {
    let (tx, rx) = mpsc::channel(capacity);
    (TelemetrySender { tx, site_id }, rx)
}

/// Non-blocking producer handle used by the control loop
#[derive(Clone)]
pub struct TelemetrySender {
    tx: mpsc::Sender<TelemetryMessage>,
    site_id: String,
}

impl TelemetrySender {
    pub fn send_people_count(&self, people: u32) {
        self.send(TelemetryMessage::PeopleCount(people));
    }

    pub fn send_temperature(&self, temperature: i32) {
        self.send(TelemetryMessage::Temperature(temperature));
    }

    pub fn send_snapshot(&self, people: u32, temperature: i32) {
        self.send(TelemetryMessage::Snapshot(SnapshotPayload {
            site: self.site_id.clone(),
            ts: epoch_ms(),
            people,
            temperature,
            tier: ClimateTier::from_count(people),
        }));
    }

    fn send(&self, msg: TelemetryMessage) {
        if let Err(e) = self.tx.try_send(msg) {
            warn!(error = %e, "telemetry_channel_full_dropped");
        }
    }
}

/// MQTT publisher actor
///
/// Receives messages from the telemetry channel and publishes them to the
/// configured feeds.
pub struct TelemetryPublisher {
    client: AsyncClient,
    rx: mpsc::Receiver<TelemetryMessage>,
    people_count_topic: String,
    temperature_topic: String,
    snapshot_topic: String,
}

impl TelemetryPublisher {
    /// Create a new publisher connected to the configured broker
    pub fn new(config: &Config, rx: mpsc::Receiver<TelemetryMessage>) -> Self {
        let client_id = format!("roomctl-{}", std::process::id());
        let mut mqttoptions = MqttOptions::new(client_id, config.mqtt_host(), config.mqtt_port());
        mqttoptions.set_keep_alive(Duration::from_secs(30));
        mqttoptions.set_clean_session(true);

        // Set credentials if configured (Adafruit-IO style username/key)
        if let (Some(username), Some(password)) = (config.mqtt_username(), config.mqtt_password()) {
            mqttoptions.set_credentials(username, password);
        }

        let (client, eventloop) = AsyncClient::new(mqttoptions, 100);

        // Spawn the eventloop handler
        tokio::spawn(async move {
            let mut eventloop = eventloop;
            loop {
                match eventloop.poll().await {
                    Ok(Event::Incoming(Packet::ConnAck(_))) => {
                        info!("telemetry_connected");
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!(error = %e, "telemetry_connection_error");
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }
                }
            }
        });

        Self {
            client,
            rx,
            people_count_topic: config.people_count_topic().to_string(),
            temperature_topic: config.temperature_topic().to_string(),
            snapshot_topic: config.snapshot_topic().to_string(),
        }
    }

    /// Run the publisher loop until shutdown
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!(
            people_count = %self.people_count_topic,
            temperature = %self.temperature_topic,
            snapshot = %self.snapshot_topic,
            "telemetry_publisher_started"
        );

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("telemetry_publisher_shutdown");
                        // Drain remaining messages
                        while let Ok(msg) = self.rx.try_recv() {
                            self.publish_message(msg).await;
                        }
                        return;
                    }
                }
                Some(msg) = self.rx.recv() => {
                    self.publish_message(msg).await;
                }
            }
        }
    }

    async fn publish_message(&self, msg: TelemetryMessage) {
        match msg {
            TelemetryMessage::PeopleCount(people) => {
                let payload = people.to_string();
                if let Err(e) = self
                    .client
                    .publish(&self.people_count_topic, QoS::AtMostOnce, false, payload.as_bytes())
                    .await
                {
                    warn!(error = %e, "telemetry_people_count_failed");
                }
            }
            TelemetryMessage::Temperature(temperature) => {
                let payload = temperature.to_string();
                if let Err(e) = self
                    .client
                    .publish(&self.temperature_topic, QoS::AtMostOnce, false, payload.as_bytes())
                    .await
                {
                    warn!(error = %e, "telemetry_temperature_failed");
                }
            }
            TelemetryMessage::Snapshot(payload) => {
                if let Ok(json) = serde_json::to_string(&payload) {
                    if let Err(e) = self
                        .client
                        .publish(&self.snapshot_topic, QoS::AtMostOnce, false, json.as_bytes())
                        .await
                    {
                        debug!(error = %e, "telemetry_snapshot_failed");
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_payload_serialization() {
        let payload = SnapshotPayload {
            site: "roomctl".to_string(),
            ts: 1234567890,
            people: 7,
            temperature: 22,
            tier: ClimateTier::Mid,
        };

        let json = serde_json::to_string(&payload).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["site"], "roomctl");
        assert_eq!(parsed["people"], 7);
        assert_eq!(parsed["temperature"], 22);
        assert_eq!(parsed["tier"], "mid");
    }

    #[tokio::test]
    async fn test_sender_enqueues_messages() {
        let (sender, mut rx) = create_telemetry_channel(10, "test".to_string());

        sender.send_people_count(3);
        sender.send_temperature(24);
        sender.send_snapshot(3, 24);

        assert!(matches!(rx.recv().await, Some(TelemetryMessage::PeopleCount(3))));
        assert!(matches!(rx.recv().await, Some(TelemetryMessage::Temperature(24))));
        match rx.recv().await {
            Some(TelemetryMessage::Snapshot(payload)) => {
                assert_eq!(payload.site, "test");
                assert_eq!(payload.tier, ClimateTier::Low);
            }
            other => panic!("expected snapshot, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_full_channel_drops_instead_of_blocking() {
        let (sender, _rx) = create_telemetry_channel(1, "test".to_string());

        sender.send_people_count(1);
        // Channel is full; this must not block the control loop
        sender.send_people_count(2);
    }
}
