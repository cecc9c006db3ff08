// MQTT intake
//
// Connects to the broker, subscribes at QoS 0, and hands each publish
// payload to the dispatcher. rumqttc reconnects on the next `poll` after
// a connection error; the subscription is re-issued on every ConnAck
// because sessions are clean.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use tracing::{debug, info, warn};

use aptag_core::{MessageSource, SubscriptionConfig};

use crate::error::CliError;

const KEEP_ALIVE: Duration = Duration::from_secs(30);
const RECONNECT_DELAY: Duration = Duration::from_secs(5);
const REQUEST_CAPACITY: usize = 64;

pub struct MqttSource {
    client: AsyncClient,
    eventloop: EventLoop,
    topic: String,
}

impl MqttSource {
    /// Connect and subscribe. Fails if the first connection attempt does.
    pub async fn connect(settings: &SubscriptionConfig) -> Result<Self, CliError> {
        let mut options = MqttOptions::new(&settings.client_id, &settings.broker, settings.port);
        options.set_keep_alive(KEEP_ALIVE);
        options.set_clean_session(true);

        let (client, mut eventloop) = AsyncClient::new(options, REQUEST_CAPACITY);
        let fail = |source: Box<dyn std::error::Error + Send + Sync>| CliError::Mqtt {
            broker: format!("{}:{}", settings.broker, settings.port),
            client_id: settings.client_id.clone(),
            source,
        };

        loop {
            match eventloop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                    debug!(code = ?ack.code, "connected to broker");
                    break;
                }
                Ok(_) => {}
                Err(e) => return Err(fail(Box::new(e))),
            }
        }

        client
            .subscribe(&settings.topic, QoS::AtMostOnce)
            .await
            .map_err(|e| fail(Box::new(e)))?;
        info!(
            broker = %settings.broker,
            port = settings.port,
            topic = %settings.topic,
            "subscribed"
        );

        Ok(Self {
            client,
            eventloop,
            topic: settings.topic.clone(),
        })
    }
}

#[async_trait]
impl MessageSource for MqttSource {
    async fn next_message(&mut self) -> Option<Bytes> {
        loop {
            match self.eventloop.poll().await {
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    debug!(topic = %publish.topic, bytes = publish.payload.len(), "publish received");
                    return Some(publish.payload);
                }
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    info!(topic = %self.topic, "reconnected to broker, resubscribing");
                    if let Err(e) = self.client.try_subscribe(&self.topic, QoS::AtMostOnce) {
                        warn!(error = %e, "resubscribe failed");
                    }
                }
                Ok(Event::Incoming(Packet::SubAck(ack))) => {
                    debug!(pkid = ack.pkid, "subscription acknowledged");
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(error = %e, "MQTT connection lost, retrying");
                    tokio::time::sleep(RECONNECT_DELAY).await;
                }
            }
        }
    }
}
