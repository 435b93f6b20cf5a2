//! RabbitMQ transport over `lapin`.

use lapin::options::{
    BasicPublishOptions, ConfirmSelectOptions, ExchangeDeclareOptions, ExchangeDeleteOptions,
    QueueBindOptions, QueueDeclareOptions, QueueDeleteOptions,
};
use lapin::protocol::{AMQPErrorKind, AMQPSoftError};
use lapin::publisher_confirm::Confirmation;
use lapin::types::{AMQPValue, FieldTable, LongString, ShortString};
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties};
use tokio::sync::Mutex;

use crate::error::BrokerError;
use crate::messaging::topology::{
    ArgumentValue, Arguments, BindingSpec, ExchangeKind, ExchangeSpec, QueueSpec,
};
use crate::messaging::{BrokerChannel, BrokerConnector, OutgoingMessage};

const CONTENT_TYPE: &str = "application/json";
const PERSISTENT: u8 = 2;

/// Lazily connects to `uri` and reconnects when the connection dropped.
pub struct AmqpConnector {
    uri: String,
    connection: Mutex<Option<Connection>>,
}

impl AmqpConnector {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            connection: Mutex::new(None),
        }
    }

    async fn connect(&self) -> Result<Connection, BrokerError> {
        // The URI carries credentials; it is never logged.
        let connection = Connection::connect(&self.uri, ConnectionProperties::default())
            .await
            .map_err(|e| BrokerError::Unavailable(e.to_string()))?;
        tracing::info!("connected to broker");
        Ok(connection)
    }
}

impl BrokerConnector for AmqpConnector {
    type Channel = AmqpChannel;

    async fn open_channel(&self) -> Result<AmqpChannel, BrokerError> {
        let mut guard = self.connection.lock().await;
        let connection = match guard.take() {
            Some(conn) if conn.status().connected() => conn,
            _ => self.connect().await?,
        };
        let created = connection.create_channel().await;
        *guard = Some(connection);

        let channel = created.map_err(|e| classify(e, "create channel"))?;
        channel
            .confirm_select(ConfirmSelectOptions::default())
            .await
            .map_err(|e| classify(e, "enable publisher confirms"))?;
        Ok(AmqpChannel { channel })
    }
}

pub struct AmqpChannel {
    channel: Channel,
}

impl BrokerChannel for AmqpChannel {
    fn is_open(&self) -> bool {
        self.channel.status().connected()
    }

    async fn declare_exchange(&self, spec: &ExchangeSpec) -> Result<(), BrokerError> {
        let options = ExchangeDeclareOptions {
            durable: spec.durable,
            auto_delete: spec.auto_delete,
            ..Default::default()
        };
        self.channel
            .exchange_declare(
                &spec.name,
                exchange_kind(spec.kind),
                options,
                field_table(&spec.arguments),
            )
            .await
            .map_err(|e| classify(e, "declare exchange"))
    }

    async fn delete_exchange(&self, name: &str) -> Result<(), BrokerError> {
        self.channel
            .exchange_delete(name, ExchangeDeleteOptions::default())
            .await
            .map_err(|e| classify(e, "delete exchange"))
    }

    async fn declare_queue(&self, spec: &QueueSpec) -> Result<(), BrokerError> {
        let options = QueueDeclareOptions {
            durable: spec.durable,
            exclusive: spec.exclusive,
            auto_delete: spec.auto_delete,
            ..Default::default()
        };
        self.channel
            .queue_declare(&spec.name, options, field_table(&spec.arguments))
            .await
            .map(|_| ())
            .map_err(|e| classify(e, "declare queue"))
    }

    async fn delete_queue(&self, name: &str) -> Result<(), BrokerError> {
        self.channel
            .queue_delete(name, QueueDeleteOptions::default())
            .await
            .map(|_| ())
            .map_err(|e| classify(e, "delete queue"))
    }

    async fn bind_queue(&self, queue: &str, binding: &BindingSpec) -> Result<(), BrokerError> {
        self.channel
            .queue_bind(
                queue,
                &binding.exchange,
                &binding.routing_key,
                QueueBindOptions::default(),
                FieldTable::default(),
            )
            .await
            .map_err(|e| classify(e, "bind queue"))
    }

    async fn publish(&self, message: &OutgoingMessage) -> Result<(), BrokerError> {
        let mut properties = BasicProperties::default()
            .with_content_type(ShortString::from(CONTENT_TYPE))
            .with_delivery_mode(PERSISTENT);
        if let Some(id) = &message.message_id {
            properties = properties.with_message_id(ShortString::from(id.as_str()));
        }

        let confirm = self
            .channel
            .basic_publish(
                &message.exchange,
                &message.routing_key,
                BasicPublishOptions::default(),
                &message.payload,
                properties,
            )
            .await
            .map_err(|e| classify(e, "publish"))?;

        match confirm.await.map_err(|e| classify(e, "await confirm"))? {
            Confirmation::Nack(_) => Err(BrokerError::Transport(anyhow::anyhow!(
                "broker nacked message on exchange `{}`",
                message.exchange
            ))),
            _ => Ok(()),
        }
    }
}

fn exchange_kind(kind: ExchangeKind) -> lapin::ExchangeKind {
    match kind {
        ExchangeKind::Direct => lapin::ExchangeKind::Direct,
        ExchangeKind::Fanout => lapin::ExchangeKind::Fanout,
        ExchangeKind::Topic => lapin::ExchangeKind::Topic,
        ExchangeKind::Headers => lapin::ExchangeKind::Headers,
    }
}

fn field_table(arguments: &Arguments) -> FieldTable {
    let mut table = FieldTable::default();
    for (key, value) in arguments {
        let value = match value {
            ArgumentValue::Bool(b) => AMQPValue::Boolean(*b),
            ArgumentValue::Int(i) => AMQPValue::LongLongInt(*i),
            ArgumentValue::Str(s) => AMQPValue::LongString(LongString::from(s.as_str())),
        };
        table.insert(ShortString::from(key.as_str()), value);
    }
    table
}

fn classify(err: lapin::Error, context: &'static str) -> BrokerError {
    match &err {
        lapin::Error::ProtocolError(amqp)
            if matches!(
                amqp.kind(),
                AMQPErrorKind::Soft(AMQPSoftError::PRECONDITIONFAILED)
            ) =>
        {
            BrokerError::PreconditionFailed(amqp.get_message().as_str().to_owned())
        }
        lapin::Error::InvalidChannelState(_) => BrokerError::ChannelClosed,
        lapin::Error::InvalidConnectionState(_) => BrokerError::Unavailable(err.to_string()),
        _ => BrokerError::Transport(anyhow::Error::new(err).context(context)),
    }
}
