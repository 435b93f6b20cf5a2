use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use petadopt_core::error::BrokerError;
use petadopt_core::messaging::{
    BindingSpec, BrokerChannel, BrokerConnector, ExchangeKind, ExchangeSpec, OutgoingMessage,
    QueueSpec,
};

type PublishFilter = Arc<dyn Fn(&OutgoingMessage) -> bool + Send + Sync>;

#[derive(Default)]
struct BrokerState {
    exchanges: BTreeMap<String, ExchangeSpec>,
    queues: BTreeMap<String, QueueSpec>,
    bindings: Vec<(String, BindingSpec)>,
    published: Vec<OutgoingMessage>,
    operations: Vec<String>,
    channels: Vec<Arc<AtomicBool>>,
    failing_connections: u32,
    failing_publishes: Option<PublishFilter>,
}

/// Broker that keeps its topology and every accepted message in memory.
///
/// Mirrors the AMQP behaviours the services rely on: redeclaring with other
/// properties fails with a precondition error and closes the channel, and a
/// closed channel rejects further calls.
#[derive(Clone, Default)]
pub struct InMemoryBroker {
    state: Arc<Mutex<BrokerState>>,
}

impl InMemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretend an exchange already exists, e.g. left over from an older deploy.
    pub fn seed_exchange(&self, spec: ExchangeSpec) {
        self.state
            .lock()
            .unwrap()
            .exchanges
            .insert(spec.name.clone(), spec);
    }

    pub fn seed_queue(&self, mut spec: QueueSpec) {
        spec.bindings.clear();
        self.state
            .lock()
            .unwrap()
            .queues
            .insert(spec.name.clone(), spec);
    }

    /// The next `attempts` calls to `open_channel` fail as if the broker were down.
    pub fn fail_connections(&self, attempts: u32) {
        self.state.lock().unwrap().failing_connections = attempts;
    }

    /// Reject every publish for which `filter` returns true.
    pub fn fail_publish_matching<F>(&self, filter: F)
    where
        F: Fn(&OutgoingMessage) -> bool + Send + Sync + 'static,
    {
        self.state.lock().unwrap().failing_publishes = Some(Arc::new(filter));
    }

    pub fn heal_publishes(&self) {
        self.state.lock().unwrap().failing_publishes = None;
    }

    /// Close every channel handed out so far.
    pub fn close_channels(&self) {
        for open in &self.state.lock().unwrap().channels {
            open.store(false, Ordering::SeqCst);
        }
    }

    pub fn exchange(&self, name: &str) -> Option<ExchangeSpec> {
        self.state.lock().unwrap().exchanges.get(name).cloned()
    }

    pub fn queue(&self, name: &str) -> Option<QueueSpec> {
        self.state.lock().unwrap().queues.get(name).cloned()
    }

    pub fn bindings(&self, queue: &str) -> Vec<BindingSpec> {
        self.state
            .lock()
            .unwrap()
            .bindings
            .iter()
            .filter(|(q, _)| q == queue)
            .map(|(_, b)| b.clone())
            .collect()
    }

    pub fn published(&self) -> Vec<OutgoingMessage> {
        self.state.lock().unwrap().published.clone()
    }

    /// Log of topology operations, e.g. `"declare_exchange pet.events"`.
    pub fn operations(&self) -> Vec<String> {
        self.state.lock().unwrap().operations.clone()
    }

    pub fn channels_opened(&self) -> usize {
        self.state.lock().unwrap().channels.len()
    }

    /// Published messages that the current bindings route to `queue`.
    pub fn messages_in(&self, queue: &str) -> Vec<OutgoingMessage> {
        let state = self.state.lock().unwrap();
        state
            .published
            .iter()
            .filter(|message| {
                let Some(exchange) = state.exchanges.get(&message.exchange) else {
                    return false;
                };
                state.bindings.iter().any(|(q, binding)| {
                    q == queue
                        && binding.exchange == message.exchange
                        && routes(exchange.kind, &binding.routing_key, &message.routing_key)
                })
            })
            .cloned()
            .collect()
    }
}

impl BrokerConnector for InMemoryBroker {
    type Channel = InMemoryChannel;

    async fn open_channel(&self) -> Result<InMemoryChannel, BrokerError> {
        let mut state = self.state.lock().unwrap();
        if state.failing_connections > 0 {
            state.failing_connections -= 1;
            return Err(BrokerError::Unavailable("connection refused".into()));
        }
        let open = Arc::new(AtomicBool::new(true));
        state.channels.push(Arc::clone(&open));
        state.operations.push("open_channel".into());
        Ok(InMemoryChannel {
            state: Arc::clone(&self.state),
            open,
        })
    }
}

pub struct InMemoryChannel {
    state: Arc<Mutex<BrokerState>>,
    open: Arc<AtomicBool>,
}

impl InMemoryChannel {
    fn guard(&self) -> Result<std::sync::MutexGuard<'_, BrokerState>, BrokerError> {
        if !self.is_open() {
            return Err(BrokerError::ChannelClosed);
        }
        Ok(self.state.lock().unwrap())
    }

    fn close_with(&self, error: BrokerError) -> BrokerError {
        self.open.store(false, Ordering::SeqCst);
        error
    }
}

impl BrokerChannel for InMemoryChannel {
    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    async fn declare_exchange(&self, spec: &ExchangeSpec) -> Result<(), BrokerError> {
        let mut state = self.guard()?;
        state
            .operations
            .push(format!("declare_exchange {}", spec.name));
        match state.exchanges.get(&spec.name) {
            Some(existing) if existing != spec => Err(self.close_with(
                BrokerError::PreconditionFailed(format!(
                    "inequivalent arguments for exchange '{}'",
                    spec.name
                )),
            )),
            Some(_) => Ok(()),
            None => {
                state.exchanges.insert(spec.name.clone(), spec.clone());
                Ok(())
            }
        }
    }

    async fn delete_exchange(&self, name: &str) -> Result<(), BrokerError> {
        let mut state = self.guard()?;
        state.operations.push(format!("delete_exchange {name}"));
        state.exchanges.remove(name);
        state.bindings.retain(|(_, b)| b.exchange != name);
        Ok(())
    }

    async fn declare_queue(&self, spec: &QueueSpec) -> Result<(), BrokerError> {
        let mut state = self.guard()?;
        state.operations.push(format!("declare_queue {}", spec.name));
        let desired = QueueSpec {
            bindings: Vec::new(),
            ..spec.clone()
        };
        match state.queues.get(&spec.name) {
            Some(existing) if *existing != desired => Err(self.close_with(
                BrokerError::PreconditionFailed(format!(
                    "inequivalent arguments for queue '{}'",
                    spec.name
                )),
            )),
            Some(_) => Ok(()),
            None => {
                state.queues.insert(spec.name.clone(), desired);
                Ok(())
            }
        }
    }

    async fn delete_queue(&self, name: &str) -> Result<(), BrokerError> {
        let mut state = self.guard()?;
        state.operations.push(format!("delete_queue {name}"));
        state.queues.remove(name);
        state.bindings.retain(|(q, _)| q != name);
        Ok(())
    }

    async fn bind_queue(&self, queue: &str, binding: &BindingSpec) -> Result<(), BrokerError> {
        let mut state = self.guard()?;
        state.operations.push(format!(
            "bind_queue {queue} {} {}",
            binding.exchange, binding.routing_key
        ));
        if !state.queues.contains_key(queue) || !state.exchanges.contains_key(&binding.exchange) {
            return Err(self.close_with(BrokerError::Transport(anyhow::anyhow!(
                "NOT_FOUND - cannot bind {queue} to {}",
                binding.exchange
            ))));
        }
        let entry = (queue.to_owned(), binding.clone());
        if !state.bindings.contains(&entry) {
            state.bindings.push(entry);
        }
        Ok(())
    }

    async fn publish(&self, message: &OutgoingMessage) -> Result<(), BrokerError> {
        let mut state = self.guard()?;
        if let Some(filter) = &state.failing_publishes {
            if filter(message) {
                return Err(BrokerError::Transport(anyhow::anyhow!(
                    "publish rejected by broker"
                )));
            }
        }
        if !state.exchanges.contains_key(&message.exchange) {
            return Err(self.close_with(BrokerError::Transport(anyhow::anyhow!(
                "NOT_FOUND - no exchange '{}'",
                message.exchange
            ))));
        }
        state.published.push(message.clone());
        Ok(())
    }
}

fn routes(kind: ExchangeKind, pattern: &str, routing_key: &str) -> bool {
    match kind {
        ExchangeKind::Fanout | ExchangeKind::Headers => true,
        ExchangeKind::Direct => pattern == routing_key,
        ExchangeKind::Topic => {
            let pattern: Vec<&str> = pattern.split('.').collect();
            let words: Vec<&str> = routing_key.split('.').collect();
            topic_matches(&pattern, &words)
        }
    }
}

fn topic_matches(pattern: &[&str], words: &[&str]) -> bool {
    match (pattern.split_first(), words.split_first()) {
        (None, None) => true,
        (Some((&"#", rest)), _) => {
            topic_matches(rest, words) || (!words.is_empty() && topic_matches(pattern, &words[1..]))
        }
        (Some((&p, rest)), Some((&w, tail))) => (p == "*" || p == w) && topic_matches(rest, tail),
        _ => false,
    }
}
