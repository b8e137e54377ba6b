use std::collections::BTreeMap;

pub const DEFAULT_EXCHANGE: &str = "notify";

/// A topic exchange; the only kind the writer declares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeSpec {
    pub name: String,
    pub durable: bool,
    pub auto_delete: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueSpec {
    pub name: String,
    pub durable: bool,
    pub auto_delete: bool,
    pub exclusive: bool,
}

impl QueueSpec {
    pub fn durable(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            durable: true,
            auto_delete: false,
            exclusive: false,
        }
    }
}

/// Exchange plus the routing-key to queue bindings declared under it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topology {
    pub exchange: ExchangeSpec,
    bindings: BTreeMap<String, QueueSpec>,
}

impl Topology {
    pub fn new(exchange_name: impl Into<String>) -> Self {
        Self {
            exchange: ExchangeSpec {
                name: exchange_name.into(),
                durable: true,
                auto_delete: false,
            },
            bindings: BTreeMap::new(),
        }
    }

    pub fn with_binding(mut self, routing_key: impl Into<String>, queue: QueueSpec) -> Self {
        self.bindings.insert(routing_key.into(), queue);
        self
    }

    /// The two notification queues every writer declares.
    pub fn notify(exchange_name: impl Into<String>) -> Self {
        Self::new(exchange_name)
            .with_binding("sys1.message", QueueSpec::durable("sys1.v1.messages"))
            .with_binding("sys2.message", QueueSpec::durable("sys2.v1.messages"))
    }

    /// Bindings in routing-key order.
    pub fn bindings(&self) -> impl Iterator<Item = (&str, &QueueSpec)> {
        self.bindings.iter().map(|(key, queue)| (key.as_str(), queue))
    }

    /// Queues a message published under `routing_key` would land in.
    pub fn destinations(&self, routing_key: &str) -> Vec<&str> {
        self.bindings
            .iter()
            .filter(|(pattern, _)| topic_matches(pattern, routing_key))
            .map(|(_, queue)| queue.name.as_str())
            .collect()
    }

    pub fn routes(&self, routing_key: &str) -> bool {
        !self.destinations(routing_key).is_empty()
    }
}

impl Default for Topology {
    fn default() -> Self {
        Self::notify(DEFAULT_EXCHANGE)
    }
}

/// AMQP topic matching: `*` is exactly one word, `#` is zero or more words.
pub fn topic_matches(pattern: &str, routing_key: &str) -> bool {
    let pattern: Vec<&str> = pattern.split('.').collect();
    let key: Vec<&str> = routing_key.split('.').collect();

    match_words(&pattern, &key)
}

fn match_words(pattern: &[&str], key: &[&str]) -> bool {
    match pattern.split_first() {
        None => key.is_empty(),
        Some((&"#", rest)) => (0..=key.len()).any(|skip| match_words(rest, &key[skip..])),
        Some((&word, rest)) => match key.split_first() {
            Some((&head, tail)) => (word == "*" || word == head) && match_words(rest, tail),
            None => false,
        },
    }
}
