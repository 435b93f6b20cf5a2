use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

type DecodeFn = fn(&str) -> Result<Value, serde_json::Error>;

struct RegisteredEvent {
    routing_key: &'static str,
    decode: DecodeFn,
}

/// Maps event type tags to routing keys and typed decoders.
///
/// Built once at startup:
///
/// ```ignore
/// let registry = EventRegistry::new()
///     .register::<PetEvent>("PetReservedEvent", "pet.reserved.v1")
///     .register::<PetEvent>("PetAdoptedEvent", "pet.adopted.v1");
/// ```
#[derive(Default)]
pub struct EventRegistry {
    events: HashMap<&'static str, RegisteredEvent>,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `tag`, whose payloads decode as `E`. A later registration of
    /// the same tag replaces the earlier one.
    pub fn register<E>(mut self, tag: &'static str, routing_key: &'static str) -> Self
    where
        E: Serialize + DeserializeOwned,
    {
        self.events.insert(
            tag,
            RegisteredEvent {
                routing_key,
                decode: decode_as::<E>,
            },
        );
        self
    }

    pub fn routing_key(&self, tag: &str) -> Option<&'static str> {
        self.events.get(tag).map(|e| e.routing_key)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.events.contains_key(tag)
    }

    /// Decode `payload` through the type registered for `tag` and return its
    /// canonical JSON form. `None` when the tag is unknown.
    pub fn decode(&self, tag: &str, payload: &str) -> Option<Result<Value, serde_json::Error>> {
        self.events.get(tag).map(|e| (e.decode)(payload))
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

fn decode_as<E>(payload: &str) -> Result<Value, serde_json::Error>
where
    E: Serialize + DeserializeOwned,
{
    let event: E = serde_json::from_str(payload)?;
    serde_json::to_value(&event)
}
