//! Call-scoped event collection.
//!
//! Contracts emit typed events during execution; the logger JSON-serializes
//! each payload, tags it with the hash of the event's type name, and buffers
//! it in emission order. The emitting contract's address is stamped on the
//! buffered events later by the transaction driver, before indexing.

use crate::types::address::Address;
use crate::types::hash::Hash;
use serde::Serialize;

/// A typed event emittable by a built-in contract.
///
/// `NAME` is the event's declared type name; its SHA-256 hash is the event
/// selector used for ABI derivation and index lookups.
pub trait ContractEvent: Serialize {
    const NAME: &'static str;
}

/// A single emitted event: selector hash, emitting contract, JSON payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Event {
    pub hash: Hash,
    pub address: Address,
    pub value: Vec<u8>,
}

/// Buffer of events emitted during contract execution, in emission order.
#[derive(Default)]
pub struct EventLogger {
    events: Vec<Event>,
}

impl EventLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serializes and buffers an event.
    ///
    /// An event whose payload fails to serialize is dropped; emission never
    /// aborts the surrounding call.
    pub fn emit<E: ContractEvent>(&mut self, event: &E) {
        let Ok(value) = serde_json::to_vec(event) else {
            return;
        };
        self.events.push(Event {
            hash: Hash::sha256_of(E::NAME.as_bytes()),
            address: Address::zero(),
            value,
        });
    }

    /// Returns the buffered events in emission order.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Drains the buffer, returning the events in emission order.
    pub fn take(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vm::values::{CTypeAddress, CTypeUint256};

    #[derive(Serialize)]
    struct TestMintEvent {
        to: CTypeAddress,
        token_id: CTypeUint256,
    }

    impl ContractEvent for TestMintEvent {
        const NAME: &'static str = "TestMintEvent";
    }

    #[test]
    fn emit_tags_with_type_name_hash() {
        let mut logger = EventLogger::new();
        logger.emit(&TestMintEvent {
            to: CTypeAddress::zero(),
            token_id: CTypeUint256::from_u64(1),
        });

        let events = logger.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].hash, Hash::sha256_of(b"TestMintEvent"));
        assert!(events[0].address.is_zero());
    }

    #[test]
    fn payload_is_json() {
        let mut logger = EventLogger::new();
        logger.emit(&TestMintEvent {
            to: CTypeAddress::zero(),
            token_id: CTypeUint256::from_u64(7),
        });

        let value: serde_json::Value =
            serde_json::from_slice(&logger.events()[0].value).expect("json payload");
        assert!(value.get("to").is_some());
        assert!(value.get("token_id").is_some());
    }

    #[test]
    fn events_keep_emission_order() {
        let mut logger = EventLogger::new();
        for n in 0..3 {
            logger.emit(&TestMintEvent {
                to: CTypeAddress::zero(),
                token_id: CTypeUint256::from_u64(n),
            });
        }

        let ids: Vec<CTypeUint256> = logger
            .events()
            .iter()
            .map(|e| {
                let v: serde_json::Value = serde_json::from_slice(&e.value).expect("json");
                serde_json::from_value(v["token_id"].clone()).expect("token_id")
            })
            .collect();
        assert_eq!(
            ids,
            vec![
                CTypeUint256::from_u64(0),
                CTypeUint256::from_u64(1),
                CTypeUint256::from_u64(2)
            ]
        );
    }

    #[test]
    fn take_drains_the_buffer() {
        let mut logger = EventLogger::new();
        logger.emit(&TestMintEvent {
            to: CTypeAddress::zero(),
            token_id: CTypeUint256::from_u64(1),
        });

        let drained = logger.take();
        assert_eq!(drained.len(), 1);
        assert!(logger.events().is_empty());
    }
}
