//! Notification events for contract changes
//!
//! Downstream systems (provisioning, monitoring) follow contract changes
//! through broker messages. All contract and item changes travel on the
//! `contracts` exchange keyed by contract number; item changes are nested
//! under their contract so consumers see one message shape.
//!
//! Field names on the wire differ from the internal ones where consumers
//! predate this system: duration fields carry an explicit `_months`
//! suffix, relation fields carry a `_number` suffix.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::contract::Contract;
use crate::contract_item::ContractItem;

/// Exchange carrying all contract traffic
pub const CONTRACTS_EXCHANGE: &str = "contracts";

/// A change notification, ready for the broker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ContractEvent {
    ContractCreated { number: u32, payload: Value },
    ContractUpdated { number: u32, payload: Value },
    ContractDeleted { number: u32 },
    /// Item creations and updates both travel as contract updates
    ItemChanged { contract: u32, payload: Value },
    ItemDeleted { contract: u32, item: u32 },
}

impl ContractEvent {
    /// Source tag in the message envelope
    pub fn source(&self) -> &'static str {
        match self {
            ContractEvent::ContractCreated { .. }
            | ContractEvent::ContractUpdated { .. }
            | ContractEvent::ContractDeleted { .. } => "contract",
            ContractEvent::ItemChanged { .. } | ContractEvent::ItemDeleted { .. } => {
                "contract.item"
            }
        }
    }

    /// Message type in the envelope; item changes are always updates
    pub fn message_type(&self) -> &'static str {
        match self {
            ContractEvent::ContractCreated { .. } => "create",
            ContractEvent::ContractDeleted { .. } => "delete",
            _ => "update",
        }
    }

    /// The wire payload
    pub fn payload(&self) -> Value {
        match self {
            ContractEvent::ContractCreated { payload, .. }
            | ContractEvent::ContractUpdated { payload, .. } => payload.clone(),
            ContractEvent::ContractDeleted { number } => json!({ "number": number }),
            ContractEvent::ItemChanged { contract, payload } => {
                json!({ "number": contract, "items": [payload] })
            }
            ContractEvent::ItemDeleted { contract, item } => {
                json!({ "number": contract, "items": [{ "number": item, "deleted": true }] })
            }
        }
    }

    pub fn contract_number(&self) -> u32 {
        match self {
            ContractEvent::ContractCreated { number, .. }
            | ContractEvent::ContractUpdated { number, .. }
            | ContractEvent::ContractDeleted { number } => *number,
            ContractEvent::ItemChanged { contract, .. }
            | ContractEvent::ItemDeleted { contract, .. } => *contract,
        }
    }
}

/// Builds the announced field set for a contract
///
/// The customer number comes from the billing side and is passed in by
/// the caller; it is omitted when unknown.
pub fn contract_snapshot(
    contract: &Contract,
    today: NaiveDate,
    customer_number: Option<u32>,
) -> Value {
    let mut payload = json!({
        "number": contract.number(),
        "name": contract.name,
        "order_date": contract.order_date,
        "termination_date": contract.termination_date,
        "valid_from": contract.validity.from,
        "valid_till": contract.validity.till,
        "order_reference": contract.order_reference,
        "ready_for_service": contract.ready_for_service,
        "comment": contract.comment,
        "next_cancelation_date": contract.next_cancelation_date(today),
        "next_possible_contract_end": contract.next_possible_end(today),
        "minimum_duration_months": contract.term.minimum_duration_months,
        "notice_period_months": contract.term.notice_period_months,
        "automatic_extension_months": contract.term.automatic_extension_months,
    });
    if let Some(number) = customer_number {
        payload["customer_number"] = json!(number);
    }
    payload
}

/// Builds the announced field set for an item
pub fn item_snapshot(item: &ContractItem, successor: Option<u32>) -> Value {
    json!({
        "number": item.number(),
        "product_code": item.product_code,
        "product_name": item.product_name,
        "product_description": item.product_description,
        "valid_from": item.valid_from,
        "valid_till": item.valid_till,
        "termination_date": item.termination_date,
        "order_reference": item.order_reference,
        "price_recurring": item.price_recurring,
        "price_setup": item.price_setup,
        "billing_type": item.billing_type,
        "paused": item.paused,
        "archived": item.archived,
        "ready_for_service": item.ready_for_service,
        "predecessor_number": item.predecessor,
        "successor_number": successor,
        "parent_number": item.parent_item,
        "minimum_duration_months": item.minimum_duration_months,
        "notice_period_months": item.notice_period_months,
        "accounting_period_months": item.accounting_period.months(),
    })
}
