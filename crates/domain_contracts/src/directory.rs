//! In-memory contract directory
//!
//! Contracts and items live in arenas keyed by their business numbers;
//! relations between items are stored as optional numbers, not references.
//! Number assignment is max-plus-one over everything ever issued, so a
//! deleted record's number is never reused. Assignment is serialized by
//! the `&mut self` access to the directory.
//!
//! Mutations made through directory methods push notification events;
//! callers drain them with [`ContractDirectory::take_events`] and hand
//! them to the notification sink.

use chrono::{DateTime, NaiveDate, Utc};
use core_kernel::audit::Actor;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::contract::Contract;
use crate::contract_item::ContractItem;
use crate::error::ContractError;
use crate::events::{contract_snapshot, item_snapshot, ContractEvent};

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ContractDirectory {
    contracts: BTreeMap<u32, Contract>,
    items: BTreeMap<u32, ContractItem>,
    /// Highest contract number ever issued, including deleted ones
    contract_high_water: u32,
    /// Highest item number ever issued
    item_high_water: u32,
    #[serde(skip)]
    events: Vec<ContractEvent>,
}

impl ContractDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a contract, assigning the next free number when none is set
    ///
    /// Explicit nonzero numbers are honored (imports) but must be unused.
    pub fn insert_contract(
        &mut self,
        mut contract: Contract,
        today: NaiveDate,
    ) -> Result<u32, ContractError> {
        let number = match contract.number() {
            0 => self.contract_high_water + 1,
            explicit => {
                if self.contracts.contains_key(&explicit) {
                    return Err(ContractError::DuplicateNumber(explicit));
                }
                explicit
            }
        };
        contract.set_number(number);
        self.contract_high_water = self.contract_high_water.max(number);

        let mut payload = contract_snapshot(&contract, today, None);
        payload["items"] = serde_json::Value::Array(vec![]);
        self.events
            .push(ContractEvent::ContractCreated { number, payload });
        self.contracts.insert(number, contract);
        Ok(number)
    }

    /// Adds an item to an existing contract
    pub fn insert_item(&mut self, mut item: ContractItem) -> Result<u32, ContractError> {
        let contract = self
            .contracts
            .get(&item.contract)
            .ok_or(ContractError::ContractNotFound(item.contract))?;
        item.validate(contract)?;

        let number = match item.number() {
            0 => self.item_high_water + 1,
            explicit => {
                if self.items.contains_key(&explicit) {
                    return Err(ContractError::DuplicateNumber(explicit));
                }
                explicit
            }
        };
        item.set_number(number);
        self.item_high_water = self.item_high_water.max(number);

        self.events.push(ContractEvent::ItemChanged {
            contract: item.contract,
            payload: item_snapshot(&item, None),
        });
        self.items.insert(number, item);
        Ok(number)
    }

    pub fn contract(&self, number: u32) -> Option<&Contract> {
        self.contracts.get(&number)
    }

    pub fn contract_mut(&mut self, number: u32) -> Option<&mut Contract> {
        self.contracts.get_mut(&number)
    }

    pub fn item(&self, number: u32) -> Option<&ContractItem> {
        self.items.get(&number)
    }

    pub fn item_mut(&mut self, number: u32) -> Option<&mut ContractItem> {
        self.items.get_mut(&number)
    }

    pub fn contracts(&self) -> impl Iterator<Item = &Contract> {
        self.contracts.values()
    }

    pub fn items(&self) -> impl Iterator<Item = &ContractItem> {
        self.items.values()
    }

    pub fn contract_numbers(&self) -> Vec<u32> {
        self.contracts.keys().copied().collect()
    }

    pub fn item_numbers(&self) -> Vec<u32> {
        self.items.keys().copied().collect()
    }

    /// Items of a contract, in number order
    pub fn items_of(&self, contract_number: u32) -> impl Iterator<Item = &ContractItem> {
        self.items
            .values()
            .filter(move |item| item.contract == contract_number)
    }

    /// The item that replaced the given one, if any
    pub fn successor_of(&self, item_number: u32) -> Option<&ContractItem> {
        self.items
            .values()
            .find(|item| item.predecessor == Some(item_number))
    }

    /// Items nested under the given one
    pub fn children_of(&self, item_number: u32) -> impl Iterator<Item = &ContractItem> {
        self.items
            .values()
            .filter(move |item| item.parent_item == Some(item_number))
    }

    /// Cancels a contract and applies the billing side effects to its items
    ///
    /// Items without an own end date stop being billable at the new
    /// contract end, so pending invoice dates at or past it are cleared.
    pub fn cancel_contract(
        &mut self,
        number: u32,
        today: NaiveDate,
        date: Option<NaiveDate>,
        actor: Actor,
        now: DateTime<Utc>,
    ) -> Result<NaiveDate, ContractError> {
        let contract = self
            .contracts
            .get_mut(&number)
            .ok_or(ContractError::ContractNotFound(number))?;
        let new_till = contract.cancel(today, date, actor.clone(), now)?;
        let payload = contract_snapshot(contract, today, None);

        for item in self.items.values_mut().filter(|i| i.contract == number) {
            if item.valid_till.is_none()
                && item.next_invoice.map_or(false, |next| next >= new_till)
            {
                item.next_invoice = None;
                item.audit.touch(actor.clone(), now);
            }
        }

        self.events
            .push(ContractEvent::ContractUpdated { number, payload });
        Ok(new_till)
    }

    /// Cancels a single item under its contract's term rules
    pub fn cancel_item(
        &mut self,
        number: u32,
        today: NaiveDate,
        date: Option<NaiveDate>,
        actor: Actor,
        now: DateTime<Utc>,
    ) -> Result<NaiveDate, ContractError> {
        let contract_number = self
            .items
            .get(&number)
            .map(|item| item.contract)
            .ok_or(ContractError::ItemNotFound(number))?;
        let contract = self
            .contracts
            .get(&contract_number)
            .cloned()
            .ok_or(ContractError::ContractNotFound(contract_number))?;

        let item = self
            .items
            .get_mut(&number)
            .ok_or(ContractError::ItemNotFound(number))?;
        let new_till = item.cancel(&contract, today, date, actor, now)?;
        self.events.push(ContractEvent::ItemChanged {
            contract: item.contract,
            payload: item_snapshot(item, None),
        });
        Ok(new_till)
    }

    /// Pauses billing for every item of a contract
    pub fn pause_contract(
        &mut self,
        number: u32,
        actor: Actor,
        now: DateTime<Utc>,
    ) -> Result<(), ContractError> {
        self.set_contract_paused(number, true, actor, now)
    }

    /// Resumes billing for every item of a contract
    pub fn unpause_contract(
        &mut self,
        number: u32,
        actor: Actor,
        now: DateTime<Utc>,
    ) -> Result<(), ContractError> {
        self.set_contract_paused(number, false, actor, now)
    }

    fn set_contract_paused(
        &mut self,
        number: u32,
        paused: bool,
        actor: Actor,
        now: DateTime<Utc>,
    ) -> Result<(), ContractError> {
        if !self.contracts.contains_key(&number) {
            return Err(ContractError::ContractNotFound(number));
        }
        let mut changed = Vec::new();
        for item in self.items.values_mut().filter(|i| i.contract == number) {
            if item.paused != paused {
                item.paused = paused;
                item.audit.touch(actor.clone(), now);
                changed.push(item_snapshot(item, None));
            }
        }
        for payload in changed {
            self.events.push(ContractEvent::ItemChanged {
                contract: number,
                payload,
            });
        }
        Ok(())
    }

    /// Items due for invoicing as of the cutoff date
    ///
    /// Live (ready-for-service on the item or its contract), not paused,
    /// not archived, valid on the cutoff per the own-or-inherited
    /// interval, and carrying a pending invoice date at or before it.
    /// The invoice-history filter is applied by the billing engine, which
    /// owns that data.
    pub fn due_items(&self, as_of: NaiveDate) -> Vec<u32> {
        self.items
            .values()
            .filter(|item| {
                let Some(contract) = self.contracts.get(&item.contract) else {
                    return false;
                };
                let live = item.ready_for_service.is_some()
                    || contract.ready_for_service.is_some();
                live && !item.paused
                    && !item.archived
                    && item.next_invoice.map_or(false, |next| next <= as_of)
                    && item.is_valid_on(contract, as_of)
            })
            .map(|item| item.number())
            .collect()
    }

    /// Drains the accumulated notification events
    pub fn take_events(&mut self) -> Vec<ContractEvent> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn push_event(&mut self, event: ContractEvent) {
        self.events.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract_item::AccountingPeriod;
    use core_kernel::temporal::TermPolicy;
    use core_kernel::BookingAccountId;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn new_contract(name: &str) -> Contract {
        Contract::new(
            0,
            BookingAccountId::new(),
            name,
            d(2024, 1, 1),
            TermPolicy::new(1, 3, 12),
            Actor::System,
            Utc::now(),
        )
    }

    fn new_item(contract: u32) -> ContractItem {
        ContractItem::new(
            0,
            contract,
            "COLO-1",
            "Colocation",
            AccountingPeriod::MONTHLY,
            Actor::System,
            Utc::now(),
        )
    }

    #[test]
    fn test_numbers_are_assigned_monotonically() {
        let mut dir = ContractDirectory::new();
        let a = dir.insert_contract(new_contract("A"), d(2024, 1, 1)).unwrap();
        let b = dir.insert_contract(new_contract("B"), d(2024, 1, 1)).unwrap();
        assert_eq!(a, 1);
        assert_eq!(b, 2);
    }

    #[test]
    fn test_explicit_numbers_raise_the_high_water_mark() {
        let mut dir = ContractDirectory::new();
        let mut imported = new_contract("Imported");
        imported.set_number(500);
        dir.insert_contract(imported, d(2024, 1, 1)).unwrap();

        let next = dir.insert_contract(new_contract("New"), d(2024, 1, 1)).unwrap();
        assert_eq!(next, 501);
    }

    #[test]
    fn test_duplicate_numbers_are_rejected() {
        let mut dir = ContractDirectory::new();
        let mut first = new_contract("First");
        first.set_number(7);
        dir.insert_contract(first, d(2024, 1, 1)).unwrap();

        let mut second = new_contract("Second");
        second.set_number(7);
        assert!(matches!(
            dir.insert_contract(second, d(2024, 1, 1)),
            Err(ContractError::DuplicateNumber(7))
        ));
    }

    #[test]
    fn test_item_requires_existing_contract() {
        let mut dir = ContractDirectory::new();
        assert!(matches!(
            dir.insert_item(new_item(99)),
            Err(ContractError::ContractNotFound(99))
        ));
    }

    #[test]
    fn test_relation_lookups() {
        let mut dir = ContractDirectory::new();
        let c = dir.insert_contract(new_contract("C"), d(2024, 1, 1)).unwrap();
        let parent = dir.insert_item(new_item(c)).unwrap();

        let mut child = new_item(c);
        child.parent_item = Some(parent);
        let child_number = dir.insert_item(child).unwrap();

        let mut replacement = new_item(c);
        replacement.predecessor = Some(parent);
        let replacement_number = dir.insert_item(replacement).unwrap();

        assert_eq!(
            dir.children_of(parent).map(|i| i.number()).collect::<Vec<_>>(),
            vec![child_number]
        );
        assert_eq!(dir.successor_of(parent).unwrap().number(), replacement_number);
        assert_eq!(dir.items_of(c).count(), 3);
    }

    #[test]
    fn test_pause_cascades_to_items() {
        let mut dir = ContractDirectory::new();
        let c = dir.insert_contract(new_contract("C"), d(2024, 1, 1)).unwrap();
        dir.insert_item(new_item(c)).unwrap();
        dir.insert_item(new_item(c)).unwrap();

        dir.pause_contract(c, Actor::System, Utc::now()).unwrap();
        assert!(dir.items_of(c).all(|i| i.paused));

        dir.unpause_contract(c, Actor::System, Utc::now()).unwrap();
        assert!(dir.items_of(c).all(|i| !i.paused));
    }

    #[test]
    fn test_cancel_contract_clears_moot_item_invoice_dates() {
        let mut dir = ContractDirectory::new();
        let c = dir.insert_contract(new_contract("C"), d(2024, 1, 1)).unwrap();

        let mut open_ended = new_item(c);
        open_ended.next_invoice = Some(d(2026, 1, 1));
        let open_number = dir.insert_item(open_ended).unwrap();

        let mut own_till = new_item(c);
        own_till.valid_till = Some(d(2024, 6, 30));
        own_till.next_invoice = Some(d(2026, 1, 1));
        let own_number = dir.insert_item(own_till).unwrap();

        let till = dir
            .cancel_contract(c, d(2024, 6, 1), None, Actor::System, Utc::now())
            .unwrap();
        assert_eq!(till, d(2025, 1, 31));

        // Inherited-interval items lose their pending invoice date.
        assert_eq!(dir.item(open_number).unwrap().next_invoice, None);
        // Items with an own end keep theirs.
        assert_eq!(
            dir.item(own_number).unwrap().next_invoice,
            Some(d(2026, 1, 1))
        );
    }

    #[test]
    fn test_due_items_selection() {
        let mut dir = ContractDirectory::new();
        let mut contract = new_contract("C");
        contract.ready_for_service = Some("https://docs.example/rfs".into());
        let c = dir.insert_contract(contract, d(2024, 1, 1)).unwrap();

        let mut due = new_item(c);
        due.next_invoice = Some(d(2024, 6, 1));
        let due_number = dir.insert_item(due).unwrap();

        let mut not_yet = new_item(c);
        not_yet.next_invoice = Some(d(2024, 7, 1));
        dir.insert_item(not_yet).unwrap();

        let mut paused = new_item(c);
        paused.next_invoice = Some(d(2024, 6, 1));
        paused.paused = true;
        dir.insert_item(paused).unwrap();

        let mut archived = new_item(c);
        archived.next_invoice = Some(d(2024, 6, 1));
        archived.archived = true;
        dir.insert_item(archived).unwrap();

        let mut billed_out = new_item(c);
        billed_out.next_invoice = None;
        dir.insert_item(billed_out).unwrap();

        let mut expired = new_item(c);
        expired.next_invoice = Some(d(2024, 6, 1));
        expired.valid_till = Some(d(2024, 5, 31));
        dir.insert_item(expired).unwrap();

        assert_eq!(dir.due_items(d(2024, 6, 15)), vec![due_number]);
    }

    #[test]
    fn test_events_are_drained_once() {
        let mut dir = ContractDirectory::new();
        let c = dir.insert_contract(new_contract("C"), d(2024, 1, 1)).unwrap();
        dir.insert_item(new_item(c)).unwrap();

        let events = dir.take_events();
        assert_eq!(events.len(), 2);
        assert!(dir.take_events().is_empty());
    }
}
