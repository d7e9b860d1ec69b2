//! Automatic contract extension runner
//!
//! Terminated contracts keep their end date. Everything else with an
//! automatic extension period gets its end pushed to the next reachable
//! end once the current one is no longer reachable. Items with an own end
//! date follow the same rule against their contract's term policy.
//!
//! The runner is idempotent; running it twice on the same day changes
//! nothing the second time.

use chrono::{DateTime, NaiveDate, Utc};
use core_kernel::audit::Actor;
use core_kernel::oplog::OperationalLog;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::directory::ContractDirectory;
use crate::events::{contract_snapshot, item_snapshot, ContractEvent};

/// Outcome of one extension run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionReport {
    pub contracts_extended: usize,
    pub items_extended: usize,
    pub dry_run: bool,
}

/// Extends running contracts and items whose end dates have lapsed
pub fn run_extensions(
    directory: &mut ContractDirectory,
    today: NaiveDate,
    dry_run: bool,
    actor: Actor,
    now: DateTime<Utc>,
    oplog: &mut OperationalLog,
) -> ExtensionReport {
    oplog.info(
        actor.clone(),
        "extensions",
        format!("extension run starting, cutoff {today}, dry_run {dry_run}"),
    );

    let mut contracts_extended = 0;
    let mut items_extended = 0;
    let mut events = Vec::new();

    let contract_numbers: Vec<u32> = directory.contract_numbers();
    for number in contract_numbers {
        let Some(contract) = directory.contract_mut(number) else {
            continue;
        };
        if contract.term.automatic_extension_months == 0 || contract.is_terminated() {
            continue;
        }
        let Some(till) = contract.validity.till else {
            continue;
        };
        if till <= today {
            continue;
        }
        let next_end = contract.next_possible_end(today);
        if next_end <= till {
            continue;
        }
        info!(contract = number, from = %till, to = %next_end, "extending contract");
        contracts_extended += 1;
        if !dry_run {
            contract.validity.till = Some(next_end);
            contract.audit.touch(actor.clone(), now);
            events.push(ContractEvent::ContractUpdated {
                number,
                payload: contract_snapshot(contract, today, None),
            });
        }
    }

    let item_numbers: Vec<u32> = directory.item_numbers();
    for number in item_numbers {
        let Some(item) = directory.item(number) else {
            continue;
        };
        let Some(contract) = directory.contract(item.contract) else {
            continue;
        };
        if contract.term.automatic_extension_months == 0 || item.termination_date.is_some() {
            continue;
        }
        let Some(till) = item.valid_till else {
            continue;
        };
        if till <= today {
            continue;
        }
        let next_end = contract.next_possible_end(today);
        if next_end <= till {
            continue;
        }
        let contract_number = item.contract;
        info!(item = number, from = %till, to = %next_end, "extending item");
        items_extended += 1;
        if !dry_run {
            let Some(item) = directory.item_mut(number) else {
                continue;
            };
            item.valid_till = Some(next_end);
            item.audit.touch(actor.clone(), now);
            events.push(ContractEvent::ItemChanged {
                contract: contract_number,
                payload: item_snapshot(item, None),
            });
        }
    }

    for event in events {
        directory.push_event(event);
    }

    oplog.info(
        actor,
        "extensions",
        format!(
            "extension run finished, {contracts_extended} contracts and {items_extended} items extended"
        ),
    );

    ExtensionReport {
        contracts_extended,
        items_extended,
        dry_run,
    }
}
