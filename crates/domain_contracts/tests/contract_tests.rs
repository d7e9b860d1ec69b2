//! Contract lifecycle integration tests

use chrono::{NaiveDate, Utc};
use core_kernel::audit::Actor;
use core_kernel::oplog::OperationalLog;
use core_kernel::temporal::TermPolicy;
use core_kernel::{BookingAccountId, Currency, Money};
use domain_contracts::{
    run_extensions, AccountingPeriod, Contract, ContractDirectory, ContractError, ContractItem,
    ServiceStatus,
};
use rust_decimal_macros::dec;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn eur(amount: rust_decimal::Decimal) -> Money {
    Money::new(amount, Currency::EUR)
}

fn contract(valid_from: NaiveDate, term: TermPolicy) -> Contract {
    Contract::new(
        0,
        BookingAccountId::new(),
        "Colocation Rack 42",
        valid_from,
        term,
        Actor::System,
        Utc::now(),
    )
}

fn item(contract_number: u32) -> ContractItem {
    let mut item = ContractItem::new(
        0,
        contract_number,
        "COLO-1",
        "Colocation full rack",
        AccountingPeriod::MONTHLY,
        Actor::System,
        Utc::now(),
    );
    item.price_recurring = Some(eur(dec!(199.00)));
    item
}

mod lifecycle {
    use super::*;

    #[test]
    fn test_new_contract_is_in_delivery_until_documented() {
        let mut dir = ContractDirectory::new();
        let today = d(2024, 1, 15);
        let number = dir
            .insert_contract(contract(d(2024, 1, 1), TermPolicy::default()), today)
            .unwrap();

        assert_eq!(
            dir.contract(number).unwrap().status(today),
            ServiceStatus::InDelivery
        );

        dir.contract_mut(number).unwrap().ready_for_service =
            Some("https://docs.example/rfs/1".into());
        assert_eq!(
            dir.contract(number).unwrap().status(today),
            ServiceStatus::Active
        );
    }

    #[test]
    fn test_item_inherits_contract_validity() {
        let mut dir = ContractDirectory::new();
        let today = d(2024, 6, 1);
        let number = dir
            .insert_contract(contract(d(2024, 1, 1), TermPolicy::default()), today)
            .unwrap();
        let item_number = dir.insert_item(item(number)).unwrap();

        let c = dir.contract(number).unwrap();
        let i = dir.item(item_number).unwrap();
        assert!(i.is_valid_on(c, d(2024, 6, 1)));
        assert!(!i.is_valid_on(c, d(2023, 12, 31)));
    }

    #[test]
    fn test_creation_emits_events_for_contract_and_items() {
        let mut dir = ContractDirectory::new();
        let today = d(2024, 1, 1);
        let number = dir
            .insert_contract(contract(d(2024, 1, 1), TermPolicy::default()), today)
            .unwrap();
        dir.insert_item(item(number)).unwrap();

        let events = dir.take_events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].message_type(), "create");
        assert_eq!(events[0].source(), "contract");
        assert_eq!(events[1].message_type(), "update");
        assert_eq!(events[1].source(), "contract.item");
        assert_eq!(events[1].contract_number(), number);
    }
}

mod cancelation {
    use super::*;

    #[test]
    fn test_cancel_respects_notice_period() {
        let mut dir = ContractDirectory::new();
        let today = d(2024, 6, 1);
        let number = dir
            .insert_contract(contract(d(2022, 9, 7), TermPolicy::new(1, 3, 12)), today)
            .unwrap();

        let till = dir
            .cancel_contract(number, today, None, Actor::user("clerk"), Utc::now())
            .unwrap();

        assert_eq!(till, d(2024, 10, 31));
        let c = dir.contract(number).unwrap();
        assert_eq!(c.termination_date, Some(today));
        assert_eq!(c.validity.till, Some(till));
    }

    #[test]
    fn test_cancel_after_deadline_costs_one_more_period() {
        let mut dir = ContractDirectory::new();
        let today = d(2024, 8, 15);
        let number = dir
            .insert_contract(contract(d(2022, 9, 7), TermPolicy::new(1, 3, 12)), today)
            .unwrap();

        let till = dir
            .cancel_contract(number, today, None, Actor::user("clerk"), Utc::now())
            .unwrap();
        assert_eq!(till, d(2025, 10, 31));
    }

    #[test]
    fn test_cancel_error_names_the_earliest_date() {
        let mut dir = ContractDirectory::new();
        let today = d(2024, 1, 1);
        let number = dir
            .insert_contract(contract(d(2022, 9, 7), TermPolicy::new(1, 3, 12)), today)
            .unwrap();

        let err = dir
            .cancel_contract(
                number,
                today,
                Some(d(2024, 3, 31)),
                Actor::user("clerk"),
                Utc::now(),
            )
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Termination date must be on or after 2024-10-31, not 2024-03-31"
        );
    }

    #[test]
    fn test_item_cancel_under_contract_term() {
        let mut dir = ContractDirectory::new();
        let today = d(2024, 6, 1);
        let number = dir
            .insert_contract(contract(d(2022, 9, 7), TermPolicy::new(1, 3, 12)), today)
            .unwrap();
        let mut billed = item(number);
        billed.next_invoice = Some(d(2025, 1, 1));
        let item_number = dir.insert_item(billed).unwrap();

        let till = dir
            .cancel_item(item_number, today, None, Actor::user("clerk"), Utc::now())
            .unwrap();

        assert_eq!(till, d(2024, 10, 31));
        let i = dir.item(item_number).unwrap();
        assert_eq!(i.valid_till, Some(till));
        // The pending invoice date lay past the new end and was dropped.
        assert_eq!(i.next_invoice, None);
    }

    #[test]
    fn test_item_cancel_rejects_early_dates() {
        let mut dir = ContractDirectory::new();
        let today = d(2024, 1, 1);
        let number = dir
            .insert_contract(contract(d(2022, 9, 7), TermPolicy::new(1, 3, 12)), today)
            .unwrap();
        let item_number = dir.insert_item(item(number)).unwrap();

        let result = dir.cancel_item(
            item_number,
            today,
            Some(d(2024, 2, 29)),
            Actor::user("clerk"),
            Utc::now(),
        );
        assert!(matches!(result, Err(ContractError::CancelTooEarly { .. })));
        assert!(dir.item(item_number).unwrap().valid_till.is_none());
    }
}

mod billing_selection {
    use super::*;

    #[test]
    fn test_due_items_follow_pause_state() {
        let mut dir = ContractDirectory::new();
        let today = d(2024, 6, 15);
        let mut c = contract(d(2024, 1, 1), TermPolicy::default());
        c.ready_for_service = Some("https://docs.example/rfs/1".into());
        let number = dir.insert_contract(c, today).unwrap();

        let mut due = item(number);
        due.next_invoice = Some(d(2024, 6, 1));
        let item_number = dir.insert_item(due).unwrap();

        assert_eq!(dir.due_items(today), vec![item_number]);

        dir.pause_contract(number, Actor::user("clerk"), Utc::now())
            .unwrap();
        assert!(dir.due_items(today).is_empty());

        dir.unpause_contract(number, Actor::user("clerk"), Utc::now())
            .unwrap();
        assert_eq!(dir.due_items(today), vec![item_number]);
    }

    #[test]
    fn test_item_rfs_is_enough_without_contract_rfs() {
        let mut dir = ContractDirectory::new();
        let today = d(2024, 6, 15);
        let number = dir
            .insert_contract(contract(d(2024, 1, 1), TermPolicy::default()), today)
            .unwrap();

        let mut due = item(number);
        due.next_invoice = Some(d(2024, 6, 1));
        due.ready_for_service = Some("https://docs.example/rfs/10".into());
        let item_number = dir.insert_item(due).unwrap();

        assert_eq!(dir.due_items(today), vec![item_number]);
    }

    #[test]
    fn test_cancelation_removes_items_from_due_selection() {
        let mut dir = ContractDirectory::new();
        let today = d(2024, 6, 1);
        let mut c = contract(d(2022, 9, 7), TermPolicy::new(1, 3, 12));
        c.ready_for_service = Some("https://docs.example/rfs/1".into());
        let number = dir.insert_contract(c, today).unwrap();

        let mut due = item(number);
        due.next_invoice = Some(d(2025, 1, 1));
        let item_number = dir.insert_item(due).unwrap();

        dir.cancel_contract(number, today, None, Actor::System, Utc::now())
            .unwrap();

        // The contract ends 2024-10-31, the pending date was 2025-01-01.
        assert_eq!(dir.item(item_number).unwrap().next_invoice, None);
        assert!(dir.due_items(d(2025, 1, 15)).is_empty());
    }
}

mod extensions {
    use super::*;

    #[test]
    fn test_extension_then_cancel_round_trip() {
        let mut dir = ContractDirectory::new();
        let mut oplog = OperationalLog::new();
        let mut c = contract(d(2022, 9, 7), TermPolicy::new(1, 3, 12));
        c.validity.till = Some(d(2024, 10, 31));
        let number = dir.insert_contract(c, d(2024, 1, 1)).unwrap();

        // Past the 2024-07-31 deadline the stored end is no longer
        // reachable and gets pushed a year out.
        let report = run_extensions(
            &mut dir,
            d(2024, 9, 1),
            false,
            Actor::System,
            Utc::now(),
            &mut oplog,
        );
        assert_eq!(report.contracts_extended, 1);
        assert_eq!(
            dir.contract(number).unwrap().validity.till,
            Some(d(2025, 10, 31))
        );

        // A cancelation now lands on the extended end.
        let till = dir
            .cancel_contract(number, d(2024, 9, 2), None, Actor::System, Utc::now())
            .unwrap();
        assert_eq!(till, d(2025, 10, 31));

        // Terminated contracts stay put on later runs.
        let after = run_extensions(
            &mut dir,
            d(2025, 9, 1),
            false,
            Actor::System,
            Utc::now(),
            &mut oplog,
        );
        assert_eq!(after.contracts_extended, 0);
    }

    #[test]
    fn test_extension_run_writes_the_operational_log() {
        let mut dir = ContractDirectory::new();
        let mut oplog = OperationalLog::new();

        run_extensions(
            &mut dir,
            d(2024, 9, 1),
            false,
            Actor::System,
            Utc::now(),
            &mut oplog,
        );

        assert_eq!(oplog.len(), 2);
        assert!(oplog.entries()[0].message.contains("starting"));
        assert!(oplog.entries()[1].message.contains("finished"));
    }
}
