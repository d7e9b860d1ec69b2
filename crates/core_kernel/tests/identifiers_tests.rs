//! Unit tests for the Identifiers module
//!
//! Tests cover identifier creation, parsing, conversion,
//! and display formatting.

use core_kernel::{
    BookingAccountId, ContractId, ContractItemId, CustomerId, InvoiceId, InvoiceItemId,
    LogEntryId, MandateId,
};
use uuid::Uuid;

mod contract_id_tests {
    use super::*;

    #[test]
    fn test_new_generates_unique_ids() {
        let id1 = ContractId::new();
        let id2 = ContractId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_new_v7_generates_time_ordered_ids() {
        let id1 = ContractId::new_v7();
        std::thread::sleep(std::time::Duration::from_millis(1));
        let id2 = ContractId::new_v7();
        let uuid1: Uuid = id1.into();
        let uuid2: Uuid = id2.into();
        assert!(uuid1 < uuid2);
    }

    #[test]
    fn test_from_uuid() {
        let uuid = Uuid::new_v4();
        let id = ContractId::from_uuid(uuid);
        assert_eq!(*id.as_uuid(), uuid);
    }

    #[test]
    fn test_prefix() {
        assert_eq!(ContractId::prefix(), "CTR");
    }

    #[test]
    fn test_display_format() {
        let id = ContractId::new();
        let display = id.to_string();
        assert!(display.starts_with("CTR-"));
    }

    #[test]
    fn test_from_str_with_prefix() {
        let original = ContractId::new();
        let string = original.to_string();
        let parsed: ContractId = string.parse().unwrap();
        assert_eq!(original, parsed);
    }

    #[test]
    fn test_json_serialization() {
        let id = ContractId::new();
        let json = serde_json::to_string(&id).unwrap();
        let deserialized: ContractId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, deserialized);
    }
}

mod customer_id_tests {
    use super::*;

    #[test]
    fn test_new_generates_unique_ids() {
        let id1 = CustomerId::new();
        let id2 = CustomerId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_prefix() {
        assert_eq!(CustomerId::prefix(), "CUS");
    }

    #[test]
    fn test_roundtrip() {
        let original = CustomerId::new();
        let string = original.to_string();
        let parsed: CustomerId = string.parse().unwrap();
        assert_eq!(original, parsed);
    }
}

mod invoice_id_tests {
    use super::*;

    #[test]
    fn test_new_generates_unique_ids() {
        let id1 = InvoiceId::new();
        let id2 = InvoiceId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_display_format() {
        let id = InvoiceId::new();
        let display = id.to_string();
        assert!(display.starts_with("INV-"));
    }
}

mod cross_type_tests {
    use super::*;

    #[test]
    fn test_different_id_types_are_distinct() {
        // Same UUID should create different identifier instances
        // that are type-safe (can't mix ContractId with InvoiceId)
        let uuid = Uuid::new_v4();
        let contract_id = ContractId::from_uuid(uuid);
        let invoice_id = InvoiceId::from_uuid(uuid);

        // They contain the same UUID but are different types
        assert_eq!(*contract_id.as_uuid(), *invoice_id.as_uuid());
    }

    #[test]
    fn test_id_prefixes_are_unique() {
        let prefixes = vec![
            CustomerId::prefix(),
            ContractId::prefix(),
            ContractItemId::prefix(),
            BookingAccountId::prefix(),
            MandateId::prefix(),
            InvoiceId::prefix(),
            InvoiceItemId::prefix(),
            LogEntryId::prefix(),
        ];

        let mut unique_prefixes: Vec<&str> = prefixes.clone();
        unique_prefixes.sort();
        unique_prefixes.dedup();

        assert_eq!(
            prefixes.len(),
            unique_prefixes.len(),
            "All identifier prefixes should be unique"
        );
    }
}

mod edge_cases {
    use super::*;

    #[test]
    fn test_nil_uuid() {
        let nil_uuid = Uuid::nil();
        let id = ContractId::from_uuid(nil_uuid);
        assert!(id.as_uuid().is_nil());
    }

    #[test]
    fn test_max_uuid() {
        let max_uuid = Uuid::max();
        let id = ContractId::from_uuid(max_uuid);
        assert_eq!(*id.as_uuid(), max_uuid);
    }
}
