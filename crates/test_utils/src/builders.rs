//! Test Data Builders
//!
//! Provides builder patterns for constructing domain entities with sensible
//! defaults. These builders allow tests to specify only the relevant fields
//! while using defaults for everything else.

use chrono::{NaiveDate, Utc};
use core_kernel::audit::Actor;
use core_kernel::temporal::TermPolicy;
use core_kernel::{BookingAccountId, Money};
use domain_billing::{BookingAccount, InvoiceFormat, PaymentMethod, SepaMandate, TaxOption};
use domain_contracts::{AccountingPeriod, BillingType, Contract, ContractItem};
use domain_party::Customer;
use serde_json::Value;

use crate::fixtures::{CrmFixtures, MoneyFixtures, TemporalFixtures};

/// Builder for constructing test customers
pub struct CustomerBuilder {
    number: u32,
    name: Option<String>,
    crm_snapshot: Option<Value>,
}

impl Default for CustomerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CustomerBuilder {
    /// Creates a new builder with default values
    pub fn new() -> Self {
        Self {
            number: 1001,
            name: None,
            crm_snapshot: None,
        }
    }

    /// Sets the customer number
    pub fn with_number(mut self, number: u32) -> Self {
        self.number = number;
        self
    }

    /// Sets the display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the cached CRM contact record
    pub fn with_crm_snapshot(mut self, snapshot: Value) -> Self {
        self.crm_snapshot = Some(snapshot);
        self
    }

    /// Applies the standard complete CRM contact record
    pub fn with_standard_address(self) -> Self {
        self.with_crm_snapshot(CrmFixtures::contact_record())
    }

    /// Builds the customer
    pub fn build(self) -> Customer {
        let mut customer = Customer::new(self.number, self.name, Actor::System, Utc::now());
        if let Some(snapshot) = self.crm_snapshot {
            customer.apply_crm_snapshot(snapshot, Actor::System, Utc::now());
        }
        customer
    }
}

/// Builder for constructing test booking accounts
pub struct BookingAccountBuilder {
    customer: u32,
    payment_method: PaymentMethod,
    invoice_format: InvoiceFormat,
    invoice_delivery_email: bool,
    invoice_delivery_post: bool,
    tax_option: TaxOption,
    address_email: Option<String>,
    address_company: Option<String>,
    address_street: Option<String>,
    address_zip_code: Option<String>,
    address_city: Option<String>,
    sepa: Option<SepaMandate>,
}

impl Default for BookingAccountBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl BookingAccountBuilder {
    /// Creates a new builder with default values
    pub fn new() -> Self {
        Self {
            customer: 1001,
            payment_method: PaymentMethod::Invoice,
            invoice_format: InvoiceFormat::Zugferd,
            invoice_delivery_email: true,
            invoice_delivery_post: false,
            tax_option: TaxOption::Standard,
            address_email: Some("billing@acme.example".to_string()),
            address_company: Some("ACME GmbH".to_string()),
            address_street: Some("Hauptstrasse 12".to_string()),
            address_zip_code: Some("10115".to_string()),
            address_city: Some("Berlin".to_string()),
            sepa: None,
        }
    }

    /// Sets the owning customer number
    pub fn with_customer(mut self, number: u32) -> Self {
        self.customer = number;
        self
    }

    /// Sets the payment method
    pub fn with_payment_method(mut self, method: PaymentMethod) -> Self {
        self.payment_method = method;
        self
    }

    /// Sets the invoice format
    pub fn with_invoice_format(mut self, format: InvoiceFormat) -> Self {
        self.invoice_format = format;
        self
    }

    /// Sets the delivery channels
    pub fn with_delivery(mut self, email: bool, post: bool) -> Self {
        self.invoice_delivery_email = email;
        self.invoice_delivery_post = post;
        self
    }

    /// Sets the tax option
    pub fn with_tax_option(mut self, option: TaxOption) -> Self {
        self.tax_option = option;
        self
    }

    /// Sets the billing mail recipients
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.address_email = Some(email.into());
        self
    }

    /// Sets the SEPA mandate
    pub fn with_mandate(mut self, mandate: SepaMandate) -> Self {
        self.sepa = Some(mandate);
        self
    }

    /// Switches to SEPA payment with a complete, signed mandate
    pub fn paying_by_sepa(self) -> Self {
        let mut mandate = SepaMandate::new(
            "ACME GmbH",
            "Sparkasse Berlin",
            "BELADEBEXXX",
            "DE02120300000000202051",
            "GW-1001",
        );
        mandate.address_street = "Hauptstrasse 12".to_string();
        mandate.address_zip_code = "10115".to_string();
        mandate.address_city = "Berlin".to_string();
        mandate.signed = Some(TemporalFixtures::mandate_signed());
        self.with_payment_method(PaymentMethod::Sepa)
            .with_mandate(mandate)
    }

    /// Builds the booking account
    pub fn build(self) -> BookingAccount {
        let mut account = BookingAccount::new(self.customer, Actor::System, Utc::now());
        account.payment_method = self.payment_method;
        account.invoice_format = self.invoice_format;
        account.invoice_delivery_email = self.invoice_delivery_email;
        account.invoice_delivery_post = self.invoice_delivery_post;
        account.tax_option = self.tax_option;
        account.address_email = self.address_email;
        account.address_company = self.address_company;
        account.address_street = self.address_street;
        account.address_zip_code = self.address_zip_code;
        account.address_city = self.address_city;
        account.sepa = self.sepa;
        account
    }
}

/// Builder for constructing test contracts
pub struct ContractBuilder {
    number: u32,
    booking_account: BookingAccountId,
    name: String,
    valid_from: NaiveDate,
    term: TermPolicy,
    ready_for_service: Option<String>,
    collective_invoice: bool,
}

impl Default for ContractBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ContractBuilder {
    /// Creates a new builder with default values
    ///
    /// The contract starts mid-month with the standard term and is already
    /// ready for service, so items become billable without further setup.
    pub fn new() -> Self {
        Self {
            number: 0,
            booking_account: BookingAccountId::new_v7(),
            name: "Colocation Berlin".to_string(),
            valid_from: TemporalFixtures::contract_start(),
            term: TemporalFixtures::standard_term(),
            ready_for_service: Some("rfs-2024-001.pdf".to_string()),
            collective_invoice: true,
        }
    }

    /// Sets the contract number; zero lets the directory assign one
    pub fn with_number(mut self, number: u32) -> Self {
        self.number = number;
        self
    }

    /// Sets the owning booking account
    pub fn with_booking_account(mut self, id: BookingAccountId) -> Self {
        self.booking_account = id;
        self
    }

    /// Sets the contract name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the validity start
    pub fn with_valid_from(mut self, date: NaiveDate) -> Self {
        self.valid_from = date;
        self
    }

    /// Sets the term policy
    pub fn with_term(mut self, term: TermPolicy) -> Self {
        self.term = term;
        self
    }

    /// Clears the ready-for-service link, leaving the contract in delivery
    pub fn in_delivery(mut self) -> Self {
        self.ready_for_service = None;
        self
    }

    /// Sets whether items on one account are billed together
    pub fn with_collective_invoice(mut self, collective: bool) -> Self {
        self.collective_invoice = collective;
        self
    }

    /// Builds the contract
    pub fn build(self) -> Contract {
        let mut contract = Contract::new(
            self.number,
            self.booking_account,
            self.name,
            self.valid_from,
            self.term,
            Actor::System,
            Utc::now(),
        );
        contract.ready_for_service = self.ready_for_service;
        contract.collective_invoice = self.collective_invoice;
        contract
    }
}

/// Builder for constructing test contract items
pub struct ContractItemBuilder {
    number: u32,
    contract: u32,
    product_code: String,
    product_name: String,
    accounting_period: AccountingPeriod,
    billing_type: BillingType,
    price_recurring: Option<Money>,
    price_setup: Option<Money>,
    next_invoice: Option<NaiveDate>,
    valid_from: Option<NaiveDate>,
    valid_till: Option<NaiveDate>,
    paused: bool,
}

impl Default for ContractItemBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ContractItemBuilder {
    /// Creates a new builder with default values
    ///
    /// The item bills the standard rack price monthly and is due at the
    /// contract start, matching [`ContractBuilder`] defaults.
    pub fn new() -> Self {
        Self {
            number: 0,
            contract: 1,
            product_code: "COLO-RACK-42".to_string(),
            product_name: "Colocation full rack".to_string(),
            accounting_period: AccountingPeriod::MONTHLY,
            billing_type: BillingType::Recurring,
            price_recurring: Some(MoneyFixtures::eur_rack_price()),
            price_setup: None,
            next_invoice: Some(TemporalFixtures::contract_start()),
            valid_from: None,
            valid_till: None,
            paused: false,
        }
    }

    /// Sets the item number; zero lets the directory assign one
    pub fn with_number(mut self, number: u32) -> Self {
        self.number = number;
        self
    }

    /// Sets the owning contract number
    pub fn with_contract(mut self, number: u32) -> Self {
        self.contract = number;
        self
    }

    /// Sets the product code and name
    pub fn with_product(
        mut self,
        code: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        self.product_code = code.into();
        self.product_name = name.into();
        self
    }

    /// Sets the accounting period
    pub fn with_accounting_period(mut self, period: AccountingPeriod) -> Self {
        self.accounting_period = period;
        self
    }

    /// Sets the billing type
    pub fn with_billing_type(mut self, billing_type: BillingType) -> Self {
        self.billing_type = billing_type;
        self
    }

    /// Sets the recurring price
    pub fn with_price_recurring(mut self, price: Money) -> Self {
        self.price_recurring = Some(price);
        self
    }

    /// Sets the one-time setup price
    pub fn with_price_setup(mut self, price: Money) -> Self {
        self.price_setup = Some(price);
        self
    }

    /// Makes the item setup-only, with no recurring price
    pub fn setup_only(mut self, price: Money) -> Self {
        self.price_recurring = None;
        self.price_setup = Some(price);
        self
    }

    /// Sets the next billing date
    pub fn with_next_invoice(mut self, date: Option<NaiveDate>) -> Self {
        self.next_invoice = date;
        self
    }

    /// Sets an item-level validity window
    pub fn with_validity(mut self, from: Option<NaiveDate>, till: Option<NaiveDate>) -> Self {
        self.valid_from = from;
        self.valid_till = till;
        self
    }

    /// Starts the item paused
    pub fn paused(mut self) -> Self {
        self.paused = true;
        self
    }

    /// Builds the contract item
    pub fn build(self) -> ContractItem {
        let mut item = ContractItem::new(
            self.number,
            self.contract,
            self.product_code,
            self.product_name,
            self.accounting_period,
            Actor::System,
            Utc::now(),
        );
        item.billing_type = self.billing_type;
        item.price_recurring = self.price_recurring;
        item.price_setup = self.price_setup;
        item.next_invoice = self.next_invoice;
        item.valid_from = self.valid_from;
        item.valid_till = self.valid_till;
        item.paused = self.paused;
        item
    }
}
