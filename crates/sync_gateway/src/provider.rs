//! Invoicing provider gateway
//!
//! The provider owns contact records, invoice numbering, document
//! rendering, and SEPA payment filing. This module wraps its HTTP API
//! behind [`BillingProviderPort`] and keeps the local sync state machine
//! honest: Pending while a push is in flight, reverted on failure so the
//! next sweep retries, Synced with the provider id and snapshot on
//! success.

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};
use core_kernel::ports::{DomainPort, PortError, RetryPolicy, Syncable};
use domain_billing::{BookingAccount, Invoice, SepaSequence, TaxOption};
use domain_contracts::PaymentProfile;
use domain_party::Customer;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{info, warn};

/// Connection settings for the invoicing provider
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout_ms: u64,
    pub retry: RetryPolicy,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.invoicing.example".to_string(),
            api_key: String::new(),
            timeout_ms: 10_000,
            retry: RetryPolicy::default(),
        }
    }
}

/// Low-level transport to the provider API
///
/// Implemented over a real HTTP client in production and over canned
/// responses in tests.
#[async_trait]
pub trait ProviderTransport: DomainPort {
    async fn call(
        &self,
        method: &str,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, PortError>;

    /// Binary endpoint, used for rendered documents
    async fn call_raw(&self, method: &str, path: &str) -> Result<Vec<u8>, PortError>;
}

/// Result of finalizing an invoice at the provider
#[derive(Debug, Clone)]
pub struct InvoiceReceipt {
    pub provider_id: i64,
    pub number: u32,
    pub pdf: Vec<u8>,
}

/// High-level provider operations used by the sync sweeps
#[async_trait]
pub trait BillingProviderPort: DomainPort {
    /// Creates or updates a customer record; returns the provider id
    async fn push_customer(
        &self,
        provider_id: Option<i64>,
        payload: &Value,
    ) -> Result<i64, PortError>;

    /// Creates or updates a billing contact under a customer
    async fn push_contact(
        &self,
        customer_provider_id: i64,
        provider_id: Option<i64>,
        payload: &Value,
    ) -> Result<i64, PortError>;

    /// Uploads a draft, finalizes it, and fetches the rendered document
    async fn push_invoice(&self, payload: &Value) -> Result<InvoiceReceipt, PortError>;

    /// Files a SEPA debit for a finalized invoice
    async fn register_debit(&self, payload: &Value) -> Result<Value, PortError>;
}

/// [`BillingProviderPort`] implementation over a [`ProviderTransport`]
///
/// Transient failures are retried with bounded exponential backoff; an
/// explicit retry-after from a rate limit takes precedence over the
/// computed delay.
pub struct ProviderGateway<T: ProviderTransport> {
    transport: T,
    config: ProviderConfig,
}

impl<T: ProviderTransport> ProviderGateway<T> {
    pub fn new(transport: T, config: ProviderConfig) -> Self {
        Self { transport, config }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    async fn call_with_retry(
        &self,
        method: &str,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, PortError> {
        let mut attempt = 0;
        loop {
            match self.transport.call(method, path, body).await {
                Ok(response) => return Ok(response),
                Err(err) if err.is_transient() && attempt < self.config.retry.max_retries => {
                    let delay = match &err {
                        PortError::RateLimited { retry_after_secs } => {
                            Duration::from_secs(*retry_after_secs)
                        }
                        _ => self.config.retry.delay_for(attempt),
                    };
                    warn!(%err, attempt, path, "provider call failed, backing off");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn id_from(response: &Value) -> Result<i64, PortError> {
        response["id"].as_i64().ok_or_else(|| PortError::Transformation {
            message: "provider response carries no id".to_string(),
        })
    }
}

impl<T: ProviderTransport> DomainPort for ProviderGateway<T> {}

#[async_trait]
impl<T: ProviderTransport> BillingProviderPort for ProviderGateway<T> {
    async fn push_customer(
        &self,
        provider_id: Option<i64>,
        payload: &Value,
    ) -> Result<i64, PortError> {
        let (method, path) = match provider_id {
            Some(id) => ("PUT", format!("customers/{id}")),
            None => ("POST", "customers".to_string()),
        };
        let response = self.call_with_retry(method, &path, Some(payload)).await?;
        Self::id_from(&response)
    }

    async fn push_contact(
        &self,
        customer_provider_id: i64,
        provider_id: Option<i64>,
        payload: &Value,
    ) -> Result<i64, PortError> {
        let base = format!("customers/{customer_provider_id}/contacts");
        let (method, path) = match provider_id {
            Some(id) => ("PUT", format!("{base}/{id}")),
            None => ("POST", base),
        };
        let response = self.call_with_retry(method, &path, Some(payload)).await?;
        Self::id_from(&response)
    }

    async fn push_invoice(&self, payload: &Value) -> Result<InvoiceReceipt, PortError> {
        let draft = self.call_with_retry("POST", "documents", Some(payload)).await?;
        let provider_id = Self::id_from(&draft)?;

        let done = self
            .call_with_retry("PUT", &format!("documents/{provider_id}/done"), None)
            .await?;
        let number = done["number"].as_u64().and_then(|n| u32::try_from(n).ok()).ok_or_else(
            || PortError::Transformation {
                message: "finalized document carries no number".to_string(),
            },
        )?;

        let pdf = self
            .transport
            .call_raw("GET", &format!("documents/{provider_id}/pdf"))
            .await?;

        Ok(InvoiceReceipt {
            provider_id,
            number,
            pdf,
        })
    }

    async fn register_debit(&self, payload: &Value) -> Result<Value, PortError> {
        self.call_with_retry("POST", "sepa-payments", Some(payload))
            .await
    }
}

/// Push orchestration for the syncable entities
///
/// Every push follows the same shape: flip to Pending, call the
/// provider, complete or revert. Entities whose payload is still empty
/// are skipped without an error so sweeps stay quiet.
pub struct SyncService<P: BillingProviderPort> {
    provider: P,
}

impl<P: BillingProviderPort> SyncService<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Mirrors a customer into the provider
    pub async fn sync_customer(
        &self,
        customer: &mut Customer,
        now: DateTime<Utc>,
    ) -> Result<(), PortError> {
        let Some(payload) = customer.provider_payload() else {
            info!(customer = customer.number(), "empty customer payload, not pushing");
            return Ok(());
        };
        let prior = customer.sync_info_mut().begin_push()?;
        let provider_id = customer.sync_info().provider_id;
        match self.provider.push_customer(provider_id, &payload).await {
            Ok(id) => {
                customer.sync_info_mut().complete_push(id, payload, now);
                Ok(())
            }
            Err(err) => {
                customer.sync_info_mut().revert(prior);
                Err(err)
            }
        }
    }

    /// Mirrors a booking account as a contact under its synced customer
    pub async fn sync_account(
        &self,
        account: &mut BookingAccount,
        customer: &Customer,
        now: DateTime<Utc>,
    ) -> Result<(), PortError> {
        let Some(customer_provider_id) = customer.sync_info().provider_id else {
            return Err(PortError::validation(
                "customer is not synced yet, push the customer first",
            ));
        };
        let Some(payload) = account.provider_payload() else {
            info!(account = %account.id, "empty account payload, not pushing");
            return Ok(());
        };
        let prior = account.sync.begin_push()?;
        let provider_id = account.sync.provider_id;
        match self
            .provider
            .push_contact(customer_provider_id, provider_id, &payload)
            .await
        {
            Ok(id) => {
                account.sync.complete_push(id, payload, now);
                Ok(())
            }
            Err(err) => {
                account.sync.revert(prior);
                Err(err)
            }
        }
    }

    /// Pushes a drafted invoice for finalization
    ///
    /// Refuses invoices that already carry a number and unapproved ones.
    /// On success the invoice carries the provider number and document
    /// path, and for SEPA accounts a debit is filed against the mandate.
    pub async fn sync_invoice(
        &self,
        invoice: &mut Invoice,
        account: &mut BookingAccount,
        customer: &Customer,
        now: DateTime<Utc>,
    ) -> Result<InvoiceReceipt, PortError> {
        if let Some(number) = invoice.number {
            return Err(PortError::validation(format!(
                "invoice {number} already has a number, cannot push new data"
            )));
        }
        if !invoice.approved {
            return Err(PortError::validation(
                "invoice is not approved, resolve it before pushing",
            ));
        }
        let Some(contact_id) = account.sync.provider_id else {
            return Err(PortError::validation(
                "booking account is not synced yet, push the account first",
            ));
        };
        let Some(customer_id) = customer.sync_info().provider_id else {
            return Err(PortError::validation(
                "customer is not synced yet, push the customer first",
            ));
        };

        let mut payload = invoice.provider_payload();
        payload["contact_id"] = json!(contact_id);
        payload["customer_id"] = json!(customer_id);
        if account.tax_option != TaxOption::Standard {
            payload["vat_option"] = serde_json::to_value(account.tax_option)
                .map_err(|e| PortError::Transformation {
                    message: e.to_string(),
                })?;
        }
        if account.invoice_format == domain_billing::InvoiceFormat::XRechnung {
            payload["buyer_reference"] =
                json!(account.xrechnung_buyer_reference.clone().unwrap_or_default());
        }

        let prior = invoice.sync.begin_push()?;
        let receipt = match self.provider.push_invoice(&payload).await {
            Ok(receipt) => receipt,
            Err(err) => {
                invoice.sync.revert(prior);
                return Err(err);
            }
        };

        invoice.number = Some(receipt.number);
        invoice.document = Some(format!(
            "documents/{}/{}.pdf",
            invoice.date.year(),
            receipt.number
        ));
        invoice
            .sync
            .complete_push(receipt.provider_id, payload, now);

        self.file_debit(invoice, account, customer, now).await?;
        Ok(receipt)
    }

    async fn file_debit(
        &self,
        invoice: &mut Invoice,
        account: &mut BookingAccount,
        customer: &Customer,
        now: DateTime<Utc>,
    ) -> Result<(), PortError> {
        if !account.pays_by_sepa() || !invoice.total_gross.is_positive() {
            return Ok(());
        }
        let Some(mandate) = account.sepa.as_mut().filter(|m| m.is_valid()) else {
            return Ok(());
        };
        let Some(instructions) = mandate.debit_instructions() else {
            warn!(invoice = ?invoice.number, "mandate not signed, skipping debit");
            return Ok(());
        };

        let number = invoice.number.unwrap_or_default();
        let mut remittance = format!(
            "Invoice {number} dated {}, customer {}, mandate {}",
            invoice.date,
            customer.number(),
            mandate.reference
        );
        remittance.truncate(140);

        let mut payload = json!({
            "amount": invoice.total_gross.minor_units(),
            "document_id": invoice.sync.provider_id,
            "reference": number,
            "remittance_information": remittance,
            "type": "DEBIT",
        });
        if let (Some(map), Some(extra)) = (payload.as_object_mut(), instructions.as_object()) {
            for (k, v) in extra {
                map.insert(k.clone(), v.clone());
            }
        }

        let sequence = if mandate.sequence_type() == "FRST" {
            SepaSequence::First
        } else {
            SepaSequence::Recurring
        };
        self.provider.register_debit(&payload).await?;
        mandate.record_debit(now);
        invoice.sepa_transaction_type = Some(sequence);
        Ok(())
    }
}
