//! JSON request/response boundary.
//!
//! Transport-agnostic: each handler takes a raw body or path value and returns
//! a status code with a JSON body. Every error body has the shape
//! `{"error": "..."}` and never carries internal account ids.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{error, info, warn};

use minibank_common::{AccountId, AccountNumber, TransferRequest};
use minibank_ledger::{LedgerError, LedgerStore, NewAccount, TransferEngine};

use crate::seed::{credit_account, seed_demo_account};

/// Error body for a request that could not be decoded.
pub const INVALID_PAYLOAD: &str = "invalid request payload";

/// HTTP status for success.
pub const STATUS_OK: u16 = 200;

/// HTTP status for any rejected request.
pub const STATUS_BAD_REQUEST: u16 = 400;

const STATUS_INTERNAL_ERROR: u16 = 500;

/// Error body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
}

/// Status code and JSON body produced by a handler.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    /// 200 with `value` as the body.
    pub fn ok<T: Serialize>(value: &T) -> Self {
        match serde_json::to_value(value) {
            Ok(body) => Self {
                status: STATUS_OK,
                body,
            },
            Err(e) => {
                error!(error = %e, "Failed to serialize response");
                Self::error(STATUS_INTERNAL_ERROR, "internal error")
            }
        }
    }

    /// 400 with an error body.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::error(STATUS_BAD_REQUEST, message)
    }

    fn error(status: u16, message: impl Into<String>) -> Self {
        let body = ApiError {
            error: message.into(),
        };
        Self {
            status,
            body: json!(body),
        }
    }

    /// Check if the status is 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Body of an account creation request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountRequest {
    pub first_name: String,
    pub last_name: String,
}

/// Decode a transfer request and run it through the engine.
pub async fn handle_transfer<S: LedgerStore>(
    engine: &TransferEngine<S>,
    body: &str,
) -> ApiResponse {
    let request: TransferRequest = match serde_json::from_str(body) {
        Ok(request) => request,
        Err(e) => {
            warn!(error = %e, "Malformed transfer request");
            return ApiResponse::bad_request(INVALID_PAYLOAD);
        }
    };

    match engine.execute(request).await {
        Ok(receipt) => ApiResponse::ok(&receipt),
        Err(e) => ApiResponse::bad_request(e.to_string()),
    }
}

/// Create an account with a random number and zero balance.
pub async fn handle_create_account<S: LedgerStore>(store: &S, body: &str) -> ApiResponse {
    let request: CreateAccountRequest = match serde_json::from_str(body) {
        Ok(request) => request,
        Err(e) => {
            warn!(error = %e, "Malformed account request");
            return ApiResponse::bad_request(INVALID_PAYLOAD);
        }
    };

    match store
        .create_account(NewAccount::new(request.first_name, request.last_name))
        .await
    {
        Ok(account) => {
            info!(number = %account.number, "Account created");
            ApiResponse::ok(&account)
        }
        Err(e) => ledger_failure(e),
    }
}

/// Fetch an account by id.
pub async fn handle_get_account<S: LedgerStore>(store: &S, id: AccountId) -> ApiResponse {
    match store.get_account_by_id(id).await {
        Ok(account) => ApiResponse::ok(&account),
        Err(e) => ledger_failure(e),
    }
}

/// Delete an account by id.
pub async fn handle_delete_account<S: LedgerStore>(store: &S, id: AccountId) -> ApiResponse {
    match store.delete_account(id).await {
        Ok(true) => ApiResponse::ok(&json!({ "deleted": id })),
        Ok(false) => ledger_failure(LedgerError::AccountNotFound(id)),
        Err(e) => ledger_failure(e),
    }
}

/// Create the demo account with its opening balance.
pub async fn handle_seed<S: LedgerStore>(store: &S) -> ApiResponse {
    match seed_demo_account(store).await {
        Ok(account) => ApiResponse::ok(&account),
        Err(e) => ledger_failure(e),
    }
}

/// Credit an account by number.
pub async fn handle_deposit<S: LedgerStore>(
    store: &S,
    number: AccountNumber,
    amount: f64,
) -> ApiResponse {
    match credit_account(store, number, amount).await {
        Ok(account) => ApiResponse::ok(&account),
        Err(e) => ledger_failure(e),
    }
}

/// 400 carrying the caller-safe text of a store error.
pub fn ledger_failure(err: LedgerError) -> ApiResponse {
    warn!(error = %err, "Ledger request failed");
    ApiResponse::bad_request(err.public_message())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use minibank_common::{AccountNumber, MinorUnits};
    use minibank_ledger::{Fault, MemoryLedgerStore};

    async fn engine() -> TransferEngine<MemoryLedgerStore> {
        let store = Arc::new(MemoryLedgerStore::new());
        for (number, balance) in [(1001, 100000), (1002, 5000)] {
            store
                .create_account(
                    NewAccount::new("Test", "Holder")
                        .with_number(number)
                        .with_balance(MinorUnits::new(balance)),
                )
                .await
                .unwrap();
        }
        TransferEngine::new(store)
    }

    #[tokio::test]
    async fn test_transfer_success() {
        let engine = engine().await;

        let response = handle_transfer(
            &engine,
            r#"{"fromAccount":1001,"toAccount":1002,"amount":250.00}"#,
        )
        .await;

        assert_eq!(response.status, STATUS_OK);
        assert_eq!(response.body["status"], "success");
        assert_eq!(response.body["fromAccount"], 1001);
        assert_eq!(response.body["toAccount"], 1002);
        assert_eq!(response.body["amount"], 250.0);
        assert_eq!(
            engine.store().balance_of(AccountNumber::new(1002)),
            Some(MinorUnits::new(30000))
        );
    }

    #[tokio::test]
    async fn test_malformed_payload() {
        let engine = engine().await;

        for body in [
            "not json",
            r#"{"fromAccount":1001}"#,
            r#"{"fromAccount":"1001","toAccount":1002,"amount":1}"#,
        ] {
            let response = handle_transfer(&engine, body).await;
            assert_eq!(response.status, STATUS_BAD_REQUEST);
            assert_eq!(response.body, json!({ "error": INVALID_PAYLOAD }));
        }
        assert_eq!(engine.metrics().snapshot().transfers_total, 0);
    }

    #[tokio::test]
    async fn test_engine_error_is_bad_request() {
        let engine = engine().await;

        let response = handle_transfer(
            &engine,
            r#"{"fromAccount":1002,"toAccount":1001,"amount":100.00}"#,
        )
        .await;

        assert_eq!(response.status, STATUS_BAD_REQUEST);
        assert_eq!(
            response.body["error"],
            "insufficient balance: required 100.00, available 50.00"
        );
    }

    #[tokio::test]
    async fn test_failure_body_hides_ids() {
        let engine = engine().await;
        let destination = engine
            .store()
            .get_account_by_number(AccountNumber::new(1002))
            .await
            .unwrap();
        engine.store().inject_fault(Fault::UpdateBalance(destination.id));

        let response = handle_transfer(
            &engine,
            r#"{"fromAccount":1001,"toAccount":1002,"amount":1}"#,
        )
        .await;

        assert_eq!(response.status, STATUS_BAD_REQUEST);
        let message = response.body["error"].as_str().unwrap();
        assert!(message.contains("1002"));
        assert!(!message.contains("AccountId"));
    }

    #[tokio::test]
    async fn test_account_lifecycle() {
        let store = MemoryLedgerStore::new();

        let body = r#"{"firstName":"Transfer","lastName":"Test"}"#;
        let created = handle_create_account(&store, body).await;
        assert!(created.is_success());
        assert_eq!(created.body["first_name"], "Transfer");
        assert_eq!(created.body["balance"], 0);

        let id = AccountId::new(created.body["id"].as_i64().unwrap() as i32);
        let fetched = handle_get_account(&store, id).await;
        assert_eq!(fetched.body, created.body);

        let deleted = handle_delete_account(&store, id).await;
        assert_eq!(deleted.body, json!({ "deleted": id.get() }));

        let missing = handle_get_account(&store, id).await;
        assert_eq!(missing.status, STATUS_BAD_REQUEST);
        assert_eq!(missing.body["error"], "account no longer exists");

        let again = handle_delete_account(&store, id).await;
        assert_eq!(again.status, STATUS_BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_create_account_malformed() {
        let store = MemoryLedgerStore::new();
        let response = handle_create_account(&store, r#"{"firstName":"Only"}"#).await;
        assert_eq!(response.status, STATUS_BAD_REQUEST);
        assert!(store.accounts().is_empty());
    }

    #[tokio::test]
    async fn test_seed_and_deposit() {
        let store = MemoryLedgerStore::new();

        let seeded = handle_seed(&store).await;
        assert!(seeded.is_success());
        assert_eq!(seeded.body["balance"], 100000);

        let number = AccountNumber::new(seeded.body["account_number"].as_i64().unwrap());
        let deposited = handle_deposit(&store, number, 12.34).await;
        assert_eq!(deposited.status, STATUS_OK);
        assert_eq!(deposited.body["balance"], 101234);
    }

    #[tokio::test]
    async fn test_deposit_failure_is_bad_request() {
        let store = MemoryLedgerStore::new();

        let missing = handle_deposit(&store, AccountNumber::new(42), 10.0).await;
        assert_eq!(missing.status, STATUS_BAD_REQUEST);
        assert_eq!(missing.body, json!({ "error": "account no longer exists" }));

        let account = store
            .create_account(NewAccount::new("A", "B").with_number(7))
            .await
            .unwrap();
        let id = account.id;
        store.inject_fault(Fault::UpdateBalance(id));

        let failed = handle_deposit(&store, account.number, 10.0).await;
        assert_eq!(failed.status, STATUS_BAD_REQUEST);
        assert_eq!(failed.body, json!({ "error": "injected fault" }));
        assert!(!failed.body.to_string().contains(&format!("{:?}", id)));
        assert_eq!(store.balance_of(account.number), Some(MinorUnits::ZERO));
    }

    #[tokio::test]
    async fn test_seed_failure_is_bad_request() {
        let store = MemoryLedgerStore::new();
        store.inject_fault(Fault::Begin);

        let response = handle_seed(&store).await;
        assert_eq!(response.status, STATUS_BAD_REQUEST);
        assert!(response.body["error"].is_string());
    }
}
