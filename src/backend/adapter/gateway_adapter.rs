// src/backend/adapter/gateway_adapter.rs
// Client for the virtual-account bank gateway. The gateway issues a bank
// account number unique to one payment session and reports whether the
// matching transfer has arrived.
use crate::error::TuitionError;
use crate::models::common::Amount;
use crate::storage::config::get_settings;
use crate::utils::log;
use candid::{CandidType, Nat};
use ic_cdk::api::management_canister::http_request::{
    http_request, CanisterHttpRequestArgument, HttpHeader, HttpMethod,
};
use serde::{Deserialize, Serialize};

const ALLOCATE_PATH: &str = "/v1/virtual_accounts";
const STATUS_PATH: &str = "/v1/virtual_accounts/status";

const HTTP_OUTCALL_CYCLES: u128 = 100_000_000;
const MAX_RESPONSE_BYTES: u64 = 8 * 1024;

#[derive(CandidType, Serialize, Deserialize, Debug, Clone)]
pub struct AllocateRequest {
    pub reference: String,
    pub amount: Amount,
    pub currency: String,
}

/// Gateway-issued account the learner transfers into.
#[derive(CandidType, Serialize, Deserialize, Debug, Clone)]
pub struct VirtualAccount {
    pub account_number: String,
    pub bank_name: String,
}

#[derive(CandidType, Serialize, Deserialize, Debug, Clone)]
pub struct StatusRequest {
    pub reference: String,
}

#[derive(CandidType, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum GatewayPollStatus {
    Pending,
    Success,
    Failed,
}

#[derive(CandidType, Serialize, Deserialize, Debug, Clone)]
pub struct StatusResponse {
    pub reference: String,
    pub status: GatewayPollStatus,
}

/// Asks the gateway for a virtual account bound to `reference`.
pub async fn allocate_virtual_account(
    reference: &str,
    amount: Amount,
    currency: &str,
) -> Result<VirtualAccount, TuitionError> {
    let req = AllocateRequest {
        reference: reference.to_string(),
        amount,
        currency: currency.to_string(),
    };
    let body = serde_json::to_vec(&req).map_err(|e| {
        TuitionError::SerializationError(format!("Failed to serialize AllocateRequest: {}", e))
    })?;

    let response = call_gateway(ALLOCATE_PATH, body).await?;
    serde_json::from_slice::<VirtualAccount>(&response).map_err(|e| {
        TuitionError::SerializationError(format!("Failed to deserialize VirtualAccount: {}", e))
    })
}

/// Polls the gateway for the session's transfer status.
pub async fn poll_status(reference: &str) -> Result<GatewayPollStatus, TuitionError> {
    let req = StatusRequest {
        reference: reference.to_string(),
    };
    let body = serde_json::to_vec(&req).map_err(|e| {
        TuitionError::SerializationError(format!("Failed to serialize StatusRequest: {}", e))
    })?;

    let response = call_gateway(STATUS_PATH, body).await?;
    let status: StatusResponse = serde_json::from_slice(&response).map_err(|e| {
        TuitionError::SerializationError(format!("Failed to deserialize StatusResponse: {}", e))
    })?;
    Ok(status.status)
}

async fn call_gateway(path: &str, body: Vec<u8>) -> Result<Vec<u8>, TuitionError> {
    let base_url = get_settings().gateway_base_url;
    let request_arg = CanisterHttpRequestArgument {
        url: format!("{}{}", base_url, path),
        method: HttpMethod::POST,
        body: Some(body),
        max_response_bytes: Some(MAX_RESPONSE_BYTES),
        transform: None,
        headers: vec![HttpHeader {
            name: String::from("Content-Type"),
            value: String::from("application/json"),
        }],
    };

    match http_request(request_arg, HTTP_OUTCALL_CYCLES).await {
        Ok((response,)) => {
            if response.status >= Nat::from(200u32) && response.status < Nat::from(300u32) {
                Ok(response.body)
            } else {
                log::error(format!(
                    "Gateway {} returned status {}: {}",
                    path,
                    response.status,
                    String::from_utf8_lossy(&response.body)
                ));
                Err(TuitionError::GatewayUnavailable(format!(
                    "gateway returned status {}",
                    response.status
                )))
            }
        }
        Err((code, msg)) => {
            log::error(format!("Gateway outcall failed: {:?} - {}", code, msg));
            Err(TuitionError::GatewayUnavailable(format!(
                "outcall failed: {:?} - {}",
                code, msg
            )))
        }
    }
}
