//! Verification router: map a certification type to a verification strategy
//! and run it.
//!
//! Strategy errors never propagate to the caller; they degrade the outcome to
//! PENDING with `needs_review` set, and the request that triggered the
//! verification still succeeds.

pub mod client;

use crate::config::VerificationConfig;
use crate::entity::certification::{self, VerificationMethod, VerificationStatus};
use crate::error::VerificationError;
use serde::Serialize;
use serde_json::json;
use time::Date;
use utoipa::ToSchema;

/// Inputs handed to a verification strategy.
#[derive(Debug, Clone, Serialize)]
pub struct VerificationRequest {
    pub certificate_number: Option<String>,
    pub company_name: String,
    pub issuing_body: String,
    pub issue_date: Option<Date>,
    pub expiry_date: Date,
}

impl VerificationRequest {
    pub fn for_certification(cert: &certification::Model, supplier_name: &str) -> Self {
        Self {
            certificate_number: cert.certificate_number.clone(),
            company_name: supplier_name.to_string(),
            issuing_body: cert.issuing_body.clone(),
            issue_date: cert.issue_date,
            expiry_date: cert.expiry_date,
        }
    }
}

/// Result of running a verification strategy.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct VerificationOutcome {
    pub status: VerificationStatus,
    pub method: VerificationMethod,
    pub confidence: f64,
    pub needs_review: bool,
    pub details: serde_json::Value,
}

/// Constant lookup from certification type to verification strategy.
pub fn method_for(cert_type: &str) -> VerificationMethod {
    match cert_type.to_ascii_uppercase().replace('-', "_").as_str() {
        "GOTS" | "GLOBAL_ORGANIC_TEXTILE" | "OCS" => VerificationMethod::Api,
        "OEKO_TEX" | "GRS" | "GLOBAL_RECYCLED_STANDARD" => VerificationMethod::WebScraping,
        "FAIRTRADE" | "RAINFOREST_ALLIANCE" | "FSC" => VerificationMethod::ListMatching,
        _ => VerificationMethod::Manual,
    }
}

/// Run the verification router for one certification.
///
/// Picks the strategy from the certification type, invokes it, and returns
/// the outcome. Any strategy error yields PENDING + needs_review instead of
/// an error.
#[tracing::instrument(skip(config, cert), fields(certification_id = %cert.id, cert_type = %cert.cert_type))]
pub async fn verify_certification(
    config: &VerificationConfig,
    cert: &certification::Model,
    supplier_name: &str,
) -> VerificationOutcome {
    let method = method_for(&cert.cert_type);
    let request = VerificationRequest::for_certification(cert, supplier_name);

    let result = match method {
        VerificationMethod::Manual => Ok(manual_outcome()),
        VerificationMethod::Api => verify_via_api(config, &request).await,
        VerificationMethod::WebScraping => verify_via_registry(config, &request).await,
        VerificationMethod::ListMatching => Ok(verify_by_list(config, &request)),
    };

    match result {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::warn!(
                name = "verification.strategy_failed",
                target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
                error = %e,
                certification_id = %cert.id,
                method = ?method,
                message = "Verification strategy failed, degrading to PENDING"
            );
            VerificationOutcome {
                status: VerificationStatus::Pending,
                method,
                confidence: 0.0,
                needs_review: true,
                details: json!({ "error": e.to_string() }),
            }
        }
    }
}

/// MANUAL: the document is queued for human review; grant basic status only.
fn manual_outcome() -> VerificationOutcome {
    VerificationOutcome {
        status: VerificationStatus::Basic,
        method: VerificationMethod::Manual,
        confidence: 0.3,
        needs_review: true,
        details: json!({ "note": "queued for manual document review" }),
    }
}

/// API: ask the issuing body's verification endpoint for a yes/no.
async fn verify_via_api(
    config: &VerificationConfig,
    request: &VerificationRequest,
) -> Result<VerificationOutcome, VerificationError> {
    if config.api_endpoint.is_empty() {
        return Err(VerificationError::EndpointNotConfigured("api"));
    }
    let payload = json!({
        "certificate_number": request.certificate_number,
        "company_name": request.company_name,
        "issuing_body": request.issuing_body,
        "issue_date": request.issue_date,
        "expiry_date": request.expiry_date,
    });
    let response = client::post_json(&config.api_endpoint, &payload).await?;
    let valid = response
        .get("valid")
        .and_then(|v| v.as_bool())
        .ok_or_else(|| VerificationError::Json("response missing boolean `valid`".into()))?;
    let confidence = response.get("score").and_then(|v| v.as_f64()).unwrap_or(0.9);
    Ok(VerificationOutcome {
        status: if valid {
            VerificationStatus::Verified
        } else {
            VerificationStatus::Failed
        },
        method: VerificationMethod::Api,
        confidence,
        needs_review: false,
        details: json!({ "endpoint": config.api_endpoint, "response": response }),
    })
}

/// WEB_SCRAPING: look the certificate number up in the public registry page.
async fn verify_via_registry(
    config: &VerificationConfig,
    request: &VerificationRequest,
) -> Result<VerificationOutcome, VerificationError> {
    if config.registry_endpoint.is_empty() {
        return Err(VerificationError::EndpointNotConfigured("registry"));
    }
    let number = request
        .certificate_number
        .as_deref()
        .filter(|n| !n.is_empty())
        .ok_or(VerificationError::MissingField("certificate_number"))?;
    let url = format!("{}?number={}", config.registry_endpoint, sanitize_query(number));
    let body = client::get_text(&url).await?;
    let matched = body.contains(number);
    Ok(VerificationOutcome {
        status: if matched {
            VerificationStatus::Verified
        } else {
            VerificationStatus::Failed
        },
        method: VerificationMethod::WebScraping,
        confidence: 0.7,
        needs_review: false,
        details: json!({ "registry": config.registry_endpoint, "matched": matched }),
    })
}

/// LIST_MATCHING: accept the certification if its issuing body is on the
/// configured trusted-issuer list.
fn verify_by_list(config: &VerificationConfig, request: &VerificationRequest) -> VerificationOutcome {
    let trusted = config
        .trusted_issuers
        .iter()
        .any(|issuer| issuer.eq_ignore_ascii_case(&request.issuing_body));
    if trusted {
        VerificationOutcome {
            status: VerificationStatus::Verified,
            method: VerificationMethod::ListMatching,
            confidence: 0.6,
            needs_review: false,
            details: json!({ "issuing_body": request.issuing_body, "trusted": true }),
        }
    } else {
        VerificationOutcome {
            status: VerificationStatus::Pending,
            method: VerificationMethod::ListMatching,
            confidence: 0.0,
            needs_review: true,
            details: json!({ "issuing_body": request.issuing_body, "trusted": false }),
        }
    }
}

/// Certificate numbers are registry identifiers (alphanumeric with separator
/// punctuation); strip anything else before building the query string.
fn sanitize_query(value: &str) -> String {
    value
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        .collect()
}
