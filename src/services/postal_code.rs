use super::config::{trim_base, ServiceConfig};
use super::{join_non_empty, ResolvedAddress, ServiceError};

use async_trait::async_trait;
use log::*;
use reqwest::{RequestBuilder, StatusCode};
use serde::Deserialize;

pub const POSTAL_CODE_DIGITS: usize = 8;

/// Digits-only form of a postal code, e.g. `"01310-100"` becomes `"01310100"`.
pub fn normalize_postal_code(input: &str) -> String {
    input.chars().filter(char::is_ascii_digit).collect()
}

/// True when the input carries exactly eight digits once separators are stripped.
pub fn is_postal_code(input: &str) -> bool {
    normalize_postal_code(input).len() == POSTAL_CODE_DIGITS
}

#[async_trait]
pub trait PostalCodeService: Send + Sync {
    async fn resolve_postal_code(&self, code: &str) -> Result<ResolvedAddress, ServiceError>;
}

/// Postal-directory client speaking the ViaCEP `/ws/<code>/json/` protocol.
pub struct ViaCepService {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ViaCepAddress {
    pub logradouro: String,
    pub bairro: String,
    pub localidade: String,
    pub uf: String,
    // "erro" has been sent both as a boolean and as the string "true".
    pub erro: Option<serde_json::Value>,
}

impl ViaCepAddress {
    fn not_found(&self) -> bool {
        match &self.erro {
            Some(serde_json::Value::Bool(flag)) => *flag,
            Some(serde_json::Value::String(flag)) => flag == "true",
            Some(serde_json::Value::Null) | None => false,
            Some(_) => true,
        }
    }

    pub fn into_resolved(self, digits: String) -> Result<ResolvedAddress, ServiceError> {
        if self.not_found() {
            return Err(ServiceError::NotFound);
        }
        let full_text = join_non_empty([
            self.logradouro.trim(),
            self.bairro.trim(),
            self.localidade.trim(),
            self.uf.trim(),
        ]);
        if full_text.is_empty() {
            return Err(ServiceError::NotFound);
        }
        Ok(ResolvedAddress {
            postal_code: Some(digits),
            neighborhood: self.bairro.trim().to_string(),
            city: self.localidade.trim().to_string(),
            region: self.uf.trim().to_string(),
            full_text,
        })
    }
}

pub fn parse_lookup_response(digits: String, body: &str) -> Result<ResolvedAddress, ServiceError> {
    let address: ViaCepAddress = serde_json::from_str(body)?;
    address.into_resolved(digits)
}

pub fn lookup_outcome(status: StatusCode, digits: String, body: &str) -> Result<ResolvedAddress, ServiceError> {
    if !status.is_success() {
        return Err(ServiceError::Status(status.as_u16()));
    }
    parse_lookup_response(digits, body)
}

impl ViaCepService {
    pub fn new(config: &ServiceConfig, client: reqwest::Client) -> Self {
        ViaCepService {
            client,
            base_url: trim_base(&config.postal_url).to_string(),
        }
    }

    /// `digits` must already be normalized.
    pub fn lookup_request(&self, digits: &str) -> RequestBuilder {
        self.client.get(format!("{}/ws/{}/json/", self.base_url, digits))
    }
}

#[async_trait]
impl PostalCodeService for ViaCepService {
    async fn resolve_postal_code(&self, code: &str) -> Result<ResolvedAddress, ServiceError> {
        let digits = normalize_postal_code(code);
        if digits.len() != POSTAL_CODE_DIGITS {
            return Err(ServiceError::InvalidPostalCode(code.to_string()));
        }

        trace!("Looking up postal code {}.", digits);
        let response = self.lookup_request(&digits).send().await?;
        let status = response.status();
        let body = response.text().await?;
        lookup_outcome(status, digits, &body)
    }
}
