//! Postal-code (CEP) address lookup client.
//!
//! Best-effort enhancement: a "not found" response, a transport failure,
//! or an unparseable body all resolve to `None` and never block checkout.

use serde::Deserialize;
use tracing::debug;

use crate::domain::checkout::AddressFragment;
use crate::domain::value_objects::PostalCode;

pub const DEFAULT_BASE_URL: &str = "https://viacep.com.br/ws";

#[derive(Clone)]
pub struct CepClient {
    http: reqwest::Client,
    base_url: String,
}

impl CepClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    pub async fn lookup(&self, code: &PostalCode) -> Option<AddressFragment> {
        let url = format!("{}/{}/json/", self.base_url, code.as_str());
        let response = match self.http.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                debug!(code = %code, error = %e, "cep lookup transport failure");
                return None;
            }
        };
        if !response.status().is_success() {
            debug!(code = %code, status = %response.status(), "cep lookup rejected");
            return None;
        }
        let body: ViaCepResponse = match response.json().await {
            Ok(b) => b,
            Err(e) => {
                debug!(code = %code, error = %e, "cep lookup body unreadable");
                return None;
            }
        };
        if body.erro.unwrap_or(false) {
            debug!(code = %code, "cep not found");
            return None;
        }
        Some(AddressFragment {
            street: body.logradouro,
            neighborhood: body.bairro,
            city: body.localidade,
            state: body.uf,
        })
    }
}

impl Default for CepClient {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

#[derive(Debug, Deserialize)]
struct ViaCepResponse {
    #[serde(default)]
    logradouro: String,
    #[serde(default)]
    bairro: String,
    #[serde(default)]
    localidade: String,
    #[serde(default)]
    uf: String,
    #[serde(default)]
    erro: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn found_response_maps_to_fragment() {
        let body = r#"{
            "cep": "01001-000",
            "logradouro": "Praça da Sé",
            "complemento": "lado ímpar",
            "bairro": "Sé",
            "localidade": "São Paulo",
            "uf": "SP"
        }"#;
        let parsed: ViaCepResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.logradouro, "Praça da Sé");
        assert_eq!(parsed.localidade, "São Paulo");
        assert_eq!(parsed.erro, None);
    }

    #[test]
    fn not_found_response_sets_error_flag() {
        let parsed: ViaCepResponse = serde_json::from_str(r#"{"erro": true}"#).unwrap();
        assert_eq!(parsed.erro, Some(true));
        assert_eq!(parsed.logradouro, "");
    }
}
