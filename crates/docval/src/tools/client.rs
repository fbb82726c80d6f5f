use anyhow::Result;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::header::AUTHORIZATION;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use super::outcome::{DocumentKind, ValidationError, ValidationOutcome};

/// Location and credentials of the document validation API
#[derive(Debug, Clone, Default)]
pub struct ValidationConfig {
    pub api_url: Option<String>,
    pub api_key: Option<String>,
}

impl ValidationConfig {
    pub fn new<U: Into<String>, K: Into<String>>(api_url: U, api_key: K) -> Self {
        Self {
            api_url: Some(api_url.into()),
            api_key: Some(api_key.into()),
        }
    }

    fn endpoint(&self) -> Result<(&str, &str), ValidationError> {
        let api_url = self.api_url.as_deref().filter(|url| !url.trim().is_empty());
        let api_key = self.api_key.as_deref().filter(|key| !key.trim().is_empty());
        match (api_url, api_key) {
            (Some(url), Some(key)) => Ok((url.trim_end_matches('/'), key)),
            _ => Err(ValidationError::Configuration),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.endpoint().is_ok()
    }
}

/// HTTP client for the validation API, shared by both validation tools
pub struct ValidationClient {
    client: Client,
    config: ValidationConfig,
}

impl ValidationClient {
    pub fn new(config: ValidationConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()?;

        Ok(Self { client, config })
    }

    /// Submit a base64 encoded PDF plus extra text fields and normalize the answer.
    ///
    /// Every failure is folded into the returned envelope.
    pub async fn submit(
        &self,
        kind: DocumentKind,
        file_base64: &str,
        fields: &[(&str, &str)],
    ) -> ValidationOutcome {
        match self.try_submit(kind, file_base64, fields).await {
            Ok(outcome) => outcome,
            Err(error) => {
                tracing::warn!(document = ?kind, %error, "validation failed");
                ValidationOutcome::failure(&error)
            }
        }
    }

    async fn try_submit(
        &self,
        kind: DocumentKind,
        file_base64: &str,
        fields: &[(&str, &str)],
    ) -> Result<ValidationOutcome, ValidationError> {
        let (api_url, api_key) = self.config.endpoint()?;
        let bytes = decode_pdf(file_base64)?;
        let url = format!("{}{}", api_url, kind.route());

        let part = Part::bytes(bytes)
            .file_name(kind.file_name())
            .mime_str("application/pdf")
            .map_err(|e| ValidationError::Transport(e.to_string()))?;
        let mut form = Form::new().part(kind.file_field(), part);
        for (name, value) in fields {
            form = form.text(name.to_string(), value.to_string());
        }

        tracing::info!(document = ?kind, %url, "submitting document for validation");
        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ValidationError::Transport(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ValidationError::Transport(e.to_string()))?;
        let body = match serde_json::from_str::<Value>(&text) {
            Ok(value) => value,
            Err(_) => Value::String(text),
        };

        if status.is_success() {
            tracing::info!(document = ?kind, %status, "document validated");
            return Ok(ValidationOutcome::success(kind.success_message(), body));
        }

        let message = body
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or(kind.default_error())
            .to_string();
        Err(ValidationError::Upstream {
            message,
            details: body,
        })
    }
}

/// Decode the payload, tolerating a `data:` URL prefix and line-wrapped base64
fn decode_pdf(file_base64: &str) -> Result<Vec<u8>, ValidationError> {
    let encoded = file_base64.trim();
    let encoded = match encoded.split_once(";base64,") {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => encoded,
    };
    let encoded: String = encoded
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    STANDARD
        .decode(encoded)
        .map_err(|e| ValidationError::InvalidPayload(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    // "%PDF-1.4"
    const PDF_BASE64: &str = "JVBERi0xLjQ=";

    #[test]
    fn test_decode_wrapped_pdf() {
        assert_eq!(decode_pdf("JVBERi0x\nLjQ=").unwrap(), b"%PDF-1.4");
        assert_eq!(decode_pdf("JVBE\r\nRi0x LjQ=\n").unwrap(), b"%PDF-1.4");
    }

    #[test]
    fn test_decode_pdf() {
        assert_eq!(decode_pdf(PDF_BASE64).unwrap(), b"%PDF-1.4");
        assert_eq!(
            decode_pdf(&format!("data:application/pdf;base64,{}", PDF_BASE64)).unwrap(),
            b"%PDF-1.4"
        );
        assert!(matches!(
            decode_pdf("not base64!"),
            Err(ValidationError::InvalidPayload(_))
        ));
    }

    #[test]
    fn test_config_requires_both_values() {
        assert!(!ValidationConfig::default().is_configured());
        assert!(!ValidationConfig {
            api_url: Some("http://api".into()),
            api_key: Some("  ".into()),
        }
        .is_configured());
        assert!(ValidationConfig::new("http://api", "key").is_configured());
    }

    #[tokio::test]
    async fn test_submit_sends_multipart_with_auth() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/documents/process/irpf"))
            .and(header("Authorization", "secret-key"))
            .and(body_string_contains("name=\"irpf\"; filename=\"irpf.pdf\""))
            .and(body_string_contains("%PDF-1.4"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "valid"})))
            .expect(1)
            .mount(&server)
            .await;

        let client =
            ValidationClient::new(ValidationConfig::new(format!("{}/", server.uri()), "secret-key"))
                .unwrap();
        let outcome = client.submit(DocumentKind::Irpf, PDF_BASE64, &[]).await;

        assert_eq!(
            outcome,
            ValidationOutcome::success("IRPF validado com sucesso!", json!({"status": "valid"}))
        );
    }

    #[tokio::test]
    async fn test_submit_maps_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/documents/process/irpf"))
            .respond_with(
                ResponseTemplate::new(422).set_body_json(json!({"message": "Documento ilegível"})),
            )
            .mount(&server)
            .await;

        let client = ValidationClient::new(ValidationConfig::new(server.uri(), "key")).unwrap();
        let outcome = client.submit(DocumentKind::Irpf, PDF_BASE64, &[]).await;

        assert!(!outcome.success);
        assert_eq!(outcome.error.as_deref(), Some("Documento ilegível"));
        assert_eq!(outcome.details, Some(json!({"message": "Documento ilegível"})));
    }

    #[tokio::test]
    async fn test_submit_upstream_error_without_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client = ValidationClient::new(ValidationConfig::new(server.uri(), "key")).unwrap();
        let outcome = client
            .submit(DocumentKind::ProofOfResidence, PDF_BASE64, &[])
            .await;

        assert_eq!(
            outcome.error.as_deref(),
            Some("Erro ao validar comprovante de residência")
        );
        assert_eq!(outcome.details, Some(json!("boom")));
    }

    #[tokio::test]
    async fn test_submit_transport_error() {
        // Nothing listens on port 9 of localhost
        let client =
            ValidationClient::new(ValidationConfig::new("http://127.0.0.1:9", "key")).unwrap();
        let outcome = client.submit(DocumentKind::Irpf, PDF_BASE64, &[]).await;

        assert!(!outcome.success);
        assert!(outcome.error.is_some());
        assert!(outcome.data.is_none());
    }
}
