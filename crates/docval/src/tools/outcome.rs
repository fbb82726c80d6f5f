use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// The two documents the remote validation API understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Irpf,
    ProofOfResidence,
}

impl DocumentKind {
    pub fn route(&self) -> &'static str {
        match self {
            DocumentKind::Irpf => "/api/documents/process/irpf",
            DocumentKind::ProofOfResidence => "/api/documents/process/proof-of-residence",
        }
    }

    /// Multipart field holding the PDF
    pub fn file_field(&self) -> &'static str {
        match self {
            DocumentKind::Irpf => "irpf",
            DocumentKind::ProofOfResidence => "document",
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            DocumentKind::Irpf => "irpf.pdf",
            DocumentKind::ProofOfResidence => "comprovante.pdf",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            DocumentKind::Irpf => "o documento IRPF",
            DocumentKind::ProofOfResidence => "o comprovante de residência",
        }
    }

    pub fn success_message(&self) -> &'static str {
        match self {
            DocumentKind::Irpf => "IRPF validado com sucesso!",
            DocumentKind::ProofOfResidence => "Comprovante de residência validado com sucesso!",
        }
    }

    pub fn default_error(&self) -> &'static str {
        match self {
            DocumentKind::Irpf => "Erro ao validar IRPF",
            DocumentKind::ProofOfResidence => "Erro ao validar comprovante de residência",
        }
    }
}

/// Reasons a validation did not produce a verdict.
///
/// The messages are shown to the model, which relays them to the user in Portuguese.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Arquivo PDF não fornecido. Por favor, anexe {} em PDF.", .0.label())]
    FileNotProvided(DocumentKind),

    #[error("Endereço não fornecido. Por favor, forneça o endereço completo no formato: Rua, Número, Bairro, Cidade, Estado - CEP")]
    InvalidAddress,

    #[error("Configuração da API não encontrada. Verifique as variáveis de ambiente DOCVAL_VALIDATION__API_URL e DOCVAL_VALIDATION__API_KEY.")]
    Configuration,

    #[error("Arquivo PDF inválido: {0}")]
    InvalidPayload(String),

    #[error("{0}")]
    Transport(String),

    #[error("{message}")]
    Upstream { message: String, details: Value },
}

/// Uniform result of a validation tool, serialized as the tool result text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ValidationOutcome {
    pub fn success<S: Into<String>>(message: S, data: Value) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            error: None,
            data: Some(data),
            details: None,
        }
    }

    pub fn failure(error: &ValidationError) -> Self {
        let details = match error {
            ValidationError::Upstream { details, .. } => Some(details.clone()),
            _ => None,
        };
        Self {
            success: false,
            message: None,
            error: Some(error.to_string()),
            data: None,
            details,
        }
    }

    pub fn to_json_string(&self) -> String {
        // serializing plain strings and json values cannot fail
        serde_json::to_string(self).unwrap_or_default()
    }
}

impl From<ValidationError> for ValidationOutcome {
    fn from(error: ValidationError) -> Self {
        Self::failure(&error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_failure_envelope_shape() {
        let outcome = ValidationOutcome::from(ValidationError::FileNotProvided(DocumentKind::Irpf));
        let value: Value = serde_json::from_str(&outcome.to_json_string()).unwrap();

        assert_eq!(
            value,
            json!({
                "success": false,
                "error": "Arquivo PDF não fornecido. Por favor, anexe o documento IRPF em PDF."
            })
        );
    }

    #[test]
    fn test_upstream_failure_keeps_details() {
        let outcome = ValidationOutcome::from(ValidationError::Upstream {
            message: "CPF divergente".to_string(),
            details: json!({"message": "CPF divergente", "code": 42}),
        });

        assert!(!outcome.success);
        assert_eq!(outcome.error.as_deref(), Some("CPF divergente"));
        assert_eq!(outcome.details.unwrap()["code"], 42);
    }

    #[test]
    fn test_success_envelope_shape() {
        let outcome = ValidationOutcome::success(
            DocumentKind::ProofOfResidence.success_message(),
            json!({"valid": true}),
        );
        let value: Value = serde_json::to_value(&outcome).unwrap();

        assert_eq!(value["success"], true);
        assert_eq!(value["message"], "Comprovante de residência validado com sucesso!");
        assert_eq!(value["data"], json!({"valid": true}));
        assert!(value.get("error").is_none());
    }
}
