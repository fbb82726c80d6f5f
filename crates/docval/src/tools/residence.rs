use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use super::client::ValidationClient;
use super::outcome::{DocumentKind, ValidationError, ValidationOutcome};
use super::{ToolArguments, ToolHandler};
use crate::errors::AgentResult;
use crate::models::tool::Tool;

/// Multipart field carrying the address the document is checked against
const ADDRESS_FIELD: &str = "currentAddress[value]";

#[derive(Debug, Deserialize)]
struct ResidenceArguments {
    #[serde(rename = "fileBase64", default)]
    file_base64: Option<String>,
    #[serde(default)]
    address: Option<String>,
}

/// Cross-checks a proof of residence against the address the user states
pub struct ValidateProofOfResidence {
    tool: Tool,
    client: Arc<ValidationClient>,
}

impl ValidateProofOfResidence {
    pub const NAME: &'static str = "validate_proof_of_residence";

    pub fn new(client: Arc<ValidationClient>) -> Self {
        let tool = Tool::new(
            Self::NAME,
            "Valida um comprovante de residência. Use esta ferramenta quando o usuário fornecer \
            um comprovante de residência em PDF E o endereço atual. IMPORTANTE: Você DEVE \
            perguntar o endereço completo ao usuário antes de chamar esta ferramenta. O arquivo \
            PDF será automaticamente injetado pelo sistema.",
            json!({
                "type": "object",
                "required": ["address"],
                "properties": {
                    "fileBase64": {
                        "type": "string",
                        "description": "O arquivo PDF do comprovante de residência codificado em base64 (injetado automaticamente)"
                    },
                    "address": {
                        "type": "string",
                        "description": "O endereço completo atual do usuário no formato: Rua, Número, Bairro, Cidade, Estado - CEP"
                    }
                }
            }),
        );
        Self { tool, client }
    }
}

#[async_trait]
impl ToolHandler for ValidateProofOfResidence {
    fn tool(&self) -> &Tool {
        &self.tool
    }

    async fn call(&self, arguments: ToolArguments) -> AgentResult<ValidationOutcome> {
        let args: ResidenceArguments = arguments.parse()?;

        let Some(file_base64) = args.file_base64.filter(|file| !file.trim().is_empty()) else {
            return Ok(ValidationError::FileNotProvided(DocumentKind::ProofOfResidence).into());
        };
        let Some(address) = args.address.filter(|address| !address.trim().is_empty()) else {
            return Ok(ValidationError::InvalidAddress.into());
        };

        Ok(self
            .client
            .submit(
                DocumentKind::ProofOfResidence,
                &file_base64,
                &[(ADDRESS_FIELD, address.trim())],
            )
            .await)
    }
}
