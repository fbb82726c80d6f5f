use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use super::client::ValidationClient;
use super::outcome::{DocumentKind, ValidationError, ValidationOutcome};
use super::{ToolArguments, ToolHandler};
use crate::errors::AgentResult;
use crate::models::tool::Tool;

#[derive(Debug, Deserialize)]
struct IrpfArguments {
    #[serde(rename = "fileBase64", default)]
    file_base64: Option<String>,
}

/// Validates an IRPF (Imposto de Renda Pessoa Física) return
pub struct ValidateIrpf {
    tool: Tool,
    client: Arc<ValidationClient>,
}

impl ValidateIrpf {
    pub const NAME: &'static str = "validate_irpf";

    pub fn new(client: Arc<ValidationClient>) -> Self {
        let tool = Tool::new(
            Self::NAME,
            "Valida um documento de IRPF (Imposto de Renda Pessoa Física). Use esta ferramenta \
            quando o usuário fornecer um documento IRPF em PDF. O arquivo será automaticamente \
            injetado pelo sistema, você não precisa fornecer o fileBase64.",
            json!({
                "type": "object",
                "required": [],
                "properties": {
                    "fileBase64": {
                        "type": "string",
                        "description": "O arquivo PDF do IRPF codificado em base64 (injetado automaticamente)"
                    }
                }
            }),
        );
        Self { tool, client }
    }
}

#[async_trait]
impl ToolHandler for ValidateIrpf {
    fn tool(&self) -> &Tool {
        &self.tool
    }

    async fn call(&self, arguments: ToolArguments) -> AgentResult<ValidationOutcome> {
        let args: IrpfArguments = arguments.parse()?;

        let Some(file_base64) = args.file_base64.filter(|file| !file.trim().is_empty()) else {
            return Ok(ValidationError::FileNotProvided(DocumentKind::Irpf).into());
        };

        Ok(self.client.submit(DocumentKind::Irpf, &file_base64, &[]).await)
    }
}
