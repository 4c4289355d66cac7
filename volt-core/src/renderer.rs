use async_trait::async_trait;
use uuid::Uuid;

/// Produces the human-readable contract document and returns a storage
/// reference. Rendering itself (HTML, PDF) is outside this workspace;
/// the engine only keeps the reference.
#[async_trait]
pub trait ContractRenderer: Send + Sync {
    async fn render(&self, template: &str, product_id: Uuid) -> Result<String, RenderError>;
}

#[derive(Debug, thiserror::Error)]
#[error("contract render failed: {0}")]
pub struct RenderError(pub String);

/// Returns a deterministic reference without touching a renderer.
pub struct StubRenderer;

#[async_trait]
impl ContractRenderer for StubRenderer {
    async fn render(&self, template: &str, product_id: Uuid) -> Result<String, RenderError> {
        Ok(format!("contracts/{}/{}.pdf", template, product_id.simple()))
    }
}

/// Always fails, for tests exercising renderer outages.
pub struct FailingRenderer;

#[async_trait]
impl ContractRenderer for FailingRenderer {
    async fn render(&self, _template: &str, _product_id: Uuid) -> Result<String, RenderError> {
        Err(RenderError("renderer down".into()))
    }
}
