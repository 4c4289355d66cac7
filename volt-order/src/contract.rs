use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;
use volt_core::renderer::ContractRenderer;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContractParty {
    Buyer,
    Seller,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signature {
    pub signer: Uuid,
    pub image_ref: String,
    pub at: DateTime<Utc>,
}

/// Draft/sign state for the contract attached to one product listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractState {
    pub contract_id: Uuid,
    pub product_id: Uuid,
    pub template: String,
    pub document_ref: Option<String>,
    pub seller_signature: Option<Signature>,
    pub buyer_signature: Option<Signature>,
    pub signed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, thiserror::Error)]
pub enum ContractError {
    #[error("no contract open for product {0}")]
    NotFound(Uuid),

    #[error("contract render failed: {0}")]
    RenderFailed(String),
}

/// Tracks contract state per product and gates checkout on signature
/// presence. Does not validate document content; the rendered document
/// is consumed only as a reference.
pub struct ContractCoordinator {
    renderer: Arc<dyn ContractRenderer>,
    contracts: RwLock<HashMap<Uuid, ContractState>>,
}

impl ContractCoordinator {
    pub fn new(renderer: Arc<dyn ContractRenderer>) -> Self {
        Self {
            renderer,
            contracts: RwLock::new(HashMap::new()),
        }
    }

    /// Open (or return the existing) contract draft for a product. The
    /// document reference comes from the renderer collaborator.
    pub async fn open(&self, product_id: Uuid, template: &str) -> Result<ContractState, ContractError> {
        if let Some(existing) = self.contracts.read().unwrap().get(&product_id) {
            return Ok(existing.clone());
        }
        let document_ref = self
            .renderer
            .render(template, product_id)
            .await
            .map_err(|e| ContractError::RenderFailed(e.to_string()))?;

        let state = ContractState {
            contract_id: Uuid::new_v4(),
            product_id,
            template: template.to_string(),
            document_ref: Some(document_ref),
            seller_signature: None,
            buyer_signature: None,
            signed_at: None,
        };
        let mut contracts = self.contracts.write().unwrap();
        Ok(contracts.entry(product_id).or_insert(state).clone())
    }

    /// Store a party's signature. Does not, by itself, transition any
    /// order. Re-signing overwrites the previous image for that party.
    pub fn attach_signature(
        &self,
        product_id: Uuid,
        party: ContractParty,
        signer: Uuid,
        image_ref: &str,
    ) -> Result<ContractState, ContractError> {
        let mut contracts = self.contracts.write().unwrap();
        let state = contracts
            .get_mut(&product_id)
            .ok_or(ContractError::NotFound(product_id))?;

        let signature = Signature {
            signer,
            image_ref: image_ref.to_string(),
            at: Utc::now(),
        };
        match party {
            ContractParty::Buyer => state.buyer_signature = Some(signature),
            ContractParty::Seller => state.seller_signature = Some(signature),
        }
        if state.signed_at.is_none()
            && state.buyer_signature.is_some()
            && state.seller_signature.is_some()
        {
            state.signed_at = Some(Utc::now());
        }
        Ok(state.clone())
    }

    /// True only when both buyer and seller signatures are present.
    pub fn is_satisfied(&self, product_id: Uuid) -> bool {
        self.contracts
            .read()
            .unwrap()
            .get(&product_id)
            .map(|s| s.buyer_signature.is_some() && s.seller_signature.is_some())
            .unwrap_or(false)
    }

    pub fn get(&self, product_id: Uuid) -> Option<ContractState> {
        self.contracts.read().unwrap().get(&product_id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use volt_core::renderer::StubRenderer;

    fn coordinator() -> ContractCoordinator {
        ContractCoordinator::new(Arc::new(StubRenderer))
    }

    #[tokio::test]
    async fn satisfied_only_with_both_signatures() {
        let c = coordinator();
        let product = Uuid::new_v4();
        c.open(product, "ev-sale-v1").await.unwrap();
        assert!(!c.is_satisfied(product));

        c.attach_signature(product, ContractParty::Seller, Uuid::new_v4(), "sig/seller.png")
            .unwrap();
        assert!(!c.is_satisfied(product));

        let state = c
            .attach_signature(product, ContractParty::Buyer, Uuid::new_v4(), "sig/buyer.png")
            .unwrap();
        assert!(c.is_satisfied(product));
        assert!(state.signed_at.is_some());
    }

    #[tokio::test]
    async fn open_is_idempotent_per_product() {
        let c = coordinator();
        let product = Uuid::new_v4();
        let first = c.open(product, "ev-sale-v1").await.unwrap();
        let second = c.open(product, "ev-sale-v1").await.unwrap();
        assert_eq!(first.contract_id, second.contract_id);
    }

    #[test]
    fn signing_unknown_product_fails() {
        let c = coordinator();
        let err = c
            .attach_signature(Uuid::new_v4(), ContractParty::Buyer, Uuid::new_v4(), "sig.png")
            .unwrap_err();
        assert!(matches!(err, ContractError::NotFound(_)));
    }
}
