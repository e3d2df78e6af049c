use serde::{Deserialize, Serialize};

use crate::entity::{ingredient, tag};

use super::shared::{ValidationError, validate_required_text};

/// A tag or ingredient owned by the caller.
#[derive(Serialize, Debug, Clone, PartialEq, utoipa::ToSchema)]
pub struct VocabularyResponse {
    #[schema(example = 3)]
    pub id: i32,
    #[schema(example = "Dessert")]
    pub name: String,
}

impl From<tag::Model> for VocabularyResponse {
    fn from(m: tag::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
        }
    }
}

impl From<ingredient::Model> for VocabularyResponse {
    fn from(m: ingredient::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
        }
    }
}

/// Request body for renaming a tag or ingredient.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpdateVocabularyRequest {
    #[schema(example = "Coriander")]
    pub name: String,
}

pub fn validate_update_vocabulary(req: &UpdateVocabularyRequest) -> Result<(), ValidationError> {
    validate_required_text("name", &req.name)
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct VocabularyListQuery {
    /// `1` to return only entries linked to at least one recipe.
    pub assigned_only: Option<u8>,
}

impl VocabularyListQuery {
    pub fn assigned_only(&self) -> bool {
        self.assigned_only.is_some_and(|v| v != 0)
    }
}
