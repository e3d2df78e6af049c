use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use crate::entity::{ingredient, recipe, tag};

use super::shared::{
    MAX_TEXT_LENGTH, ValidationError, decimal, double_option, optional_decimal,
    validate_required_text,
};
pub use super::vocabulary::VocabularyResponse;

/// A tag or ingredient referenced by name inside a recipe payload.
#[derive(Deserialize, Clone, Debug, PartialEq, utoipa::ToSchema)]
pub struct VocabularyRef {
    #[schema(example = "Vegan")]
    pub name: String,
}

/// Request body for creating a recipe.
///
/// The nested `tags` and `ingredients` lists are kept apart from the scalar
/// fields and reconciled after the recipe row exists.
#[derive(Deserialize, Debug, utoipa::ToSchema)]
pub struct CreateRecipeRequest {
    #[schema(example = "Chocolate cheesecake")]
    pub title: String,
    #[schema(example = 30)]
    pub time_minutes: i32,
    /// Decimal with at most 2 fractional digits, below 1000.
    #[schema(value_type = String, example = "5.00")]
    #[serde(deserialize_with = "decimal")]
    pub price: BigDecimal,
    #[schema(example = "https://example.com/recipe.pdf")]
    pub link: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<VocabularyRef>,
    #[serde(default)]
    pub ingredients: Vec<VocabularyRef>,
}

/// Request body for `PATCH /recipes/{id}`. Absent fields are left untouched.
///
/// There is deliberately no owner field: an `owner` or `user` key in the
/// JSON body is ignored during deserialization.
#[derive(Deserialize, Debug, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateRecipeRequest {
    pub title: Option<String>,
    pub time_minutes: Option<i32>,
    #[schema(value_type = Option<String>, example = "7.50")]
    #[serde(default, deserialize_with = "optional_decimal")]
    pub price: Option<BigDecimal>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub link: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    /// When present, replaces every tag association (an empty list removes all).
    pub tags: Option<Vec<VocabularyRef>>,
    /// When present, replaces every ingredient association.
    pub ingredients: Option<Vec<VocabularyRef>>,
}

/// Request body for `PUT /recipes/{id}`: the required scalars must all be present.
#[derive(Deserialize, Debug, utoipa::ToSchema)]
pub struct ReplaceRecipeRequest {
    pub title: String,
    pub time_minutes: i32,
    #[schema(value_type = String, example = "5.00")]
    #[serde(deserialize_with = "decimal")]
    pub price: BigDecimal,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub link: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    pub tags: Option<Vec<VocabularyRef>>,
    pub ingredients: Option<Vec<VocabularyRef>>,
}

impl From<ReplaceRecipeRequest> for UpdateRecipeRequest {
    fn from(req: ReplaceRecipeRequest) -> Self {
        Self {
            title: Some(req.title),
            time_minutes: Some(req.time_minutes),
            price: Some(req.price),
            link: req.link,
            description: req.description,
            tags: req.tags,
            ingredients: req.ingredients,
        }
    }
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RecipeListQuery {
    /// Comma-separated tag ids; keeps recipes linked to any of them.
    pub tags: Option<String>,
    /// Comma-separated ingredient ids; keeps recipes linked to any of them.
    pub ingredients: Option<String>,
}

/// Recipe as returned by the list endpoint.
#[derive(Serialize, Debug, PartialEq, utoipa::ToSchema)]
pub struct RecipeSummary {
    pub id: i32,
    pub title: String,
    pub time_minutes: i32,
    #[schema(value_type = String, example = "5.00")]
    pub price: BigDecimal,
    pub link: Option<String>,
    pub tags: Vec<VocabularyResponse>,
    pub ingredients: Vec<VocabularyResponse>,
}

/// Recipe as returned by the detail, create and update endpoints.
#[derive(Serialize, Debug, PartialEq, utoipa::ToSchema)]
pub struct RecipeDetail {
    pub id: i32,
    pub title: String,
    pub time_minutes: i32,
    #[schema(value_type = String, example = "5.00")]
    pub price: BigDecimal,
    pub link: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<VocabularyResponse>,
    pub ingredients: Vec<VocabularyResponse>,
}

/// A recipe together with its associated vocabulary.
#[derive(Debug, Clone)]
pub struct RecipeRecord {
    pub recipe: recipe::Model,
    pub tags: Vec<tag::Model>,
    pub ingredients: Vec<ingredient::Model>,
}

impl RecipeRecord {
    pub fn summary(self) -> RecipeSummary {
        RecipeSummary {
            id: self.recipe.id,
            title: self.recipe.title,
            time_minutes: self.recipe.time_minutes,
            price: self.recipe.price,
            link: self.recipe.link,
            tags: self.tags.into_iter().map(Into::into).collect(),
            ingredients: self.ingredients.into_iter().map(Into::into).collect(),
        }
    }

    pub fn detail(self) -> RecipeDetail {
        RecipeDetail {
            id: self.recipe.id,
            title: self.recipe.title,
            time_minutes: self.recipe.time_minutes,
            price: self.recipe.price,
            link: self.recipe.link,
            description: self.recipe.description,
            tags: self.tags.into_iter().map(Into::into).collect(),
            ingredients: self.ingredients.into_iter().map(Into::into).collect(),
        }
    }
}

pub fn validate_time_minutes(time_minutes: i32) -> Result<(), ValidationError> {
    if time_minutes < 0 {
        return Err(ValidationError::new(
            "time_minutes",
            "time_minutes must be >= 0",
        ));
    }
    Ok(())
}

/// Prices are stored as `numeric(5, 2)`.
pub fn validate_price(price: &BigDecimal) -> Result<(), ValidationError> {
    if *price < BigDecimal::from(0) {
        return Err(ValidationError::new("price", "price must be >= 0"));
    }
    if *price >= BigDecimal::from(1000) {
        return Err(ValidationError::new("price", "price must be below 1000"));
    }
    let (_, scale) = price.normalized().as_bigint_and_exponent();
    if scale > 2 {
        return Err(ValidationError::new(
            "price",
            "price must have at most 2 decimal places",
        ));
    }
    Ok(())
}

pub fn validate_link(link: Option<&str>) -> Result<(), ValidationError> {
    if let Some(link) = link
        && link.trim().chars().count() > MAX_TEXT_LENGTH
    {
        return Err(ValidationError::new(
            "link",
            format!("link must be at most {MAX_TEXT_LENGTH} characters"),
        ));
    }
    Ok(())
}

pub fn validate_vocabulary_refs(
    field: &'static str,
    refs: &[VocabularyRef],
) -> Result<(), ValidationError> {
    for r in refs {
        validate_required_text(field, &r.name)?;
    }
    Ok(())
}

pub fn validate_create_recipe(req: &CreateRecipeRequest) -> Result<(), ValidationError> {
    validate_required_text("title", &req.title)?;
    validate_time_minutes(req.time_minutes)?;
    validate_price(&req.price)?;
    validate_link(req.link.as_deref())?;
    validate_vocabulary_refs("tags", &req.tags)?;
    validate_vocabulary_refs("ingredients", &req.ingredients)?;
    Ok(())
}

pub fn validate_update_recipe(req: &UpdateRecipeRequest) -> Result<(), ValidationError> {
    if let Some(ref title) = req.title {
        validate_required_text("title", title)?;
    }
    if let Some(time_minutes) = req.time_minutes {
        validate_time_minutes(time_minutes)?;
    }
    if let Some(ref price) = req.price {
        validate_price(price)?;
    }
    if let Some(ref link) = req.link {
        validate_link(link.as_deref())?;
    }
    if let Some(ref tags) = req.tags {
        validate_vocabulary_refs("tags", tags)?;
    }
    if let Some(ref ingredients) = req.ingredients {
        validate_vocabulary_refs("ingredients", ingredients)?;
    }
    Ok(())
}

/// Blank links and descriptions are stored as NULL.
pub fn normalize_optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
