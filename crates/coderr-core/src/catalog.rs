//! # Catalog Rules
//!
//! Turns raw offer payloads into validated commands and parses the public
//! listing filters.
//!
//! ## Tier Invariants
//! ```text
//! create  ──► details.len() == 3  AND  {offer_type} == {basic, standard, premium}
//!
//! update  ──► details absent          → offer fields only
//!             details == []           → ValidationError
//!             entry without offer_type→ ValidationError
//!             entry with offer_type t → replace supplied fields of tier t
//!                                       (tier t must already exist: NotFound)
//! ```
//!
//! A tier's `offer_type` is its identity; nothing here can rename a tier or
//! add a fourth one.

use std::collections::{BTreeSet, HashMap};

use serde::Deserialize;
use ts_rs::TS;

use crate::error::{ValidationError, ValidationErrors};
use crate::money::Money;
use crate::pagination::PageRequest;
use crate::types::OfferType;
use crate::validation::{
    parse_id_param, parse_money_param, validate_at_least_one, validate_features, validate_price,
    validate_title,
};

// =============================================================================
// Payloads
// =============================================================================

/// Raw tier payload as sent by clients; every field optional until validated.
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export)]
pub struct OfferDetailInput {
    pub title: Option<String>,
    pub revisions: Option<i64>,
    pub delivery_time_in_days: Option<i64>,
    #[ts(type = "string | number | null")]
    pub price: Option<Money>,
    pub features: Option<Vec<String>>,
    pub offer_type: Option<String>,
}

/// Raw offer payload, shared by create (POST) and update (PATCH).
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export)]
pub struct OfferInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub details: Option<Vec<OfferDetailInput>>,
}

// =============================================================================
// Create
// =============================================================================

/// A validated tier ready for insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOfferDetail {
    pub title: String,
    pub revisions: i64,
    pub delivery_time_in_days: i64,
    pub price: Money,
    pub features: Vec<String>,
    pub offer_type: OfferType,
}

/// A validated offer with its complete tier set, sorted basic → premium.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOffer {
    pub title: String,
    pub description: String,
    pub image: Option<String>,
    pub details: Vec<NewOfferDetail>,
}

impl NewOffer {
    /// Validates a create payload, collecting every field error.
    pub fn validate(input: OfferInput) -> Result<NewOffer, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let title = match input.title.as_deref() {
            Some(title) => validate_title("title", title).map_err(|e| errors.push(e)).ok(),
            None => {
                errors.push(ValidationError::required("title"));
                None
            }
        };

        let raw_details = match input.details {
            Some(details) => details,
            None => {
                errors.push(ValidationError::required("details"));
                Vec::new()
            }
        };

        let mut details = Vec::with_capacity(raw_details.len());
        for (i, raw) in raw_details.iter().enumerate() {
            if let Some(detail) = validate_new_detail(i, raw, &mut errors) {
                details.push(detail);
            }
        }

        if !raw_details.is_empty() || !errors.has_field("details") {
            check_tier_set(&raw_details, &mut errors);
        }

        errors.into_result()?;

        details.sort_by_key(|d| d.offer_type);
        Ok(NewOffer {
            title: title.unwrap_or_default(),
            description: input.description.unwrap_or_default().trim().to_string(),
            image: normalize_image(input.image),
            details,
        })
    }
}

fn validate_new_detail(
    index: usize,
    raw: &OfferDetailInput,
    errors: &mut ValidationErrors,
) -> Option<NewOfferDetail> {
    let path = |name: &str| format!("details[{index}].{name}");
    let before = errors.len();

    let title = match raw.title.as_deref() {
        Some(t) => validate_title(&path("title"), t).map_err(|e| errors.push(e)).ok(),
        None => {
            errors.push(ValidationError::required(path("title")));
            None
        }
    };

    let revisions = required_at_least_one(&path("revisions"), raw.revisions, errors);
    let delivery = required_at_least_one(&path("delivery_time_in_days"), raw.delivery_time_in_days, errors);

    let price = match raw.price {
        Some(price) => validate_price(&path("price"), price)
            .map(|_| price)
            .map_err(|e| errors.push(e))
            .ok(),
        None => {
            errors.push(ValidationError::required(path("price")));
            None
        }
    };

    let features = validate_features(&path("features"), raw.features.as_deref().unwrap_or_default())
        .map_err(|e| errors.push(e))
        .ok();

    let offer_type = parse_offer_type(&path("offer_type"), raw.offer_type.as_deref(), errors);

    if errors.len() != before {
        return None;
    }

    Some(NewOfferDetail {
        title: title?,
        revisions: revisions?,
        delivery_time_in_days: delivery?,
        price: price?,
        features: features?,
        offer_type: offer_type?,
    })
}

fn required_at_least_one(field: &str, value: Option<i64>, errors: &mut ValidationErrors) -> Option<i64> {
    match value {
        Some(v) => validate_at_least_one(field, v)
            .map(|_| v)
            .map_err(|e| errors.push(e))
            .ok(),
        None => {
            errors.push(ValidationError::required(field));
            None
        }
    }
}

fn parse_offer_type(field: &str, raw: Option<&str>, errors: &mut ValidationErrors) -> Option<OfferType> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => {
            errors.push(ValidationError::required(field));
            None
        }
        Some(raw) => match raw.parse::<OfferType>() {
            Ok(t) => Some(t),
            Err(_) => {
                errors.push(ValidationError::NotAllowed {
                    field: field.to_string(),
                    allowed: OfferType::ALL.iter().map(|t| t.as_str().to_string()).collect(),
                });
                None
            }
        },
    }
}

/// Exactly three details whose types are exactly {basic, standard, premium}.
fn check_tier_set(raw: &[OfferDetailInput], errors: &mut ValidationErrors) {
    if raw.len() != OfferType::ALL.len() {
        errors.push(ValidationError::invalid(
            "details",
            "An offer must contain exactly three details.",
        ));
        return;
    }

    let types: BTreeSet<Option<&str>> = raw.iter().map(|d| d.offer_type.as_deref().map(str::trim)).collect();
    let required: BTreeSet<Option<&str>> = OfferType::ALL.iter().map(|t| Some(t.as_str())).collect();
    if types != required {
        errors.push(ValidationError::invalid(
            "details",
            "Details must include basic, standard and premium types.",
        ));
    }
}

fn normalize_image(image: Option<String>) -> Option<String> {
    image
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

// =============================================================================
// Update
// =============================================================================

/// Replacement values for one existing tier, addressed by its type.
#[derive(Debug, Clone, PartialEq)]
pub struct OfferDetailPatch {
    pub offer_type: OfferType,
    pub title: Option<String>,
    pub revisions: Option<i64>,
    pub delivery_time_in_days: Option<i64>,
    pub price: Option<Money>,
    pub features: Option<Vec<String>>,
}

/// A validated partial update of an offer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OfferPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    /// `Some(None)` clears the image.
    pub image: Option<Option<String>>,
    pub details: Vec<OfferDetailPatch>,
}

impl OfferPatch {
    /// Validates a PATCH payload.
    pub fn validate(input: OfferInput) -> Result<OfferPatch, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let title = input
            .title
            .as_deref()
            .and_then(|t| validate_title("title", t).map_err(|e| errors.push(e)).ok());

        let mut details = Vec::new();
        if let Some(raw_details) = &input.details {
            if raw_details.is_empty() {
                errors.push(ValidationError::invalid(
                    "details",
                    "At least one detail must be provided for update.",
                ));
            } else if raw_details
                .iter()
                .any(|d| d.offer_type.as_deref().map_or(true, |t| t.trim().is_empty()))
            {
                errors.push(ValidationError::invalid(
                    "details",
                    "Each detail must include offer_type for update.",
                ));
            } else {
                details = validate_detail_patches(raw_details, &mut errors);
            }
        }

        errors.into_result()?;

        Ok(OfferPatch {
            title,
            description: input.description.map(|d| d.trim().to_string()),
            image: input.image.map(|i| normalize_image(Some(i))),
            details,
        })
    }
}

fn validate_detail_patches(
    raw_details: &[OfferDetailInput],
    errors: &mut ValidationErrors,
) -> Vec<OfferDetailPatch> {
    let mut seen = BTreeSet::new();
    let mut patches = Vec::with_capacity(raw_details.len());

    for (i, raw) in raw_details.iter().enumerate() {
        let path = |name: &str| format!("details[{i}].{name}");
        let before = errors.len();

        let Some(offer_type) = parse_offer_type(&path("offer_type"), raw.offer_type.as_deref(), errors) else {
            continue;
        };
        if !seen.insert(offer_type) {
            errors.push(ValidationError::invalid(
                "details",
                format!("offer_type '{offer_type}' appears more than once."),
            ));
            continue;
        }

        let title = raw
            .title
            .as_deref()
            .and_then(|t| validate_title(&path("title"), t).map_err(|e| errors.push(e)).ok());
        if let Some(v) = raw.revisions {
            errors.check(validate_at_least_one(&path("revisions"), v));
        }
        if let Some(v) = raw.delivery_time_in_days {
            errors.check(validate_at_least_one(&path("delivery_time_in_days"), v));
        }
        if let Some(price) = raw.price {
            errors.check(validate_price(&path("price"), price));
        }
        let features = raw
            .features
            .as_deref()
            .and_then(|f| validate_features(&path("features"), f).map_err(|e| errors.push(e)).ok());

        if errors.len() == before {
            patches.push(OfferDetailPatch {
                offer_type,
                title,
                revisions: raw.revisions,
                delivery_time_in_days: raw.delivery_time_in_days,
                price: raw.price,
                features,
            });
        }
    }

    patches
}

// =============================================================================
// Listing
// =============================================================================

/// Sort order of offer listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OfferOrdering {
    UpdatedAtAsc,
    #[default]
    UpdatedAtDesc,
    MinPriceAsc,
    MinPriceDesc,
}

impl OfferOrdering {
    /// Picks the first allowed token of a comma-separated `ordering` value;
    /// unknown tokens are ignored.
    pub fn from_param(raw: Option<&str>) -> Self {
        raw.into_iter()
            .flat_map(|s| s.split(','))
            .find_map(|token| match token.trim() {
                "updated_at" => Some(OfferOrdering::UpdatedAtAsc),
                "-updated_at" => Some(OfferOrdering::UpdatedAtDesc),
                "min_price" => Some(OfferOrdering::MinPriceAsc),
                "-min_price" => Some(OfferOrdering::MinPriceDesc),
                _ => None,
            })
            .unwrap_or_default()
    }
}

/// Parsed filters of the public offer listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OfferListQuery {
    pub creator_id: Option<i64>,
    /// Keeps offers whose cheapest tier costs at least this much.
    pub min_price: Option<Money>,
    /// Keeps offers whose fastest tier is delivered within this many days.
    pub max_delivery_time: Option<i64>,
    pub search: Option<String>,
    pub ordering: OfferOrdering,
    pub page: PageRequest,
}

impl OfferListQuery {
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let get = |key: &str| params.get(key).map(String::as_str);

        let creator_id = parse_id_param("creator_id", get("creator_id"))
            .map_err(|e| errors.push(e))
            .ok()
            .flatten();
        let min_price = parse_money_param("min_price", get("min_price"))
            .map_err(|e| errors.push(e))
            .ok()
            .flatten();
        let max_delivery_time = parse_id_param("max_delivery_time", get("max_delivery_time"))
            .map_err(|e| errors.push(e))
            .ok()
            .flatten();
        let page = PageRequest::from_params(params)
            .map_err(|e| errors.push(e))
            .unwrap_or_default();

        errors.into_result()?;

        Ok(OfferListQuery {
            creator_id,
            min_price,
            max_delivery_time,
            search: get("search")
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            ordering: OfferOrdering::from_param(get("ordering")),
            page,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
