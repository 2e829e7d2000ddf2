//! Response bodies that are shaped differently from the domain types.

use serde::Serialize;

use coderr_core::{Money, Offer, OfferDetail, OfferSummary, OfferWithDetails, UserDetails};

/// `POST /registration/` and `POST /login/` response.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub username: String,
    pub email: String,
    pub user_id: i64,
}

/// Link to a single tier.
#[derive(Debug, Serialize)]
pub struct DetailLink {
    pub id: i64,
    pub url: String,
}

impl DetailLink {
    pub fn new(id: i64) -> Self {
        DetailLink {
            id,
            url: format!("/api/offerdetails/{id}/"),
        }
    }
}

/// Row of `GET /offers/`.
#[derive(Debug, Serialize)]
pub struct OfferListItem {
    #[serde(flatten)]
    pub offer: Offer,
    pub details: Vec<DetailLink>,
    pub min_price: Option<Money>,
    pub min_delivery_time: Option<i64>,
    pub user_details: UserDetails,
}

impl From<OfferSummary> for OfferListItem {
    fn from(summary: OfferSummary) -> Self {
        OfferListItem {
            offer: summary.offer,
            details: summary.detail_ids.into_iter().map(DetailLink::new).collect(),
            min_price: summary.min_price,
            min_delivery_time: summary.min_delivery_time,
            user_details: summary.user_details,
        }
    }
}

/// `GET /offers/{id}/`: tiers as links plus the computed minimums.
#[derive(Debug, Serialize)]
pub struct OfferView {
    #[serde(flatten)]
    pub offer: Offer,
    pub details: Vec<DetailLink>,
    pub min_price: Option<Money>,
    pub min_delivery_time: Option<i64>,
}

impl From<OfferWithDetails> for OfferView {
    fn from(offer: OfferWithDetails) -> Self {
        let min_price = offer.min_price();
        let min_delivery_time = offer.min_delivery_time();
        OfferView {
            details: offer.details.iter().map(|d| DetailLink::new(d.id)).collect(),
            offer: offer.offer,
            min_price,
            min_delivery_time,
        }
    }
}

/// `POST /offers/` and `PATCH /offers/{id}/`: every tier in full.
#[derive(Debug, Serialize)]
pub struct OfferWritten {
    pub id: i64,
    pub title: String,
    pub image: Option<String>,
    pub description: String,
    pub details: Vec<OfferDetail>,
}

impl From<OfferWithDetails> for OfferWritten {
    fn from(offer: OfferWithDetails) -> Self {
        OfferWritten {
            id: offer.offer.id,
            title: offer.offer.title,
            image: offer.offer.image,
            description: offer.offer.description,
            details: offer.details,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OrderCount {
    pub order_count: i64,
}

#[derive(Debug, Serialize)]
pub struct CompletedOrderCount {
    pub completed_order_count: i64,
}

/// `GET /health` response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: bool,
    pub version: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use coderr_core::OfferType;

    #[test]
    fn test_offer_view_shape() {
        let now = Utc::now();
        let detail = |id: i64, price: i64, days: i64, offer_type: OfferType| OfferDetail {
            id,
            offer_id: 1,
            title: "Tier".to_string(),
            revisions: 1,
            delivery_time_in_days: days,
            price: Money::from_units(price),
            features: vec![],
            offer_type,
        };
        let offer = OfferWithDetails {
            offer: Offer {
                id: 1,
                user_id: 9,
                title: "Logo".to_string(),
                image: None,
                description: String::new(),
                created_at: now,
                updated_at: now,
            },
            details: vec![
                detail(4, 10, 3, OfferType::Basic),
                detail(5, 30, 5, OfferType::Standard),
                detail(6, 80, 10, OfferType::Premium),
            ],
        };

        let json = serde_json::to_value(OfferView::from(offer)).unwrap();
        assert_eq!(json["user"], 9);
        assert_eq!(json["min_price"], "10.00");
        assert_eq!(json["min_delivery_time"], 3);
        assert_eq!(json["details"][1]["url"], "/api/offerdetails/5/");
    }
}
