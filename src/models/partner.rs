use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Durations (minutes) every partner quotes a price for.
pub const PRICE_DURATIONS: [u32; 3] = [60, 90, 120];

pub const BIO_MAX_CHARS: usize = 250;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubType {
    HomeService,
    Place,
}

impl SubType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubType::HomeService => "home_service",
            SubType::Place => "place",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "home_service" => Some(SubType::HomeService),
            "place" => Some(SubType::Place),
            _ => None,
        }
    }

    pub fn default_display_name(&self) -> &'static str {
        match self {
            SubType::HomeService => "New Therapist",
            SubType::Place => "New Massage Place",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Online,
    #[default]
    Offline,
    Busy,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Online => "online",
            Status::Offline => "offline",
            Status::Busy => "busy",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    pub duration: u32,
    pub price: u64,
}

/// A partner's profile row. One per `user_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Partner {
    pub user_id: String,
    pub name: String,
    #[serde(rename = "type", default = "default_kind")]
    pub kind: String,
    pub sub_type: SubType,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub header_image_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_card_image_url: Option<String>,
    #[serde(default)]
    pub gallery_image_urls: Vec<String>,
    #[serde(default)]
    pub whatsapp: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub massage_types: BTreeSet<String>,
    #[serde(default)]
    pub prices: Vec<Price>,
    #[serde(default)]
    pub booked_dates: BTreeSet<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opening_hours: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub other_services: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub years_of_experience: Option<u32>,
}

fn default_kind() -> String {
    "massage".to_string()
}

impl Partner {
    /// A fresh profile with the onboarding defaults filled in.
    pub fn new_default(user_id: &str, sub_type: SubType, header_image_url: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            name: sub_type.default_display_name().to_string(),
            kind: default_kind(),
            sub_type,
            location: String::new(),
            status: Status::Offline,
            rating: 0.0,
            image_url: String::new(),
            header_image_url: header_image_url.to_string(),
            id_card_image_url: None,
            gallery_image_urls: Vec::new(),
            whatsapp: String::new(),
            bio: String::new(),
            massage_types: BTreeSet::new(),
            prices: normalize_prices(&[]),
            booked_dates: BTreeSet::new(),
            opening_hours: None,
            other_services: Vec::new(),
            years_of_experience: None,
        }
    }

    pub fn apply(&mut self, patch: &ProfilePatch) {
        if let Some(v) = &patch.name {
            self.name = v.clone();
        }
        if let Some(v) = &patch.location {
            self.location = v.clone();
        }
        if let Some(v) = patch.status {
            self.status = v;
        }
        if let Some(v) = &patch.image_url {
            self.image_url = v.clone();
        }
        if let Some(v) = &patch.header_image_url {
            self.header_image_url = v.clone();
        }
        if let Some(v) = &patch.id_card_image_url {
            self.id_card_image_url = Some(v.clone());
        }
        if let Some(v) = &patch.gallery_image_urls {
            self.gallery_image_urls = v.clone();
        }
        if let Some(v) = &patch.whatsapp {
            self.whatsapp = v.clone();
        }
        if let Some(v) = &patch.bio {
            self.bio = v.clone();
        }
        if let Some(v) = &patch.massage_types {
            self.massage_types = v.clone();
        }
        if let Some(v) = &patch.prices {
            self.prices = v.clone();
        }
        if let Some(v) = &patch.booked_dates {
            self.booked_dates = v.clone();
        }
        if let Some(v) = &patch.opening_hours {
            self.opening_hours = Some(v.clone());
        }
        if let Some(v) = &patch.other_services {
            self.other_services = v.clone();
        }
        if let Some(v) = patch.years_of_experience {
            self.years_of_experience = Some(v);
        }
    }
}

/// Partial profile update. Only the fields that are set get written.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfilePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header_image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_card_image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gallery_image_urls: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whatsapp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub massage_types: Option<BTreeSet<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prices: Option<Vec<Price>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub booked_dates: Option<BTreeSet<NaiveDate>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opening_hours: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other_services: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub years_of_experience: Option<u32>,
}

impl ProfilePatch {
    pub fn is_empty(&self) -> bool {
        *self == ProfilePatch::default()
    }
}

/// Returns one entry per standard duration, keeping existing prices and
/// filling gaps with zero. Non-standard durations are dropped.
pub fn normalize_prices(prices: &[Price]) -> Vec<Price> {
    PRICE_DURATIONS
        .iter()
        .map(|&duration| {
            prices
                .iter()
                .find(|p| p.duration == duration)
                .copied()
                .unwrap_or(Price { duration, price: 0 })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_prices_fills_missing_durations() {
        let prices = normalize_prices(&[Price { duration: 90, price: 250_000 }]);
        assert_eq!(
            prices,
            vec![
                Price { duration: 60, price: 0 },
                Price { duration: 90, price: 250_000 },
                Price { duration: 120, price: 0 },
            ]
        );
    }

    #[test]
    fn test_normalize_prices_drops_unknown_durations() {
        let prices = normalize_prices(&[Price { duration: 45, price: 1 }]);
        assert!(prices.iter().all(|p| p.duration != 45));
        assert_eq!(prices.len(), 3);
    }

    #[test]
    fn test_partner_row_deserializes_with_missing_optionals() {
        let row = serde_json::json!({
            "user_id": "u1",
            "name": "Ayu",
            "type": "massage",
            "sub_type": "place",
            "status": "busy",
            "booked_dates": ["2024-12-25"]
        });
        let partner: Partner = serde_json::from_value(row).unwrap();
        assert_eq!(partner.sub_type, SubType::Place);
        assert_eq!(partner.status, Status::Busy);
        assert!(partner.booked_dates.contains(&NaiveDate::from_ymd_opt(2024, 12, 25).unwrap()));
        assert!(partner.prices.is_empty());
    }

    #[test]
    fn test_apply_patch_only_touches_set_fields() {
        let mut partner = Partner::new_default("u1", SubType::HomeService, "h.png");
        let patch = ProfilePatch {
            status: Some(Status::Online),
            bio: Some("Balinese specialist".to_string()),
            ..Default::default()
        };
        partner.apply(&patch);
        assert_eq!(partner.status, Status::Online);
        assert_eq!(partner.bio, "Balinese specialist");
        assert_eq!(partner.name, "New Therapist");
        assert_eq!(partner.header_image_url, "h.png");
    }

    #[test]
    fn test_patch_serializes_only_set_fields() {
        let patch = ProfilePatch {
            status: Some(Status::Busy),
            ..Default::default()
        };
        let value = serde_json::to_value(&patch).unwrap();
        assert_eq!(value, serde_json::json!({"status": "busy"}));
    }
}
