//! Listings (apartments)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use estate_gateway::{ApiRequest, Gateway};
use estate_session::{Role, User};

use crate::call::{execute, fetch, segment};
use crate::error::ApiError;
use crate::Result;

const LISTINGS_PATH: &str = "/apartments";

/// Series whose listings must name the developer, complex and section.
pub const ELITE_SERIES: &str = "Элитка";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Section {
    Corner,
    NotCorner,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Repair {
    Designer,
    Euro,
    Good,
    Cosmetic,
    Pso,
    Old,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Furniture {
    Full,
    Partial,
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Apartment {
    pub id: String,
    pub series: String,
    #[serde(default)]
    pub building_company: Option<String>,
    #[serde(default)]
    pub residential_complex: Option<String>,
    #[serde(default)]
    pub section: Option<Section>,
    pub repair: Repair,
    pub district: String,
    pub address: String,
    pub rooms: u8,
    pub total_area: f64,
    pub floor: i32,
    pub total_floors: i32,
    #[serde(default)]
    pub is_basement: bool,
    #[serde(default)]
    pub is_penthouse: bool,
    #[serde(default)]
    pub documents: Vec<String>,
    #[serde(default)]
    pub heating: String,
    #[serde(default)]
    pub description: String,
    pub furniture: Furniture,
    pub price: f64,
    /// Net price, visible to admins only
    #[serde(default)]
    pub price_net: Option<f64>,
    #[serde(default)]
    pub photos: Vec<String>,
    pub user_id: String,
    #[serde(default)]
    pub user: Option<User>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial listing for create and update. Unset fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApartmentDraft {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub series: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub building_company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub residential_complex: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<Section>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repair: Option<Repair>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rooms: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_area: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub floor: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_floors: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_basement: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_penthouse: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documents: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heating: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub furniture: Option<Furniture>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_net: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photos: Option<Vec<String>>,
}

impl ApartmentDraft {
    /// Drop fields the given role may not set.
    pub fn for_role(mut self, role: Role) -> Self {
        if role != Role::Admin {
            self.price_net = None;
        }
        self
    }

    /// Check the fields that are present.
    pub fn validate(&self) -> Result<()> {
        if let Some(rooms) = self.rooms {
            if !(1..=5).contains(&rooms) {
                return Err(invalid("rooms must be between 1 and 5"));
            }
        }
        if matches!(self.total_area, Some(area) if area < 1.0) {
            return Err(invalid("total area must be at least 1"));
        }
        if matches!(self.floor, Some(floor) if floor < 1) {
            return Err(invalid("floor must be at least 1"));
        }
        if matches!(self.total_floors, Some(floors) if floors < 1) {
            return Err(invalid("total floors must be at least 1"));
        }
        if let (Some(floor), Some(total)) = (self.floor, self.total_floors) {
            if floor > total {
                return Err(invalid("floor cannot exceed total floors"));
            }
        }
        if matches!(self.price, Some(price) if price < 0.0)
            || matches!(self.price_net, Some(price) if price < 0.0)
        {
            return Err(invalid("price cannot be negative"));
        }
        if self.series.as_deref() == Some(ELITE_SERIES)
            && (is_blank(&self.building_company)
                || is_blank(&self.residential_complex)
                || self.section.is_none())
        {
            return Err(invalid(
                "elite listings need a building company, residential complex and section",
            ));
        }
        Ok(())
    }

    /// Validate as a new listing: required fields must be set.
    pub fn validate_new(&self) -> Result<()> {
        let missing = [
            ("series", is_blank(&self.series)),
            ("district", is_blank(&self.district)),
            ("address", is_blank(&self.address)),
            ("heating", is_blank(&self.heating)),
            ("repair", self.repair.is_none()),
            ("rooms", self.rooms.is_none()),
            ("totalArea", self.total_area.is_none()),
            ("floor", self.floor.is_none()),
            ("totalFloors", self.total_floors.is_none()),
            ("price", self.price.is_none()),
        ]
        .into_iter()
        .filter(|(_, missing)| *missing)
        .map(|(name, _)| name)
        .collect::<Vec<_>>();

        if !missing.is_empty() {
            return Err(invalid(&format!("missing fields: {}", missing.join(", "))));
        }
        self.validate()
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

fn invalid(message: &str) -> ApiError {
    ApiError::Invalid(message.to_string())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApartmentFilters {
    pub search: Option<String>,
    pub series: Option<String>,
    pub district: Option<String>,
    pub rooms: Option<u8>,
    pub price_min: Option<f64>,
    pub price_max: Option<f64>,
    pub user_id: Option<String>,
}

impl ApartmentFilters {
    /// Agents only see their own listings; admins see everything.
    pub fn scoped_for(mut self, user: &User) -> Self {
        if user.role == Role::Agent {
            self.user_id = Some(user.id.clone());
        }
        self
    }

    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        let mut push = |key: &str, value: Option<String>| {
            if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
                query.push((key.to_string(), value));
            }
        };

        push("search", self.search.clone());
        push("series", self.series.clone());
        push("district", self.district.clone());
        push("rooms", self.rooms.map(|r| r.to_string()));
        push("priceMin", self.price_min.map(|p| p.to_string()));
        push("priceMax", self.price_max.map(|p| p.to_string()));
        push("userId", self.user_id.clone());

        query
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { page: 1, limit: 20 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApartmentPage {
    pub apartments: Vec<Apartment>,
    pub total: u64,
}

#[derive(Clone)]
pub struct ListingsApi {
    gateway: Gateway,
}

impl ListingsApi {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    pub async fn list(&self, page: PageRequest, filters: &ApartmentFilters) -> Result<ApartmentPage> {
        let request = ApiRequest::get(LISTINGS_PATH)
            .with_query("page", page.page.max(1))
            .with_query("limit", page.limit.max(1))
            .with_query_pairs(filters.to_query());

        fetch(&self.gateway, request).await
    }

    pub async fn get(&self, id: &str) -> Result<Apartment> {
        let path = format!("{}/{}", LISTINGS_PATH, segment(id)?);
        fetch(&self.gateway, ApiRequest::get(path)).await
    }

    pub async fn create(&self, draft: &ApartmentDraft) -> Result<Apartment> {
        draft.validate_new()?;
        let request = ApiRequest::post(LISTINGS_PATH).with_json(serde_json::to_value(draft)?);
        let apartment: Apartment = fetch(&self.gateway, request).await?;

        tracing::info!(listing_id = %apartment.id, "Created listing");
        Ok(apartment)
    }

    pub async fn update(&self, id: &str, draft: &ApartmentDraft) -> Result<Apartment> {
        draft.validate()?;
        let path = format!("{}/{}", LISTINGS_PATH, segment(id)?);
        let request = ApiRequest::patch(path).with_json(serde_json::to_value(draft)?);
        fetch(&self.gateway, request).await
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        let path = format!("{}/{}", LISTINGS_PATH, segment(id)?);
        execute(&self.gateway, ApiRequest::delete(path)).await?;

        tracing::info!(listing_id = %id, "Deleted listing");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::call::test_gateway;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn apartment_json(id: &str) -> serde_json::Value {
        json!({
            "id": id,
            "series": "105",
            "repair": "euro",
            "district": "Center",
            "address": "Main st. 1",
            "rooms": 2,
            "totalArea": 54.5,
            "floor": 3,
            "totalFloors": 9,
            "furniture": "partial",
            "price": 65000,
            "userId": "agent-1",
            "createdAt": "2024-05-01T10:00:00Z",
            "updatedAt": "2024-05-02T10:00:00Z"
        })
    }

    fn complete_draft() -> ApartmentDraft {
        ApartmentDraft {
            series: Some("105".into()),
            repair: Some(Repair::Euro),
            district: Some("Center".into()),
            address: Some("Main st. 1".into()),
            heating: Some("central".into()),
            rooms: Some(2),
            total_area: Some(54.5),
            floor: Some(3),
            total_floors: Some(9),
            price: Some(65000.0),
            ..ApartmentDraft::default()
        }
    }

    #[test]
    fn test_apartment_wire_format() {
        let apartment: Apartment = serde_json::from_value(apartment_json("7")).unwrap();
        assert_eq!(apartment.repair, Repair::Euro);
        assert_eq!(apartment.furniture, Furniture::Partial);
        assert!(apartment.section.is_none());
        assert!(apartment.photos.is_empty());

        let section: Section = serde_json::from_str(r#""not-corner""#).unwrap();
        assert_eq!(section, Section::NotCorner);
    }

    #[test]
    fn test_agent_scoping_overrides_user_id() {
        let agent: User = serde_json::from_value(json!({
            "id": "agent-1", "email": "a@x", "fullName": "A", "role": "agent"
        }))
        .unwrap();
        let admin: User = serde_json::from_value(json!({
            "id": "admin-1", "email": "b@x", "fullName": "B", "role": "admin"
        }))
        .unwrap();

        let filters = ApartmentFilters {
            user_id: Some("someone-else".into()),
            ..ApartmentFilters::default()
        };

        assert_eq!(
            filters.clone().scoped_for(&agent).user_id.as_deref(),
            Some("agent-1")
        );
        assert_eq!(
            filters.scoped_for(&admin).user_id.as_deref(),
            Some("someone-else")
        );
    }

    #[test]
    fn test_filters_to_query_skips_empty() {
        let filters = ApartmentFilters {
            search: Some("  ".into()),
            district: Some("Center".into()),
            rooms: Some(3),
            price_max: Some(100000.0),
            ..ApartmentFilters::default()
        };

        assert_eq!(
            filters.to_query(),
            vec![
                ("district".to_string(), "Center".to_string()),
                ("rooms".to_string(), "3".to_string()),
                ("priceMax".to_string(), "100000".to_string()),
            ]
        );
    }

    #[test]
    fn test_draft_validation() {
        assert!(complete_draft().validate_new().is_ok());
        assert!(ApartmentDraft::default().validate().is_ok());

        let missing = ApartmentDraft::default().validate_new().unwrap_err();
        assert!(matches!(missing, ApiError::Invalid(ref m) if m.contains("series")));

        let too_many_rooms = ApartmentDraft {
            rooms: Some(6),
            ..ApartmentDraft::default()
        };
        assert!(too_many_rooms.validate().is_err());

        let floor_above_roof = ApartmentDraft {
            floor: Some(10),
            total_floors: Some(9),
            ..ApartmentDraft::default()
        };
        assert!(floor_above_roof.validate().is_err());

        let elite = ApartmentDraft {
            series: Some(ELITE_SERIES.into()),
            building_company: Some("Builder LLC".into()),
            ..ApartmentDraft::default()
        };
        assert!(elite.validate().is_err());
    }

    #[test]
    fn test_net_price_is_admin_only() {
        let draft = ApartmentDraft {
            price_net: Some(50000.0),
            ..complete_draft()
        };
        assert_eq!(draft.clone().for_role(Role::Agent).price_net, None);
        assert_eq!(draft.for_role(Role::Admin).price_net, Some(50000.0));
    }

    #[tokio::test]
    async fn test_list_sends_page_and_filters() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/apartments")
            .match_header("authorization", "Bearer a1")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("page".into(), "2".into()),
                Matcher::UrlEncoded("limit".into(), "20".into()),
                Matcher::UrlEncoded("district".into(), "Center".into()),
            ]))
            .with_status(200)
            .with_body(json!({"apartments": [apartment_json("1")], "total": 21}).to_string())
            .create_async()
            .await;

        let (gateway, _) = test_gateway(&server.url());
        let api = ListingsApi::new(gateway);
        let filters = ApartmentFilters {
            district: Some("Center".into()),
            ..ApartmentFilters::default()
        };

        let page = api
            .list(PageRequest { page: 2, limit: 20 }, &filters)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(page.total, 21);
        assert_eq!(page.apartments[0].id, "1");
    }

    #[tokio::test]
    async fn test_create_rejects_incomplete_draft_locally() {
        let server = Server::new_async().await;
        let (gateway, _) = test_gateway(&server.url());

        let err = ListingsApi::new(gateway)
            .create(&ApartmentDraft::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Invalid(_)));
    }

    #[tokio::test]
    async fn test_create_and_delete() {
        let mut server = Server::new_async().await;
        let create = server
            .mock("POST", "/apartments")
            .match_body(Matcher::PartialJson(json!({"series": "105", "totalArea": 54.5})))
            .with_status(201)
            .with_body(apartment_json("9").to_string())
            .create_async()
            .await;
        let delete = server
            .mock("DELETE", "/apartments/9")
            .with_status(200)
            .create_async()
            .await;

        let (gateway, _) = test_gateway(&server.url());
        let api = ListingsApi::new(gateway);

        let created = api.create(&complete_draft()).await.unwrap();
        assert_eq!(created.id, "9");
        api.delete(&created.id).await.unwrap();

        create.assert_async().await;
        delete.assert_async().await;
    }

    #[tokio::test]
    async fn test_not_found_and_malformed() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/apartments/404")
            .with_status(404)
            .with_body(r#"{"message":"Apartment not found"}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/apartments/bad")
            .with_status(200)
            .with_body(r#"{"id":"bad"}"#)
            .create_async()
            .await;

        let (gateway, _) = test_gateway(&server.url());
        let api = ListingsApi::new(gateway);

        assert!(matches!(
            api.get("404").await,
            Err(ApiError::NotFound(ref m)) if m == "Apartment not found"
        ));
        assert!(matches!(
            api.get("bad").await,
            Err(ApiError::Malformed { .. })
        ));
    }
}
