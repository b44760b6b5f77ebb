#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{Duration as Days, NaiveDate};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde_json::{json, Value};

use minetrack_api::auth::{generate_jwt, Claims, Role};
use minetrack_api::database::{MemoryStore, TableId};
use minetrack_api::{app, AppState};

pub const ADMIN_ID: i64 = 1;
pub const MINE_PLANNER_ID: i64 = 2;
pub const SHIPPING_PLANNER_ID: i64 = 3;

/// In-process server over a seeded `MemoryStore`, one per test
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub store: Arc<MemoryStore>,
    pub admin_token: String,
    pub mine_planner_token: String,
    pub shipping_planner_token: String,
    client: reqwest::Client,
}

impl TestServer {
    pub async fn spawn() -> Result<Self> {
        let store = Arc::new(MemoryStore::new());
        let admin_token = issue(ADMIN_ID, Role::Admin)?;
        let mine_planner_token = issue(MINE_PLANNER_ID, Role::MinePlanner)?;
        let shipping_planner_token = issue(SHIPPING_PLANNER_ID, Role::ShippingPlanner)?;

        store
            .seed(TableId::Users, vec![
                user(ADMIN_ID, "Admin", "admin@example.com", Role::Admin, &admin_token),
                user(MINE_PLANNER_ID, "Raka", "raka@example.com", Role::MinePlanner, &mine_planner_token),
                user(SHIPPING_PLANNER_ID, "Sari", "sari@example.com", Role::ShippingPlanner, &shipping_planner_token),
            ])
            .await;
        seed_fixtures(&store).await;

        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .context("failed to bind test listener")?;

        let router = app(AppState::new(store.clone()));
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        let server = Self {
            port,
            base_url,
            store,
            admin_token,
            mine_planner_token,
            shipping_planner_token,
            client: reqwest::Client::new(),
        };
        server.wait_ready(Duration::from_secs(5)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = tokio::time::Instant::now() + timeout;
        while tokio::time::Instant::now() < deadline {
            if let Ok(resp) = self.client.get(self.url("/health")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn request(&self, method: Method, path: &str, token: Option<&str>) -> RequestBuilder {
        let builder = self.client.request(method, self.url(path));
        match token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send and decode, returning the status and JSON body
    pub async fn call(&self, method: Method, path: &str, token: Option<&str>, body: Option<Value>) -> Result<(StatusCode, Value)> {
        let mut builder = self.request(method, path, token);
        if let Some(body) = body {
            builder = builder.json(&body);
        }
        let res = builder.send().await?;
        let status = res.status();
        let body = res.json::<Value>().await.unwrap_or(Value::Null);
        Ok((status, body))
    }

    pub async fn get(&self, path: &str, token: &str) -> Result<(StatusCode, Value)> {
        self.call(Method::GET, path, Some(token), None).await
    }
}

fn issue(id: i64, role: Role) -> Result<String> {
    Ok(generate_jwt(&Claims::new(id, role))?)
}

fn user(id: i64, nama: &str, email: &str, role: Role, token: &str) -> Value {
    json!({
        "id": id, "nama": nama, "email": email, "role": role.as_str(),
        "token": token, "updated_at": null
    })
}

fn day(offset: i64) -> String {
    let base = NaiveDate::from_ymd_opt(2025, 1, 1).expect("valid date");
    (base + Days::days(offset)).format("%Y-%m-%d").to_string()
}

/// Mines, 25 daily capacity rows, weather readings sharing dates, roads and
/// shipping schedules. Equipment starts empty.
async fn seed_fixtures(store: &MemoryStore) {
    store
        .seed(TableId::Mines, vec![
            json!({"mine_id": "M01", "mine_name": "Tanjung Enim", "location": "Sumsel", "region": "South",
                   "start_date": "2010-05-01", "status": "active", "remarks": null}),
            json!({"mine_id": "M02", "mine_name": "Sangatta", "location": "Kaltim", "region": "East",
                   "start_date": "2012-03-15", "status": "active", "remarks": null}),
            json!({"mine_id": "M03", "mine_name": "Satui", "location": "Kalsel", "region": "South",
                   "start_date": null, "status": "planned", "remarks": "no start date yet"}),
        ])
        .await;

    let capacity = (0..25)
        .map(|i| {
            json!({
                "effcap_id": format!("EFC{:04}", i + 1), "mine_id": "M01", "equipment_id": "EQ001",
                "week_start": day(i), "distance_km": 12.5, "road_condition": "good",
                "weather_condition": "dry", "availability_pct": 90, "effective_capacity_ton_day": 1200,
                "remark": null
            })
        })
        .collect();
    store.seed(TableId::EffectiveCapacity, capacity).await;

    // Two readings per day over three days
    let weather = (0..6)
        .map(|i| {
            json!({
                "weather_id": format!("W{:03}", i + 1), "mine_id": "M01", "date": day(i / 2),
                "rainfall_mm": 10 + i, "wind_speed_kmh": 5, "humidity_pct": 80, "remark": null
            })
        })
        .collect();
    store.seed(TableId::Weather, weather).await;

    store
        .seed(TableId::Roads, vec![json!({
            "road_id": "R001", "mine_id": "M01", "segment_name": "Haul road A", "condition_level": "good",
            "accessibility_pct": 95, "last_inspection": "2025-01-10", "remark": null
        })])
        .await;

    store
        .seed(TableId::Shipping, vec![json!({
            "shipment_id": "SHP0001", "mine_id": "M01", "week_start": "2025-01-06", "vessel_name": "MV Borneo",
            "destination_port": "Tarahan", "coal_tonnage": 50000, "etd": "2025-01-08", "eta": "2025-01-12",
            "status": "scheduled"
        })])
        .await;
}
