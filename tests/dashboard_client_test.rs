use chrono::NaiveDate;
use delivery_api::{
    client::{ApiClient, ClientConfig, SessionContext},
    reports::{ReportPeriod, ReportsClient},
    statuses::{NewStatus, StatusCategory, StatusRegistry},
};
use rust_decimal_macros::dec;
use serde_json::json;
use wiremock::{
    matchers::{method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

fn api(server: &MockServer) -> ApiClient {
    ApiClient::new(
        ClientConfig::new(format!("{}/api/v1", server.uri())),
        SessionContext::with_token("dashboard-token"),
    )
    .unwrap()
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
}

#[tokio::test]
async fn monthly_report_is_requested_with_its_date_range() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/financial/reports"))
        .and(query_param("period", "month"))
        .and(query_param("date_from", "2024-03-01"))
        .and(query_param("date_to", "2024-03-15"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "totalRevenue": 120000,
            "totalExpenses": 30000,
            "completedDeliveries": 24,
            "totalExpenseTransactions": 6
        })))
        .expect(1)
        .mount(&server)
        .await;

    let report = ReportsClient::new(api(&server))
        .fetch(ReportPeriod::Month, today())
        .await;

    assert_eq!(report.summary.net_profit, dec!(90000));
    assert_eq!(report.summary.profit_margin, dec!(75));
    assert_eq!(report.summary.average_revenue_per_delivery, dec!(5000));
}

#[tokio::test]
async fn failed_report_yields_an_empty_one() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/financial/reports"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let report = ReportsClient::new(api(&server))
        .fetch(ReportPeriod::Today, today())
        .await;

    assert_eq!(report, delivery_api::reports::FinancialReport::empty());
}

#[tokio::test]
async fn statuses_load_overlays_server_categories() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/settings/statuses"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "statuses": {
                "drivers": [{
                    "id": 101, "name": "Available", "label": "Disponible",
                    "color": "success", "icon": "tabler-user-check",
                    "isDefault": true, "canEdit": false, "category": "drivers"
                }, {
                    "id": 105, "name": "On Break", "label": "En pause",
                    "color": "info", "icon": "tabler-coffee",
                    "isDefault": false, "canEdit": true, "category": "drivers"
                }]
            }
        })))
        .mount(&server)
        .await;

    let mut registry = StatusRegistry::new();
    registry.load(&api(&server)).await.unwrap();

    assert_eq!(registry.by_category(StatusCategory::Drivers).len(), 2);
    assert_eq!(registry.label(StatusCategory::Drivers, "on-break"), "En pause");
    assert_eq!(registry.by_category(StatusCategory::Deliveries).len(), 5);
}

#[tokio::test]
async fn unknown_server_category_does_not_discard_known_ones() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/settings/statuses"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "statuses": {
                "clients": [{
                    "id": 304, "name": "VIP", "label": "VIP",
                    "color": "primary", "icon": "tabler-star",
                    "isDefault": false, "canEdit": true, "category": "clients"
                }],
                "vehicles": [{
                    "id": 401, "name": "Parked", "label": "Garé",
                    "color": "info", "icon": "tabler-parking",
                    "isDefault": false, "canEdit": true, "category": "vehicles"
                }]
            }
        })))
        .mount(&server)
        .await;

    let mut registry = StatusRegistry::new();
    registry.load(&api(&server)).await.unwrap();

    let clients = registry.by_category(StatusCategory::Clients);
    assert_eq!(clients.len(), 1);
    assert_eq!(clients[0].id(), 304);
    assert_eq!(registry.label(StatusCategory::Clients, "vip"), "VIP");
    assert_eq!(registry.by_category(StatusCategory::Drivers).len(), 4);
}

#[tokio::test]
async fn failed_load_restores_defaults() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/settings/statuses"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let mut registry = StatusRegistry::new();
    registry
        .add(
            StatusCategory::Clients,
            NewStatus {
                name: "VIP".into(),
                label: "VIP".into(),
                color: "primary".into(),
                icon: "tabler-star".into(),
                description: String::new(),
            },
        )
        .unwrap();

    assert!(registry.load(&api(&server)).await.is_err());
    assert_eq!(registry, StatusRegistry::new());
}

#[tokio::test]
async fn save_posts_every_category() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/settings/statuses"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;

    StatusRegistry::new().save(&api(&server)).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    let statuses = &body["statuses"];
    for category in ["deliveries", "drivers", "partners", "clients"] {
        assert!(statuses[category].is_array(), "missing {}", category);
    }
    assert_eq!(statuses["deliveries"][0]["name"], "Pending");
    assert_eq!(statuses["deliveries"][0]["isDefault"], true);
}
