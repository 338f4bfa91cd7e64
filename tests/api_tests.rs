use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use serde_json::{json, Value};
use std::{sync::Arc, time::Duration};

use reelrank::{
    db::Catalog,
    error::AppResult,
    routes::{create_router, AppState},
    services::{
        providers::{embedding::EmbeddingProvider, explanation::TemplateExplainer},
        recommendations::Recommender,
        scoring::Weights,
        similarity::SimilarityEngine,
    },
};

const CATALOG: &str = r#"{
    "films": [
        { "FilmID": 1, "Film": "Film A", "Categorie": "Thriller", "Description": "film A", "Annee": 1975, "Langue": "English" },
        { "FilmID": 2, "Film": "Film B", "Categorie": "Comédie", "Description": "film B", "Annee": 2015, "Langue": "French" },
        { "FilmID": 3, "Film": "Film C", "Categorie": "Thriller", "Description": "film C", "Annee": 2015, "Langue": "English",
          "Realisateur": "Jane Doe" }
    ],
    "blocs": ["Thriller", "Comédie"]
}"#;

/// Query embeds to [1, 0]; films A, B and C get cosines 0.8, 0.2 and 0.5
struct FixedEmbedder;

#[async_trait::async_trait]
impl EmbeddingProvider for FixedEmbedder {
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let raw: f32 = match text {
            "film A" => 0.8,
            "film B" => 0.2,
            "film C" => 0.5,
            _ => return Ok(vec![1.0, 0.0]),
        };
        Ok(vec![raw, (1.0 - raw * raw).sqrt()])
    }

    fn name(&self) -> &'static str {
        "fixed"
    }
}

fn create_test_server(catalog: Catalog) -> TestServer {
    let catalog = Arc::new(catalog);
    let similarity = Arc::new(SimilarityEngine::new(Arc::new(FixedEmbedder), catalog.clone()));
    let recommender = Recommender::new(
        catalog,
        similarity,
        Arc::new(TemplateExplainer::new(420)),
        Weights::default(),
        5,
        Duration::from_secs(1),
    );

    let app = create_router(Arc::new(AppState::new(recommender)));
    TestServer::new(app).unwrap()
}

fn server() -> TestServer {
    create_test_server(Catalog::from_json_str(CATALOG).unwrap())
}

fn scenario_body() -> Value {
    json!({
        "description": "un thriller des années 70",
        "ambiance": "tendu",
        "periode": "Classiques (avant 1980)",
        "langue": "Anglais",
        "preferences": { "Thriller": 5, "Comédie": 1 }
    })
}

#[tokio::test]
async fn test_health_check() {
    let response = server().get("/health").await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["explainer"], "template");
    assert_eq!(body["films"], 3);
}

#[tokio::test]
async fn test_request_id_echoed() {
    let id = "6f1c2b0e-8a4d-4c1f-9a57-3f3e2d1c0b9a";
    let response = server()
        .get("/health")
        .add_header(
            HeaderName::from_static("x-request-id"),
            HeaderValue::from_static(id),
        )
        .await;

    assert_eq!(response.header("x-request-id"), id);
}

#[tokio::test]
async fn test_recommendations_ranked() {
    let response = server()
        .post("/api/v1/recommendations")
        .json(&scenario_body())
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    let items = body["recommendations"].as_array().unwrap();
    let titles: Vec<_> = items.iter().map(|r| r["film"]["title"].as_str().unwrap()).collect();
    assert_eq!(titles, vec!["Film A", "Film C", "Film B"]);

    let first = &items[0];
    assert_eq!(first["rank"], 1);
    assert_eq!(first["breakdown"]["genre"], 1.0);
    assert_eq!(first["breakdown"]["period"], 1.0);
    assert_eq!(first["breakdown"]["language"], 1.0);
    assert!(first["explanation"].as_str().unwrap().starts_with("Film A"));

    let last = &items[2];
    assert_eq!(last["breakdown"]["genre"], 0.0);
    assert_eq!(last["breakdown"]["language"], 0.0);

    assert_eq!(body["stats"]["considered"], 3);
    assert_eq!(body["stats"]["semantic_fallback"], false);
    assert_eq!(body["category_distribution"]["Thriller"], 2);
    assert_eq!(body["genre_profile"]["Thriller"], 5);
}

#[tokio::test]
async fn test_people_bonus_lifts_mentioned_director() {
    let mut body = scenario_body();
    body["realisateurs"] = json!("jane doe");
    body["top_k"] = json!(2);

    let response = server().post("/api/v1/recommendations").json(&body).await;
    response.assert_status_ok();

    let body: Value = response.json();
    let items = body["recommendations"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["film"]["title"], "Film C");
    assert_eq!(items[0]["breakdown"]["people_bonus"], 0.2);
}

#[tokio::test]
async fn test_missing_description_rejected() {
    let response = server()
        .post("/api/v1/recommendations")
        .json(&json!({ "description": "   ", "ambiance": "tendu" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("description"));
}

#[tokio::test]
async fn test_out_of_range_rating_rejected() {
    let mut body = scenario_body();
    body["preferences"] = json!({ "Thriller": 9 });

    let response = server().post("/api/v1/recommendations").json(&body).await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_period_rejected() {
    let mut body = scenario_body();
    body["periode"] = json!("Années 70");

    let response = server().post("/api/v1/recommendations").json(&body).await;
    assert!(response.status_code().is_client_error());
}

#[tokio::test]
async fn test_empty_catalog_returns_empty_ranking() {
    let response = create_test_server(Catalog::empty())
        .post("/api/v1/recommendations")
        .json(&scenario_body())
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert!(body["recommendations"].as_array().unwrap().is_empty());
    assert_eq!(body["stats"]["considered"], 0);
}

#[tokio::test]
async fn test_irregular_catalog_entries_still_ranked() {
    let catalog = Catalog::from_json_str(
        r#"{ "films": [
            { "FilmID": 1, "Film": "Film A", "Categorie": "Thriller", "Description": "film A",
              "Annee": 1975, "Year": 1975, "Langue": "eng", "Language": "English" },
            { "FilmID": 2, "Film": "Film B", "Categorie": "Comédie", "Description": "film B",
              "Keywords": null, "Annee": null, "Langue": "fra", "Realisateur": null },
            { "FilmID": 3, "Film": "Film C", "Categorie": "Thriller", "Description": "film C",
              "Annee": 2015, "Langue": "en-US" }
        ] }"#,
    )
    .unwrap();
    let server = create_test_server(catalog);

    let films: Vec<Value> = server.get("/api/v1/catalog/films").await.json();
    assert_eq!(films.len(), 3);

    let response = server
        .post("/api/v1/recommendations")
        .json(&scenario_body())
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    let items = body["recommendations"].as_array().unwrap();
    let titles: Vec<_> = items.iter().map(|r| r["film"]["title"].as_str().unwrap()).collect();
    assert_eq!(titles, vec!["Film A", "Film C", "Film B"]);
    assert_eq!(items[0]["breakdown"]["language"], 1.0);
    assert_eq!(items[1]["breakdown"]["language"], 1.0);
    assert_eq!(items[2]["breakdown"]["language"], 0.0);
}

#[tokio::test]
async fn test_catalog_endpoints() {
    let server = server();

    let response = server.get("/api/v1/catalog").await;
    response.assert_status_ok();
    let stats: Value = response.json();
    assert_eq!(stats["films"], 3);
    assert_eq!(stats["categories"], json!(["Thriller", "Comédie"]));

    let response = server.get("/api/v1/catalog/films").await;
    response.assert_status_ok();
    let films: Vec<Value> = response.json();
    assert_eq!(films.len(), 3);
    assert_eq!(films[0]["id"], 1);
    assert_eq!(films[2]["director"], "Jane Doe");
}
