mod common;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use serde_json::{Value, json};

use common::TestApp;
use sintropia::config::PaginationLimits;

async fn seed_plantation(app: &TestApp, site_name: &str) -> (i64, i64) {
    let site_id = app
        .create(
            "/api/v1/sites",
            json!({"name": site_name, "length_m": 40, "width_m": 25}),
        )
        .await;
    let plantation_id = app
        .create(
            "/api/v1/plantations",
            json!({"site_id": site_id, "name": "Lower terrace"}),
        )
        .await;
    (site_id, plantation_id)
}

async fn seed_line_plot(app: &TestApp, plantation_id: i64) -> i64 {
    app.create(
        "/api/v1/plots",
        json!({
            "plantation_id": plantation_id,
            "plot_type": "line",
            "length_m": 12,
            "width_m": 1.5,
        }),
    )
    .await
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::new();

    let resp = app.get("/api/v1/health").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["status"], "ok");
    assert_eq!(resp.body["service"], "sintropia-api");
    assert_eq!(resp.body["database"], "ok");
}

#[tokio::test]
async fn test_constants() {
    let app = TestApp::new();

    let resp = app.get("/api/v1/constants").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["success"], true);

    let data = &resp.body["data"];
    assert_eq!(data["strata"][0], "emergente");
    assert_eq!(data["plot_types"], json!(["line", "island", "guild"]));
    assert_eq!(data["plant_roles"], json!(["target", "service", "companion"]));
    assert_eq!(data["statuses"].as_array().unwrap().len(), 8);
}

#[tokio::test]
async fn test_writes_require_authentication() {
    let app = TestApp::new();
    let body = json!({"common_name": "Banana"});

    let resp = app
        .request(Method::POST, "/api/v1/plantas", None, Some(body.clone()))
        .await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp.body["success"], false);
    assert!(resp.headers.contains_key(header::WWW_AUTHENTICATE));

    let resp = app.post("/api/v1/plantas", "bogus", body.clone()).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);

    // A valid token without the key id header is still rejected.
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/plantas")
        .header(header::AUTHORIZATION, "Bearer admin-token")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let resp = app.send(request).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/plantas")
        .header(header::AUTHORIZATION, "Token admin-token")
        .header("x-permapeople-key-id", "any")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let resp = app.send(request).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);

    let resp = app.post("/api/v1/plantas", "admin-token", body).await;
    assert_eq!(resp.status, StatusCode::CREATED);
    assert_eq!(resp.body["data"]["common_name"], "Banana");
}

#[tokio::test]
async fn test_reads_are_public() {
    let app = TestApp::new();
    let id = app
        .create("/api/v1/plantas", json!({"common_name": "Cacao"}))
        .await;

    let resp = app.get(&format!("/api/v1/plantas/{id}")).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["data"]["common_name"], "Cacao");

    // A bad token on a public route is ignored rather than rejected.
    let resp = app.get_as("/api/v1/plantas", "bogus").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["pagination"]["total"], 1);
}

#[tokio::test]
async fn test_species_external_ref_conflict() {
    let app = TestApp::new();
    let body = json!({"common_name": "Banana", "external_ref": "X1"});

    let resp = app.post("/api/v1/plantas", "test-token", body.clone()).await;
    assert_eq!(resp.status, StatusCode::CREATED);
    assert_eq!(resp.body["message"], "species created");

    let resp = app.post("/api/v1/plantas", "test-token", body).await;
    assert_eq!(resp.status, StatusCode::CONFLICT);
    assert_eq!(resp.body["success"], false);
    assert!(resp.body["error"].as_str().unwrap().contains("external_ref"));

    // Blank references never collide.
    app.create("/api/v1/plantas", json!({"common_name": "Cassava"}))
        .await;
    app.create("/api/v1/plantas", json!({"common_name": "Yam"}))
        .await;
}

#[tokio::test]
async fn test_species_validation() {
    let app = TestApp::new();

    let resp = app
        .post("/api/v1/plantas", "test-token", json!({"common_name": "  "}))
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.body["error"], "common name is required");

    let resp = app
        .post(
            "/api/v1/plantas",
            "test-token",
            json!({"common_name": "Inga", "stratum": "gigante"}),
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.body["error"], "invalid stratum");

    let resp = app
        .post("/api/v1/plantas", "test-token", json!({"scientific_name": "Inga edulis"}))
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_requests() {
    let app = TestApp::new();

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/plantas")
        .header(header::AUTHORIZATION, "Bearer test-token")
        .header("x-permapeople-key-id", "any")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let resp = app.send(request).await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.body["success"], false);

    let resp = app.get("/api/v1/plantas/abc").await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.body["error"], "invalid id");

    let resp = app.get("/api/v1/plantas/999").await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_island_plot_requires_diameter() {
    let app = TestApp::new();
    let (_, plantation_id) = seed_plantation(&app, "Finca Norte").await;

    let resp = app
        .post(
            "/api/v1/plots",
            "test-token",
            json!({"plantation_id": plantation_id, "plot_type": "island", "diameter_m": 0}),
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert!(resp.body["error"].as_str().unwrap().contains("diameter"));

    let resp = app
        .post(
            "/api/v1/plots",
            "test-token",
            json!({"plantation_id": plantation_id, "plot_type": "island", "diameter_m": 4}),
        )
        .await;
    assert_eq!(resp.status, StatusCode::CREATED);
    let area = resp.body["data"]["area_m2"].as_f64().unwrap();
    assert!((area - 12.56636).abs() < 1e-9);
}

#[tokio::test]
async fn test_unknown_parent_is_rejected() {
    let app = TestApp::new();

    let resp = app
        .post(
            "/api/v1/plantations",
            "test-token",
            json!({"site_id": 42, "name": "Ghost"}),
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.body["error"], "site 42 does not exist");
}

#[tokio::test]
async fn test_plot_area_and_instance_density() {
    let app = TestApp::new();
    let (site_id, plantation_id) = seed_plantation(&app, "Finca Sur").await;
    let plot_id = seed_line_plot(&app, plantation_id).await;

    let resp = app.get(&format!("/api/v1/sites/{site_id}")).await;
    assert_eq!(resp.body["data"]["effective_area_m2"], 1000.0);

    let resp = app.get(&format!("/api/v1/plots/{plot_id}")).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["data"]["area_m2"], 18.0);

    let species_id = app
        .create("/api/v1/plantas", json!({"common_name": "Banana"}))
        .await;
    let resp = app
        .post(
            "/api/v1/plant-instances",
            "test-token",
            json!({
                "plot_id": plot_id,
                "species_id": species_id,
                "quantity": 9,
                "role": "target",
            }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::CREATED);
    assert_eq!(resp.body["data"]["density_per_m2"], 0.5);
    assert_eq!(resp.body["data"]["status"], "planeada");

    let resp = app
        .get(&format!("/api/v1/plant-instances?plot_id={plot_id}"))
        .await;
    assert_eq!(resp.body["pagination"]["total"], 1);
    assert_eq!(resp.body["data"][0]["density_per_m2"], 0.5);

    let resp = app
        .post(
            "/api/v1/plant-instances",
            "test-token",
            json!({"plot_id": plot_id, "species_id": species_id, "quantity": 0}),
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.body["error"], "quantity must be greater than zero");
}

#[tokio::test]
async fn test_pagination() {
    let app = TestApp::new();
    for i in 0..25 {
        app.create("/api/v1/plantas", json!({"common_name": format!("Inga {i}")}))
            .await;
    }

    let resp = app.get("/api/v1/plantas").await;
    assert_eq!(resp.body["data"].as_array().unwrap().len(), 10);
    assert_eq!(
        resp.body["pagination"],
        json!({"page": 1, "limit": 10, "total": 25, "total_pages": 3})
    );

    let resp = app.get("/api/v1/plantas?page=3&limit=10").await;
    assert_eq!(resp.body["data"].as_array().unwrap().len(), 5);
    assert_eq!(resp.body["pagination"]["page"], 3);

    let resp = app.get("/api/v1/plantas?page=0&limit=-1").await;
    assert_eq!(resp.body["pagination"]["page"], 1);
    assert_eq!(resp.body["pagination"]["limit"], 10);

    let resp = app.get("/api/v1/plantas?limit=5000").await;
    assert_eq!(resp.body["pagination"]["limit"], 100);
    assert_eq!(resp.body["pagination"]["total_pages"], 1);

    let resp = app.get_as("/api/v1/plantas?limit=5000", "user-token").await;
    assert_eq!(resp.body["pagination"]["limit"], 100);

    let resp = app.get_as("/api/v1/plantas?limit=5000", "admin-token").await;
    assert_eq!(resp.body["pagination"]["limit"], 1000);
}

#[tokio::test]
async fn test_configured_pagination_caps() {
    let app = TestApp::with_limits(PaginationLimits {
        default_limit: 10,
        default_max: 20,
        admin_max: 50,
    });

    let resp = app.get("/api/v1/sites?limit=30").await;
    assert_eq!(resp.body["pagination"]["limit"], 20);

    let resp = app.get_as("/api/v1/sites?limit=500", "admin-token").await;
    assert_eq!(resp.body["pagination"]["limit"], 50);
}

#[tokio::test]
async fn test_species_filters() {
    let app = TestApp::new();
    app.create(
        "/api/v1/plantas",
        json!({"common_name": "Juçara", "scientific_name": "Euterpe edulis", "stratum": "alto"}),
    )
    .await;
    app.create(
        "/api/v1/plantas",
        json!({"common_name": "Gliricidia", "function_ecol": "fijador_nitrogeno", "desired": true}),
    )
    .await;
    app.create("/api/v1/plantas", json!({"common_name": "Pumpkin", "stratum": "rastrero"}))
        .await;

    let resp = app.get("/api/v1/plantas?search=euterpe").await;
    assert_eq!(resp.body["pagination"]["total"], 1);
    assert_eq!(resp.body["data"][0]["common_name"], "Juçara");

    let resp = app.get("/api/v1/plantas?stratum=rastrero").await;
    assert_eq!(resp.body["pagination"]["total"], 1);

    let resp = app.get("/api/v1/plantas?desired=true").await;
    assert_eq!(resp.body["pagination"]["total"], 1);
    assert_eq!(resp.body["data"][0]["common_name"], "Gliricidia");

    let resp = app.get("/api/v1/plantas?stratum=").await;
    assert_eq!(resp.body["pagination"]["total"], 3);
}

#[tokio::test]
async fn test_partial_update() {
    let app = TestApp::new();
    let id = app
        .create(
            "/api/v1/plantas",
            json!({"common_name": "Inga", "scientific_name": "Inga edulis", "stratum": "alto"}),
        )
        .await;

    let resp = app
        .put(
            &format!("/api/v1/plantas/{id}"),
            "test-token",
            json!({"notes": "shade for cacao", "desired": true}),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    let data = &resp.body["data"];
    assert_eq!(data["notes"], "shade for cacao");
    assert_eq!(data["desired"], true);
    assert_eq!(data["scientific_name"], "Inga edulis");
    assert_eq!(data["stratum"], "alto");

    let resp = app
        .put(
            &format!("/api/v1/plantas/{id}"),
            "test-token",
            json!({"succession_stage": "tardia"}),
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);

    let resp = app
        .put("/api/v1/plantas/999", "test-token", json!({"notes": "x"}))
        .await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_soft_delete_hides_rows() {
    let app = TestApp::new();
    let id = app
        .create("/api/v1/plantas", json!({"common_name": "Papaya"}))
        .await;

    let resp = app.delete(&format!("/api/v1/plantas/{id}"), "test-token").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body, json!({"success": true, "message": "species deleted"}));

    let resp = app.get(&format!("/api/v1/plantas/{id}")).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);

    let resp = app.get("/api/v1/plantas").await;
    assert_eq!(resp.body["pagination"]["total"], 0);

    let resp = app.delete(&format!("/api/v1/plantas/{id}"), "test-token").await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_site_deletion_rules() {
    let app = TestApp::new();
    let (site_id, plantation_id) = seed_plantation(&app, "Finca Este").await;
    let uri = format!("/api/v1/sites/{site_id}");

    let resp = app.delete(&uri, "user-token").await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);
    assert_eq!(resp.body["success"], false);

    let resp = app.delete(&uri, "admin-token").await;
    assert_eq!(resp.status, StatusCode::CONFLICT);

    let resp = app
        .delete(&format!("/api/v1/plantations/{plantation_id}"), "test-token")
        .await;
    assert_eq!(resp.status, StatusCode::OK);

    let resp = app.delete(&uri, "admin-token").await;
    assert_eq!(resp.status, StatusCode::OK);

    // The name is free again once the site is gone.
    app.create("/api/v1/sites", json!({"name": "Finca Este"}))
        .await;
}

#[tokio::test]
async fn test_duplicate_site_name() {
    let app = TestApp::new();
    app.create("/api/v1/sites", json!({"name": "Finca Oeste"}))
        .await;

    let resp = app
        .post("/api/v1/sites", "test-token", json!({"name": "Finca Oeste"}))
        .await;
    assert_eq!(resp.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_status_transition() {
    let app = TestApp::new();
    let (_, plantation_id) = seed_plantation(&app, "Finca Centro").await;
    let plot_id = seed_line_plot(&app, plantation_id).await;
    let species_id = app
        .create("/api/v1/plantas", json!({"common_name": "Banana"}))
        .await;
    let id = app
        .create(
            "/api/v1/plant-instances",
            json!({"plot_id": plot_id, "species_id": species_id, "quantity": 3}),
        )
        .await;
    let uri = format!("/api/v1/plant-instances/{id}/status");

    let resp = app.patch(&uri, "test-token", json!({"status": "germinacion"})).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["data"]["status"], "germinacion");
    assert_eq!(resp.body["data"]["planted_at"], Value::Null);

    let resp = app.patch(&uri, "test-token", json!({"status": "plantada"})).await;
    assert_eq!(resp.status, StatusCode::OK);
    let planted_at = resp.body["data"]["planted_at"].clone();
    assert!(planted_at.is_string());

    let resp = app.patch(&uri, "test-token", json!({"status": "establecida"})).await;
    assert_eq!(resp.body["data"]["planted_at"], planted_at);

    let resp = app.patch(&uri, "test-token", json!({"status": "flowering"})).await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.body["error"], "invalid status");

    let resp = app
        .request(Method::PATCH, &uri, None, Some(json!({"status": "muerta"})))
        .await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_dependents_block_deletion() {
    let app = TestApp::new();
    let (_, plantation_id) = seed_plantation(&app, "Finca Alta").await;
    let plot_id = seed_line_plot(&app, plantation_id).await;
    let species_id = app
        .create("/api/v1/plantas", json!({"common_name": "Banana"}))
        .await;
    let instance_id = app
        .create(
            "/api/v1/plant-instances",
            json!({"plot_id": plot_id, "species_id": species_id, "quantity": 3}),
        )
        .await;

    let resp = app
        .delete(&format!("/api/v1/plantas/{species_id}"), "test-token")
        .await;
    assert_eq!(resp.status, StatusCode::CONFLICT);

    let resp = app
        .delete(&format!("/api/v1/plots/{plot_id}"), "test-token")
        .await;
    assert_eq!(resp.status, StatusCode::CONFLICT);

    let resp = app
        .delete(&format!("/api/v1/plant-instances/{instance_id}"), "test-token")
        .await;
    assert_eq!(resp.status, StatusCode::OK);

    let resp = app
        .delete(&format!("/api/v1/plots/{plot_id}"), "test-token")
        .await;
    assert_eq!(resp.status, StatusCode::OK);
}

#[tokio::test]
async fn test_suggestion_templates() {
    let app = TestApp::new();
    let (_, plantation_id) = seed_plantation(&app, "Finca Baja").await;

    let resp = app
        .post(
            "/api/v1/suggestion-templates",
            "test-token",
            json!({"plantation_id": plantation_id, "name": "Pioneers", "rules": [1, 2]}),
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);

    let id = app
        .create(
            "/api/v1/suggestion-templates",
            json!({
                "plantation_id": plantation_id,
                "name": "Pioneers",
                "rules": {"density_per_m2": 2.5, "strata": ["alto", "bajo"]},
            }),
        )
        .await;

    let resp = app
        .get(&format!("/api/v1/suggestion-templates?plantation_id={plantation_id}"))
        .await;
    assert_eq!(resp.body["pagination"]["total"], 1);
    assert_eq!(resp.body["data"][0]["rules"]["strata"][1], "bajo");

    let resp = app
        .put(
            &format!("/api/v1/suggestion-templates/{id}"),
            "test-token",
            json!({"name": "Pioneer mix"}),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["data"]["name"], "Pioneer mix");
    assert_eq!(resp.body["data"]["rules"]["density_per_m2"], 2.5);
}

#[tokio::test]
async fn test_page_far_past_the_end() {
    let app = TestApp::new();
    app.create("/api/v1/plantas", json!({"common_name": "Banana"}))
        .await;

    let resp = app.get("/api/v1/plantas?page=9223372036854775807").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["data"], json!([]));
    assert_eq!(resp.body["pagination"]["page"], i64::MAX);
    assert_eq!(resp.body["pagination"]["total"], 1);

    let resp = app
        .get_as("/api/v1/sites?page=9223372036854775807&limit=1000", "admin-token")
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["data"], json!([]));
}

#[tokio::test]
async fn test_species_search_ignores_accented_case() {
    let app = TestApp::new();
    app.create("/api/v1/plantas", json!({"common_name": "Ñame"}))
        .await;
    app.create("/api/v1/plantas", json!({"common_name": "Cacao"}))
        .await;

    // ñame, ÑAME
    for term in ["%C3%B1ame", "%C3%91AME"] {
        let resp = app.get(&format!("/api/v1/plantas?search={term}")).await;
        assert_eq!(resp.status, StatusCode::OK);
        assert_eq!(resp.body["pagination"]["total"], 1);
        assert_eq!(resp.body["data"][0]["common_name"], "Ñame");
    }
}

#[tokio::test]
async fn test_reparent_onto_deleted_parent() {
    let app = TestApp::new();
    let (site_id, plantation_id) = seed_plantation(&app, "Finca Nueva").await;
    let plot_id = seed_line_plot(&app, plantation_id).await;
    let retired = app
        .create(
            "/api/v1/plantations",
            json!({"site_id": site_id, "name": "Upper terrace"}),
        )
        .await;

    let resp = app
        .delete(&format!("/api/v1/plantations/{retired}"), "test-token")
        .await;
    assert_eq!(resp.status, StatusCode::OK);

    let resp = app
        .put(
            &format!("/api/v1/plots/{plot_id}"),
            "test-token",
            json!({"plantation_id": retired}),
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        resp.body["error"],
        format!("plantation {retired} does not exist")
    );

    let resp = app
        .put(
            &format!("/api/v1/plots/{plot_id}"),
            "test-token",
            json!({"plantation_id": 4242}),
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);

    let resp = app.get(&format!("/api/v1/plots/{plot_id}")).await;
    assert_eq!(resp.body["data"]["plantation_id"], plantation_id);

    let template_id = app
        .create(
            "/api/v1/suggestion-templates",
            json!({"plantation_id": plantation_id, "name": "Pioneers"}),
        )
        .await;
    let resp = app
        .put(
            &format!("/api/v1/suggestion-templates/{template_id}"),
            "test-token",
            json!({"plantation_id": retired}),
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
}
