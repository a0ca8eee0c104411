use std::sync::Arc;

use reqwest::StatusCode;
use serde_json::json;

use motorpool_api::app::{build_app_with, services::build_services};
use motorpool_core::UserId;
use motorpool_infra::InMemoryStore;

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod, over an in-memory store, on an ephemeral port.
        let services = Arc::new(build_services(Arc::new(InMemoryStore::new())));
        let app = build_app_with(services);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn token() -> String {
    UserId::new().to_string()
}

async fn create_shop(
    client: &reqwest::Client,
    base_url: &str,
    token: &str,
    admin_only_lists: bool,
) -> serde_json::Value {
    let res = client
        .post(format!("{}/shops", base_url))
        .bearer_auth(token)
        .json(&json!({ "name": "Bravo Motor Pool", "admin_only_lists": admin_only_lists }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    res.json().await.unwrap()
}

async fn join_shop(client: &reqwest::Client, base_url: &str, admin: &str, shop_id: &str) -> String {
    let res = client
        .post(format!("{}/shops/{}/invites", base_url, shop_id))
        .bearer_auth(admin)
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let invite: serde_json::Value = res.json().await.unwrap();

    let member = token();
    let res = client
        .post(format!("{}/invites/redeem", base_url))
        .bearer_auth(&member)
        .json(&json!({ "code": invite["code"] }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    member
}

#[tokio::test]
async fn health_is_public_but_everything_else_requires_auth() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/health", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .get(format!("{}/shops", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    // A bearer token that is not a uuid is rejected before routing.
    let res = client
        .get(format!("{}/shops", srv.base_url))
        .bearer_auth("not-a-uuid")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn shop_visibility_is_member_scoped() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let admin = token();
    let shop = create_shop(&client, &srv.base_url, &admin, false).await;
    let shop_id = shop["id"].as_str().unwrap();

    let res = client
        .get(format!("{}/shops", srv.base_url))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["items"].as_array().unwrap().len(), 1);

    // An outsider sees a 403, not the shop.
    let res = client
        .get(format!("{}/shops/{}", srv.base_url, shop_id))
        .bearer_auth(token())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "forbidden");
}

#[tokio::test]
async fn invite_lifecycle_single_use_admits_one_member() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let admin = token();
    let shop = create_shop(&client, &srv.base_url, &admin, false).await;
    let shop_id = shop["id"].as_str().unwrap();

    let res = client
        .post(format!("{}/shops/{}/invites", srv.base_url, shop_id))
        .bearer_auth(&admin)
        .json(&json!({ "max_uses": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let invite: serde_json::Value = res.json().await.unwrap();
    let code = invite["code"].as_str().unwrap();

    // B redeems the single use.
    let b = token();
    let res = client
        .post(format!("{}/invites/redeem", srv.base_url))
        .bearer_auth(&b)
        .json(&json!({ "code": code }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // C finds the code exhausted.
    let res = client
        .post(format!("{}/invites/redeem", srv.base_url))
        .bearer_auth(token())
        .json(&json!({ "code": code }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::GONE);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invite_code_exhausted");

    // B redeeming again is a conflict, not another use.
    let res = client
        .post(format!("{}/invites/redeem", srv.base_url))
        .bearer_auth(&b)
        .json(&json!({ "code": code }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "already_member");

    // An unknown code is a 400.
    let res = client
        .post(format!("{}/invites/redeem", srv.base_url))
        .bearer_auth(token())
        .json(&json!({ "code": "ZZ99ZZ99" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invite_code_invalid");

    let res = client
        .get(format!("{}/shops/{}/members", srv.base_url, shop_id))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["items"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn admin_only_lists_gate_applies_over_http() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let admin = token();
    let shop = create_shop(&client, &srv.base_url, &admin, true).await;
    let shop_id = shop["id"].as_str().unwrap();
    let member = join_shop(&client, &srv.base_url, &admin, shop_id).await;

    let res = client
        .post(format!("{}/shops/{}/lists", srv.base_url, shop_id))
        .bearer_auth(&member)
        .json(&json!({ "description": "PMCS shortfalls" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client
        .post(format!("{}/shops/{}/lists", srv.base_url, shop_id))
        .bearer_auth(&admin)
        .json(&json!({ "description": "PMCS shortfalls" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn maintenance_flow_leaves_a_readable_audit_trail() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let admin = token();
    let shop = create_shop(&client, &srv.base_url, &admin, false).await;
    let shop_id = shop["id"].as_str().unwrap();

    let res = client
        .post(format!("{}/shops/{}/vehicles", srv.base_url, shop_id))
        .bearer_auth(&admin)
        .json(&json!({ "niin": "011234567", "admin": "SSG Vasquez", "model": "M1083" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let vehicle: serde_json::Value = res.json().await.unwrap();
    let vehicle_id = vehicle["id"].as_str().unwrap();
    // Blank uoc falls back to the placeholder.
    assert_eq!(vehicle["uoc"], "UNK");

    // A bad notification type never reaches the store.
    let res = client
        .post(format!("{}/vehicles/{}/notifications", srv.base_url, vehicle_id))
        .bearer_auth(&admin)
        .json(&json!({ "title": "Hydraulic leak", "type": "XX" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");

    let res = client
        .post(format!("{}/vehicles/{}/notifications", srv.base_url, vehicle_id))
        .bearer_auth(&admin)
        .json(&json!({ "title": "Hydraulic leak", "type": "M1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let notification: serde_json::Value = res.json().await.unwrap();
    let notification_id = notification["id"].as_str().unwrap();

    let res = client
        .post(format!("{}/notifications/{}/items", srv.base_url, notification_id))
        .bearer_auth(&admin)
        .json(&json!({ "items": [
            { "niin": "014411268", "nomenclature": "FILTER ELEMENT, FLUID", "quantity": 2 }
        ]}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = client
        .patch(format!("{}/notifications/{}", srv.base_url, notification_id))
        .bearer_auth(&admin)
        .json(&json!({ "completed": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .delete(format!("{}/vehicles/{}", srv.base_url, vehicle_id))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    // The vehicle row is gone, so its direct history 404s...
    let res = client
        .get(format!("{}/vehicles/{}/changes", srv.base_url, vehicle_id))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    // ...but the shop-level trail kept every step, newest first, with the
    // denormalized context intact.
    let res = client
        .get(format!("{}/shops/{}/changes", srv.base_url, shop_id))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    let records = body["items"].as_array().unwrap();
    let change_types: Vec<&str> = records
        .iter()
        .map(|r| r["change_type"].as_str().unwrap())
        .collect();
    assert_eq!(
        change_types,
        vec!["vehicle_deleted", "complete", "items_added", "create"]
    );
    assert_eq!(records[0]["vehicle_admin"], "SSG Vasquez");
    assert_eq!(records[0]["field_changes"]["vehicle_data"]["niin"], "011234567");
    assert_eq!(records[3]["notification_title"], "Hydraulic leak");
}
