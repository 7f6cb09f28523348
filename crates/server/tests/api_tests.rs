//! Integration tests for the HTTP API.

mod common;

use axum::http::StatusCode;
use common::{DOWNLOAD_URL, TestServer, data_url};
use serde_json::json;

const JAR: &[u8] = b"0123456789";
const JAR_MD5: &str = "781e5e245d69b566979b86e28d23f2c7";

#[tokio::test]
async fn test_health_check() {
    let server = TestServer::new().await;
    let (status, body) = server.json("GET", "/healthz", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_build_manifest_lists_linked_version() {
    let server = TestServer::new().await;
    server.seed(JAR).await;

    let (status, body) = server.json("PATCH", "/packs/tech-pack/builds/b1/mods/jei/versions/4-7", None).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["status"], 200);

    let (status, manifest) = server.json("GET", "/modpacks/tech-pack/b1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(manifest["minecraft"], "1.12.2");
    let mods = manifest["mods"].as_array().unwrap();
    assert_eq!(mods.len(), 1);
    assert_eq!(mods[0]["name"], "jei");
    assert_eq!(mods[0]["version"], "4.7");
    assert_eq!(mods[0]["md5"], JAR_MD5);
    assert_eq!(mods[0]["url"], format!("{DOWNLOAD_URL}/file/{JAR_MD5}"));
}

#[tokio::test]
async fn test_link_twice_is_precondition_failure() {
    let server = TestServer::new().await;
    server.seed(JAR).await;
    let uri = "/packs/tech-pack/builds/b1/mods/jei/versions/4-7";

    let (status, _) = server.json("PATCH", uri, None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = server.json("PATCH", uri, None).await;
    assert_eq!(status, StatusCode::PRECONDITION_FAILED);
    assert_eq!(body["status"], 412);

    let (_, versions) = server.json("GET", "/packs/tech-pack/builds/b1/versions", None).await;
    assert_eq!(versions.as_array().unwrap().len(), 1);

    let (status, _) = server.json("DELETE", uri, None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = server.json("DELETE", uri, None).await;
    assert_eq!(status, StatusCode::PRECONDITION_FAILED);
    let (_, versions) = server.json("GET", "/packs/tech-pack/builds/b1/versions", None).await;
    assert_eq!(versions, json!([]));
}

#[tokio::test]
async fn test_link_from_version_side() {
    let server = TestServer::new().await;
    server.seed(JAR).await;

    let (status, _) = server.json("PATCH", "/mods/jei/versions/4-7/builds/tech-pack/b1", None).await;
    assert_eq!(status, StatusCode::OK);
    let (_, builds) = server.json("GET", "/mods/jei/versions/4-7/builds", None).await;
    assert_eq!(builds[0]["name"], "b1");
    let (status, _) = server.json("PATCH", "/packs/tech-pack/builds/b1/mods/jei/versions/4-7", None).await;
    assert_eq!(status, StatusCode::PRECONDITION_FAILED);
}

#[tokio::test]
async fn test_unknown_entities_are_not_found() {
    let server = TestServer::new().await;
    server.seed(JAR).await;

    let (status, body) = server.json("PATCH", "/packs/tech-pack/builds/b1/mods/jei/versions/9.9", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], 404);
    let (status, _) = server.json("GET", "/packs/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = server.json("GET", "/modpacks/tech-pack/b2", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_body_is_precondition_failure() {
    let server = TestServer::new().await;
    let (status, body) = server.json("POST", "/packs", Some(json!({"name": 42}))).await;
    assert_eq!(status, StatusCode::PRECONDITION_FAILED);
    assert_eq!(body["status"], 412);
}

#[tokio::test]
async fn test_validation_and_conflicts() {
    let server = TestServer::new().await;
    let (status, _) = server.json("POST", "/packs", Some(json!({}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = server.json("POST", "/packs", Some(json!({"name": "Tech Pack"}))).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = server.json("POST", "/packs", Some(json!({"name": "Tech  Pack", "slug": "tech-pack"}))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = server.json("POST", "/packs", Some(json!({"name": "Art", "upload": "not a data url"}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_version_file_downloads() {
    let server = TestServer::new().await;
    server.seed(JAR).await;

    let (status, _, _) = server.get_raw("/packs/tech-pack/builds/b1/versions/4-7/file").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    server.json("PATCH", "/packs/tech-pack/builds/b1/mods/jei/versions/4-7", None).await;
    let (status, content_type, body) = server.get_raw("/packs/tech-pack/builds/b1/versions/4-7/file").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("application/java-archive"));
    assert_eq!(body, JAR);

    let (status, content_type, body) = server.get_raw(&format!("/storage/file/{JAR_MD5}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("application/octet-stream"));
    assert_eq!(body, JAR);

    let (status, _, _) = server.get_raw(&format!("/storage/logo/{JAR_MD5}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _, _) = server.get_raw(&format!("/storage/nope/{JAR_MD5}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_pack_logo_and_manifest() {
    let server = TestServer::new().await;
    let logo = b"\x89PNG fake";
    let (status, pack) = server
        .json("POST", "/packs", Some(json!({"name": "Tech Pack", "upload": data_url("image/png", logo)})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pack["slug"], "tech-pack");

    let (status, content_type, body) = server.get_raw("/packs/tech-pack/logo").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("image/png"));
    assert_eq!(body, logo);

    server.json("PUT", "/minecraft", Some(json!({"name": "1.12.2", "kind": "release"}))).await;
    server.json("POST", "/packs/tech-pack/builds", Some(json!({"name": "b1", "minecraft": "1.12.2"}))).await;
    let (status, _) = server.json("PATCH", "/packs/tech-pack", Some(json!({"recommended": "b1"}))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, manifest) = server.json("GET", "/modpacks/tech-pack", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(manifest["display_name"], "Tech Pack");
    assert_eq!(manifest["recommended"], "b1");
    assert_eq!(manifest["builds"], json!(["b1"]));
    assert!(manifest["logo"]["url"].as_str().unwrap().starts_with(&format!("{DOWNLOAD_URL}/logo/")));
}

#[tokio::test]
async fn test_hidden_packs_are_omitted() {
    let server = TestServer::new().await;
    server.json("POST", "/packs", Some(json!({"name": "Public"}))).await;
    server.json("POST", "/packs", Some(json!({"name": "Secret", "hidden": true}))).await;

    let (status, packs) = server.json("GET", "/modpacks", None).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<_> = packs.as_array().unwrap().iter().map(|pack| pack["name"].clone()).collect();
    assert_eq!(names, [json!("public")]);

    let (_, packs) = server.json("GET", "/packs", None).await;
    assert_eq!(packs.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_release_sync_reports_outcome() {
    let server = TestServer::new().await;
    let record = json!({"name": "14.23.5.2847", "minecraft": "1.12.2"});
    let (status, body) = server.json("PUT", "/forge", Some(record.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "created");
    let (_, body) = server.json("PUT", "/forge", Some(record)).await;
    assert_eq!(body["outcome"], "unchanged");
    let (_, forges) = server.json("GET", "/forge", None).await;
    assert_eq!(forges.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_team_membership_with_perm() {
    let server = TestServer::new().await;
    let (status, _) = server.json("POST", "/users", Some(json!({"name": "Alex"}))).await;
    assert_eq!(status, StatusCode::OK);
    server.json("POST", "/teams", Some(json!({"name": "Core"}))).await;

    let (status, _) = server.json("PATCH", "/teams/core/users/alex", Some(json!({"perm": "owner"}))).await;
    assert_eq!(status, StatusCode::OK);
    let (_, members) = server.json("GET", "/teams/core/users", None).await;
    assert_eq!(members[0]["slug"], "alex");
    assert_eq!(members[0]["perm"], "owner");

    let (status, _) = server.json("DELETE", "/users/alex", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    server.json("DELETE", "/teams/core/users/alex", None).await;
    let (status, _) = server.json("DELETE", "/users/alex", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_pack_client_links() {
    let server = TestServer::new().await;
    server.json("POST", "/packs", Some(json!({"name": "Tech Pack"}))).await;
    server.json("POST", "/clients", Some(json!({"name": "Laptop"}))).await;

    let (status, _) = server.json("PATCH", "/packs/tech-pack/clients/laptop", None).await;
    assert_eq!(status, StatusCode::OK);
    let (_, clients) = server.json("GET", "/packs/tech-pack/clients", None).await;
    assert_eq!(clients[0]["name"], "Laptop");
    let (status, _) = server.json("PATCH", "/packs/tech-pack/clients/laptop", None).await;
    assert_eq!(status, StatusCode::PRECONDITION_FAILED);
    let (status, _) = server.json("DELETE", "/packs/tech-pack/clients/laptop", None).await;
    assert_eq!(status, StatusCode::OK);
    let (_, clients) = server.json("GET", "/packs/tech-pack/clients", None).await;
    assert_eq!(clients, json!([]));
}
