mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn video_listing_reaches_vod_service() -> Result<()> {
    let backend = common::spawn_backend().await?;
    let proxy = common::spawn_proxy(&backend.base_url).await?;

    let res = reqwest::Client::new()
        .get(format!("{}/api/vod_list?page=2&type_id=1", proxy.base_url))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["data"]["path"], "/vod/vod_list");
    assert_eq!(body["data"]["query"], "page=2&type_id=1");
    // Host is rewritten to the backend, not the proxy
    assert_eq!(body["data"]["host"], backend.addr.to_string());
    Ok(())
}

#[tokio::test]
async fn unknown_api_path_falls_through_to_catch_all() -> Result<()> {
    let backend = common::spawn_backend().await?;
    let proxy = common::spawn_proxy(&backend.base_url).await?;

    let res = reqwest::get(format!("{}/api/unknown/anything", proxy.base_url)).await?;

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body = res.json::<Value>().await?;
    assert_eq!(body["path"], "/unknown/anything");
    Ok(())
}

#[tokio::test]
async fn post_body_and_status_are_relayed() -> Result<()> {
    let backend = common::spawn_backend().await?;
    let proxy = common::spawn_proxy(&backend.base_url).await?;

    let res = reqwest::Client::new()
        .post(format!("{}/api/publish/42", proxy.base_url))
        .json(&json!({ "content": "好看" }))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::CREATED);
    let body = res.json::<Value>().await?;
    assert_eq!(body["data"]["vod_id"], 42);
    assert_eq!(body["data"]["body"]["content"], "好看");
    Ok(())
}

#[tokio::test]
async fn non_api_path_is_not_forwarded() -> Result<()> {
    let backend = common::spawn_backend().await?;
    let proxy = common::spawn_proxy(&backend.base_url).await?;

    let res = reqwest::get(format!("{}/index.html", proxy.base_url)).await?;

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body = res.json::<Value>().await?;
    assert_eq!(body["success"], false);
    assert_eq!(body["error_code"], "NO_ROUTE");
    Ok(())
}

#[tokio::test]
async fn dead_backend_yields_bad_gateway() -> Result<()> {
    // Reserve a port, then release it so nothing listens there
    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    let origin = format!("http://{}", listener.local_addr()?);
    drop(listener);
    let proxy = common::spawn_proxy(&origin).await?;

    let res = reqwest::get(format!("{}/api/live/streams", proxy.base_url)).await?;

    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    Ok(())
}
