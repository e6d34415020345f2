#[cfg(test)]
mod flow_api_integration_tests {
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use axum::Router;
    use flowserver::main_module::build_router;
    use flowserver::store::{DocumentStore, MemoryDocumentStore};
    use flowserver::tests::test_util::memory_state;
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;
    use uuid::Uuid;

    fn app() -> (Router, Arc<MemoryDocumentStore>) {
        let (state, store) = memory_state();
        (build_router(state), store)
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    async fn create_flow(app: &Router, name: Option<&str>) -> (String, Value) {
        let body = match name {
            Some(name) => json!({ "name": name }),
            None => json!({}),
        };
        let (status, created) = send(app, Method::POST, "/api/flows", Some(body)).await;
        assert_eq!(status, StatusCode::OK);
        let flow_id = created["flowId"].as_str().unwrap().to_string();
        (flow_id, created)
    }

    #[tokio::test]
    async fn test_liveness_and_health() {
        let (app, _) = app();
        let (status, body) = send(&app, Method::GET, "/test", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "msg": "Hello From flow Server" }));

        let (status, body) = send(&app, Method::GET, "/api/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_create_flow_seeds_node_and_data() {
        let (app, _) = app();
        let (flow_id, created) = create_flow(&app, None).await;

        assert_eq!(created["flow"]["name"], "New Flow");
        assert_eq!(created["flow"]["status"], true);
        assert_eq!(created["flow"]["inbox"], true);
        assert_eq!(created["flow"]["_id"], json!(flow_id));

        let (_, nodes) = send(&app, Method::GET, &format!("/api/nodes/{flow_id}"), None).await;
        let nodes = nodes.as_array().unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0]["isStart"], true);
        assert_eq!(nodes[0]["channel"], "omnichannel");
        assert_eq!(nodes[0]["label"], "Message #1");

        let (_, data) = send(&app, Method::GET, &format!("/api/flow-data/{flow_id}"), None).await;
        let canvas = data["flowData"]["nodes"].as_array().unwrap();
        assert_eq!(canvas.len(), 1);
        assert_eq!(canvas[0]["id"], nodes[0]["nodeId"]);
        assert_eq!(canvas[0]["position"], json!({ "x": 400.0, "y": 100.0 }));
        assert_eq!(data["flowData"]["edges"], json!([]));
    }

    #[tokio::test]
    async fn test_create_flow_without_body_uses_default_name() {
        let (app, _) = app();
        let (status, created) = send(&app, Method::POST, "/api/flows", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(created["flow"]["name"], "New Flow");
        assert_eq!(created["flowId"], created["flow"]["_id"]);

        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/flows")
            .header("content-type", "application/json")
            .body(Body::from("{ not json"))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["kind"], "invalid_body");
    }

    #[tokio::test]
    async fn test_list_update_and_duplicate_flow() {
        let (app, store) = app();
        let (flow_id, _) = create_flow(&app, Some("Demo")).await;

        let (status, body) = send(
            &app,
            Method::PUT,
            &format!("/api/flows/{flow_id}"),
            Some(json!({ "status": false })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, Value::Null);

        let (status, copy) = send(
            &app,
            Method::POST,
            &format!("/api/flows/duplicate/{flow_id}"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(copy["name"], "Copy of Demo");
        assert_eq!(copy["status"], false);
        assert_ne!(copy["_id"], json!(flow_id));
        assert_eq!(store.node_count().await, 1);
        assert_eq!(store.flow_data_count().await, 1);

        let (_, flows) = send(&app, Method::GET, "/api/flows", None).await;
        let names: Vec<&str> = flows
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["Demo", "Copy of Demo"]);
    }

    #[tokio::test]
    async fn test_duplicate_unknown_flow_is_404() {
        let (app, _) = app();
        let (status, body) = send(
            &app,
            Method::POST,
            &format!("/api/flows/duplicate/{}", Uuid::new_v4()),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Flow not found");
        assert_eq!(body["kind"], "not_found");
    }

    #[tokio::test]
    async fn test_delete_flow_cascades() {
        let (app, store) = app();
        let (flow_id, _) = create_flow(&app, Some("Doomed")).await;
        send(
            &app,
            Method::POST,
            &format!("/api/nodes/{flow_id}"),
            Some(json!({ "nodeId": "extra", "label": "Extra" })),
        )
        .await;

        let (status, _) = send(&app, Method::DELETE, &format!("/api/flows/{flow_id}"), None).await;
        assert_eq!(status, StatusCode::OK);

        let (_, nodes) = send(&app, Method::GET, &format!("/api/nodes/{flow_id}"), None).await;
        assert_eq!(nodes, json!([]));
        let (_, data) = send(&app, Method::GET, &format!("/api/flow-data/{flow_id}"), None).await;
        assert_eq!(data, json!({ "flowData": { "nodes": [], "edges": [] } }));
        assert_eq!(store.node_count().await, 0);
        let (_, flows) = send(&app, Method::GET, "/api/flows", None).await;
        assert_eq!(flows, json!([]));
    }

    #[tokio::test]
    async fn test_missing_flow_data_returns_default_shape() {
        let (app, _) = app();
        let (status, data) = send(
            &app,
            Method::GET,
            &format!("/api/flow-data/{}", Uuid::new_v4()),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(data, json!({ "flowData": { "nodes": [], "edges": [] } }));
    }

    #[tokio::test]
    async fn test_node_lifecycle_and_single_start() {
        let (app, _) = app();
        let (flow_id, _) = create_flow(&app, None).await;

        let (status, node) = send(
            &app,
            Method::POST,
            &format!("/api/nodes/{flow_id}"),
            Some(json!({
                "nodeId": "n2",
                "label": "Second",
                "position": { "x": 10, "y": 20 },
                "type": "custom"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(node["isStart"], false);
        assert_eq!(node["channel"], "omnichannel");

        let (status, _) = send(
            &app,
            Method::PUT,
            "/api/nodes/n2",
            Some(json!({ "isStart": true, "flowId": flow_id, "channel": "sms" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, nodes) = send(&app, Method::GET, &format!("/api/nodes/{flow_id}"), None).await;
        let starts: Vec<&Value> = nodes
            .as_array()
            .unwrap()
            .iter()
            .filter(|n| n["isStart"] == true)
            .collect();
        assert_eq!(starts.len(), 1);
        assert_eq!(starts[0]["nodeId"], "n2");
        assert_eq!(starts[0]["channel"], "sms");

        let (status, _) = send(&app, Method::DELETE, "/api/nodes/n2", None).await;
        assert_eq!(status, StatusCode::OK);
        let (_, nodes) = send(&app, Method::GET, &format!("/api/nodes/{flow_id}"), None).await;
        assert_eq!(nodes.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_save_content_keeps_graph_and_snapshot() {
        let (app, _) = app();
        let flow_id = Uuid::new_v4();

        let (status, _) = send(
            &app,
            Method::POST,
            &format!("/api/flow-data/{flow_id}"),
            Some(json!({
                "flowData": {
                    "nodes": [{ "id": "n1", "type": "custom", "position": { "x": 0, "y": 0 }, "data": { "label": "Hi" } }],
                    "edges": [{ "id": "e1", "source": "n1", "target": "n2" }],
                    "nodeContents": {}
                },
                "publishedData": {
                    "flowId": flow_id,
                    "flowName": "User Flow",
                    "startNode": "n1",
                    "nodes": [],
                    "updatedAt": "2024-01-01T00:00:00.000Z"
                }
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let (_, before) = send(&app, Method::GET, &format!("/api/flow-data/{flow_id}"), None).await;

        for _ in 0..2 {
            let (status, _) = send(
                &app,
                Method::POST,
                &format!("/api/save-content/{flow_id}"),
                Some(json!({ "nodeId": "n1", "content": [{ "type": "text", "value": "Hello" }] })),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
        }

        let (_, after) = send(&app, Method::GET, &format!("/api/flow-data/{flow_id}"), None).await;
        assert_eq!(after["flowData"]["nodes"], before["flowData"]["nodes"]);
        assert_eq!(after["flowData"]["edges"], before["flowData"]["edges"]);
        assert_eq!(after["publishedData"], before["publishedData"]);
        assert_eq!(
            after["flowData"]["nodeContents"],
            json!({ "n1": [{ "type": "text", "value": "Hello" }] })
        );
    }

    #[tokio::test]
    async fn test_publish_joins_node_metadata() {
        let (app, store) = app();
        let flow_id = Uuid::new_v4();
        send(
            &app,
            Method::POST,
            &format!("/api/nodes/{flow_id}"),
            Some(json!({ "nodeId": "n1", "channel": "sms", "label": "Hi" })),
        )
        .await;
        send(
            &app,
            Method::PUT,
            "/api/nodes/n1",
            Some(json!({ "isStart": true, "flowId": flow_id })),
        )
        .await;

        let (status, published) = send(
            &app,
            Method::POST,
            &format!("/api/publish-flow/{flow_id}"),
            Some(json!({
                "nodes": [{ "id": "n1", "type": "custom", "position": { "x": 0, "y": 0 }, "data": { "label": "Hi" } }],
                "edges": [],
                "nodeContents": {}
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(published["startNode"], "n1");
        assert_eq!(published["flowName"], "User Flow");
        assert_eq!(published["nodes"][0]["data"]["channel"], "sms");
        assert_eq!(published["nodes"][0]["data"]["isStart"], true);
        assert_eq!(published["nodes"][0]["data"]["content"], json!([]));
        assert_eq!(published["nodes"][0]["data"]["label"], "Hi");

        let record = store.find_flow_data(flow_id).await.unwrap().unwrap();
        assert_eq!(record.flow_data.nodes.len(), 1);
        assert_eq!(
            serde_json::to_value(record.published_data.unwrap()).unwrap(),
            published
        );
    }

    #[tokio::test]
    async fn test_draft_autosave_keeps_published_snapshot() {
        let (app, _) = app();
        let (flow_id, _) = create_flow(&app, None).await;
        let canvas = json!({
            "nodes": [{ "id": "n1", "type": "custom", "position": { "x": 0, "y": 0 }, "data": { "label": "Hi" } }],
            "edges": [],
            "nodeContents": {}
        });

        let (status, published) = send(
            &app,
            Method::POST,
            &format!("/api/publish-flow/{flow_id}"),
            Some(canvas.clone()),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let mut draft = canvas;
        draft["nodes"][0]["data"]["label"] = json!("Edited");
        let (status, _) = send(
            &app,
            Method::POST,
            &format!("/api/flow-data/{flow_id}"),
            Some(json!({ "flowData": draft })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, data) = send(&app, Method::GET, &format!("/api/flow-data/{flow_id}"), None).await;
        assert_eq!(data["flowData"]["nodes"][0]["data"]["label"], "Edited");
        assert_eq!(data["publishedData"], published);
    }

    #[tokio::test]
    async fn test_publish_treats_null_content_as_empty() {
        let (app, _) = app();
        let flow_id = Uuid::new_v4();
        let (status, _) = send(
            &app,
            Method::POST,
            &format!("/api/save-content/{flow_id}"),
            Some(json!({ "nodeId": "n1" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, published) = send(
            &app,
            Method::POST,
            &format!("/api/publish-flow/{flow_id}"),
            Some(json!({
                "nodes": [{ "id": "n1", "type": "custom", "position": { "x": 0, "y": 0 }, "data": { "label": "Hi" } }],
                "edges": [],
                "nodeContents": { "n1": null }
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(published["nodes"][0]["data"]["content"], json!([]));
    }

    #[tokio::test]
    async fn test_invalid_flow_id_is_rejected() {
        let (app, _) = app();
        let (status, _) = send(&app, Method::GET, "/api/flow-data/not-a-uuid", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
