//! Ollama embedding client against an in-process fake `/api/embed`.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use murshid_rag::{Embedder, OllamaEmbedder, OllamaEmbeddingConfig, RagError};

#[derive(Clone)]
struct FakeOllama {
    status: u16,
    embeddings: Value,
    requests: Arc<Mutex<Vec<Value>>>,
}

async fn embed(State(state): State<FakeOllama>, Json(body): Json<Value>) -> Response {
    state.requests.lock().push(body);
    if state.status != 200 {
        return (StatusCode::from_u16(state.status).unwrap(), "model not found").into_response();
    }
    Json(json!({ "model": "bge-m3", "embeddings": state.embeddings })).into_response()
}

async fn spawn_fake(state: FakeOllama) -> SocketAddr {
    let app = Router::new()
        .route("/api/embed", post(embed))
        .with_state(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn embedder_for(addr: SocketAddr) -> OllamaEmbedder {
    OllamaEmbedder::new(OllamaEmbeddingConfig {
        endpoint: format!("http://{}", addr),
        model: "bge-m3".to_string(),
        embedding_dim: 3,
    })
}

#[tokio::test]
async fn test_embed_query() {
    let fake = FakeOllama {
        status: 200,
        embeddings: json!([[0.1, 0.2, 0.3]]),
        requests: Arc::new(Mutex::new(Vec::new())),
    };
    let addr = spawn_fake(fake.clone()).await;

    let vector = embedder_for(addr).embed("Where is Riyadh?").await.unwrap();
    assert_eq!(vector, vec![0.1, 0.2, 0.3]);

    let requests = fake.requests.lock();
    assert_eq!(requests[0]["model"], "bge-m3");
    assert_eq!(requests[0]["input"], "Where is Riyadh?");
}

#[tokio::test]
async fn test_no_embedding_returned() {
    let fake = FakeOllama {
        status: 200,
        embeddings: json!([]),
        requests: Arc::new(Mutex::new(Vec::new())),
    };
    let addr = spawn_fake(fake).await;

    let err = embedder_for(addr).embed("q").await.unwrap_err();
    assert!(matches!(err, RagError::Embedding(_)));
}

#[tokio::test]
async fn test_error_status() {
    let fake = FakeOllama {
        status: 404,
        embeddings: json!([]),
        requests: Arc::new(Mutex::new(Vec::new())),
    };
    let addr = spawn_fake(fake).await;

    let err = embedder_for(addr).embed("q").await.unwrap_err();
    assert!(err.to_string().contains("404"));
}
