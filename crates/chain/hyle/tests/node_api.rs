//! HyleClient against an in-process stub of the node REST API.

use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::Value;

use chain_core::{
    Blob, BlobTransaction, ChainTransport, ContractName, ContractRegistration, Identity,
    ProofTransaction, TransactionId, VerifierKind,
};
use chain_hyle::{HyleClient, HyleConfig};

#[derive(Clone, Default)]
struct NodeStub {
    bodies: Arc<Mutex<Vec<(String, Value)>>>,
}

impl NodeStub {
    fn record(&self, route: &str, body: Value) {
        self.bodies.lock().unwrap().push((route.to_string(), body));
    }
}

async fn contract(Path(name): Path<String>) -> StatusCode {
    if name == "sp1_residency" {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    }
}

async fn register(State(stub): State<NodeStub>, Json(body): Json<Value>) -> StatusCode {
    stub.record("register", body);
    StatusCode::OK
}

async fn send_blob(State(stub): State<NodeStub>, Json(body): Json<Value>) -> Json<Value> {
    stub.record("blob", body);
    Json(Value::String("tx_abc".to_string()))
}

async fn send_proof(
    State(stub): State<NodeStub>,
    Json(body): Json<Value>,
) -> (StatusCode, String) {
    let rejected = body["proof"].as_str() == Some("");
    stub.record("proof", body);
    if rejected {
        (StatusCode::BAD_REQUEST, "empty proof".to_string())
    } else {
        (StatusCode::OK, "\"tx_proof\"".to_string())
    }
}

async fn spawn_node() -> (HyleClient, NodeStub) {
    let stub = NodeStub::default();
    let app = Router::new()
        .route("/v1/contract/:name", get(contract))
        .route("/v1/contract/register", post(register))
        .route("/v1/tx/send/blob", post(send_blob))
        .route("/v1/tx/send/proof", post(send_proof))
        .with_state(stub.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let config = HyleConfig::default().with_api_url(format!("http://{}", addr));
    (HyleClient::new(config).unwrap(), stub)
}

#[tokio::test]
async fn test_contract_lookup_maps_404_to_absent() {
    let (client, _stub) = spawn_node().await;

    assert!(
        client
            .contract_exists(&ContractName::new("sp1_residency"))
            .await
            .unwrap()
    );
    assert!(
        !client
            .contract_exists(&ContractName::new("unknown"))
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn test_registration_sends_hex_key_and_digest() {
    let (client, stub) = spawn_node().await;

    client
        .register_contract(ContractRegistration::new(
            VerifierKind::Sp1,
            ContractName::new("sp1_residency"),
            vec![0x00, 0x3f, 0x11],
        ))
        .await
        .unwrap();

    let bodies = stub.bodies.lock().unwrap();
    let (route, body) = &bodies[0];
    assert_eq!(route, "register");
    assert_eq!(body["verifier"], "sp1");
    assert_eq!(body["contract_name"], "sp1_residency");
    assert_eq!(body["verification_key"], "003f11");
    assert_eq!(body["digest"], "00000000");
}

#[tokio::test]
async fn test_blob_then_proof_broadcast() {
    let (client, stub) = spawn_node().await;
    let contract = ContractName::new("sp1_residency");

    let tx_hash = client
        .broadcast_payload(BlobTransaction {
            identity: Identity::default(),
            blobs: vec![Blob {
                contract_name: contract.clone(),
                data: b"Portugal".to_vec(),
            }],
        })
        .await
        .unwrap();
    assert_eq!(tx_hash, TransactionId::new("tx_abc"));

    let proof_hash = client
        .broadcast_proof(ProofTransaction {
            tx_hash: tx_hash.clone(),
            blob_index: 0,
            contract_name: contract,
            proof: vec![0xaa; 4],
        })
        .await
        .unwrap();
    assert_eq!(proof_hash, TransactionId::new("tx_proof"));

    let bodies = stub.bodies.lock().unwrap();
    assert_eq!(bodies[1].0, "proof");
    assert_eq!(bodies[1].1["tx_hash"], "tx_abc");
    assert_eq!(bodies[1].1["blob_index"], 0);
    assert_eq!(bodies[1].1["proof"], "aaaaaaaa");
}

#[tokio::test]
async fn test_client_error_is_a_rejection() {
    let (client, _stub) = spawn_node().await;

    let err = client
        .broadcast_proof(ProofTransaction {
            tx_hash: TransactionId::new("tx_abc"),
            blob_index: 0,
            contract_name: ContractName::new("sp1_residency"),
            proof: Vec::new(),
        })
        .await
        .unwrap_err();

    assert!(err.is_rejection());
    assert!(err.to_string().contains("empty proof"));
}
