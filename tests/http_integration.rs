use serde_json::{Value, json};
use testcontainers::core::{IntoContainerPort, WaitFor};
use testcontainers::runners::SyncRunner;
use testcontainers::{Container, GenericImage, ImageExt, TestcontainersError};

use checkpoint_planner::config::BackendConfig;
use checkpoint_planner::error::PlannerError;
use checkpoint_planner::http::HttpBackend;
use checkpoint_planner::model::{CheckpointId, Position};
use checkpoint_planner::resolver::CandidateResolver;
use checkpoint_planner::traits::{CheckpointStore, SolutionArchive};

fn mock_backend() -> Result<(Container<GenericImage>, String), TestcontainersError> {
    let image = GenericImage::new("mockserver/mockserver", "5.15.0")
        .with_exposed_port(1080.tcp())
        .with_wait_for(WaitFor::message_on_stdout("started on port"))
        .with_startup_timeout(std::time::Duration::from_secs(60));

    let container = image.start()?;
    let port = container.get_host_port_ipv4(1080.tcp())?;
    Ok((container, format!("http://127.0.0.1:{}", port)))
}

fn expect(base_url: &str, method: &str, path: &str, status: u16, body: Value) {
    let expectation = json!({
        "httpRequest": { "method": method, "path": path },
        "httpResponse": {
            "statusCode": status,
            "headers": { "Content-Type": ["application/json"] },
            "body": { "type": "JSON", "json": body }
        }
    });
    let response = reqwest::blocking::Client::new()
        .put(format!("{}/mockserver/expectation", base_url))
        .json(&expectation)
        .send()
        .expect("register expectation");
    assert!(response.status().is_success(), "mockserver refused expectation: {}", response.status());
}

fn backend(base_url: String) -> HttpBackend {
    HttpBackend::new(BackendConfig {
        base_url,
        timeout_secs: 10,
    })
    .expect("build backend client")
}

#[test]
#[ignore = "requires docker"]
fn resolves_location_through_backend() {
    let (container, base_url) = mock_backend().expect("start mockserver container");

    expect(
        &base_url,
        "POST",
        "/resolve_location",
        200,
        json!({
            "status": "success",
            "cluster_id": 7,
            "checkpoints": [
                { "id": 70, "lat": 3.1412, "lon": 101.4811, "confidence": 0.4, "source": "topology_bottleneck" },
                { "id": 71, "lat": 3.1391, "lon": 101.4790, "confidence": 0.9, "source": "centrality_analysis" }
            ],
            "address": { "road": "Jalan Klang Lama" }
        }),
    );

    expect(
        &base_url,
        "GET",
        "/solution/42",
        200,
        json!({
            "status": "success",
            "solution": {
                "warehouse_position": { "lat": 3.127993, "lon": 101.466972 },
                "routes": [{
                    "vehicle_index": 0,
                    "stops": [
                        { "type": "checkpoint", "checkpoint_id": 71, "lat": 3.1391, "lon": 101.4790, "serves_clusters": [7] }
                    ],
                    "distance": 4.2
                }],
                "distance_basis": "road_network",
                "route_kind": "checkpoint_based"
            }
        }),
    );

    let http = backend(base_url);
    let resolver = CandidateResolver::new(&http);
    let resolution = resolver
        .resolve(Position::new(3.1405, 101.4805))
        .expect("resolve pickup");

    assert_eq!(resolution.cluster_id, 7);
    let ids: Vec<_> = resolution.candidates.iter().map(|cp| cp.id.clone()).collect();
    assert_eq!(ids, vec![CheckpointId::Stored(71), CheckpointId::Stored(70)]);
    assert!(resolution.candidates.iter().all(|cp| cp.serves(7)));
    assert!(resolution.address.is_some());

    let solution = http.fetch("42").expect("fetch archived solution");
    assert_eq!(solution.routes.len(), 1);
    assert_eq!(solution.total_distance(), 4.2);
    assert!(solution.missing_clusters.is_empty());

    drop(container);
}

#[test]
#[ignore = "requires docker"]
fn error_envelopes_map_to_planner_errors() {
    let (container, base_url) = mock_backend().expect("start mockserver container");

    expect(
        &base_url,
        "POST",
        "/resolve_location",
        404,
        json!({ "status": "error", "error_kind": "not_covered", "message": "no cluster nearby" }),
    );
    expect(
        &base_url,
        "POST",
        "/checkpoint/delete_checkpoint/70",
        200,
        json!({ "status": "success", "message": "deleted" }),
    );
    expect(
        &base_url,
        "GET",
        "/cluster/7/checkpoints",
        200,
        json!({ "message": "no status field" }),
    );

    let http = backend(base_url);
    let position = Position::new(2.5, 100.5);
    let resolver = CandidateResolver::new(&http);
    assert_eq!(resolver.resolve(position), Err(PlannerError::NotCovered { position }));

    http.delete(70).expect("delete checkpoint");

    let err = http.list(7).unwrap_err();
    assert!(err.is_transport(), "missing status must not read as success: {}", err);

    drop(container);
}
