//! Integration tests for the WFS transport using wiremock.

use geolayer_core::{Feature, FeatureService, FeatureState, Filter, ProtocolDescriptor, ProtocolError};
use geolayer_wfs::WfsService;
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn descriptor(server: &MockServer) -> ProtocolDescriptor {
    ProtocolDescriptor::new(
        format!("{}/geoserver/ows", server.uri()),
        "patios",
        "the_geom",
        "EPSG:3857",
    )
    .with_namespace("http://geodengue.org")
}

fn collection_body() -> serde_json::Value {
    json!({
        "type": "FeatureCollection",
        "totalFeatures": 1,
        "features": [{
            "type": "Feature",
            "id": "patios.1",
            "geometry": {"type": "Point", "coordinates": [-6411192.0, -2917373.8]},
            "properties": {"nombre": "Patio 1", "limpio": false}
        }]
    })
}

#[tokio::test]
async fn read_sends_get_feature() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/geoserver/ows"))
        .and(query_param("service", "WFS"))
        .and(query_param("request", "GetFeature"))
        .and(query_param("version", "1.1.0"))
        .and(query_param("typeName", "feature:patios"))
        .and(query_param("srsName", "EPSG:3857"))
        .and(query_param("outputFormat", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(collection_body()))
        .expect(1)
        .mount(&server)
        .await;

    let fc = WfsService::new().read(&descriptor(&server)).await.unwrap();
    assert_eq!(fc.len(), 1);
    assert_eq!(fc.features[0].id.as_deref(), Some("patios.1"));
    assert_eq!(fc.features[0].properties["nombre"], "Patio 1");
}

#[tokio::test]
async fn read_sends_encoded_filter() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/geoserver/ows"))
        .and(query_param(
            "filter",
            "<ogc:Filter xmlns:ogc=\"http://www.opengis.net/ogc\"><ogc:PropertyIsNull><ogc:PropertyName>fecha</ogc:PropertyName></ogc:PropertyIsNull></ogc:Filter>",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(collection_body()))
        .expect(1)
        .mount(&server)
        .await;

    let d = descriptor(&server).with_filter(Filter::is_null("fecha"));
    WfsService::new().read(&d).await.unwrap();
}

#[tokio::test]
async fn read_exception_with_ok_status_is_an_error() {
    let server = MockServer::start().await;
    let body = r#"<ows:ExceptionReport xmlns:ows="http://www.opengis.net/ows"><ows:Exception><ows:ExceptionText>Unknown namespace [feature]</ows:ExceptionText></ows:Exception></ows:ExceptionReport>"#;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;

    let err = WfsService::new().read(&descriptor(&server)).await.unwrap_err();
    match err {
        ProtocolError::ServiceException(text) => assert_eq!(text, "Unknown namespace [feature]"),
        other => panic!("expected ServiceException, got {other:?}"),
    }
}

#[tokio::test]
async fn read_http_error_maps_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let err = WfsService::new().read(&descriptor(&server)).await.unwrap_err();
    assert!(matches!(err, ProtocolError::Http { status: 503, .. }));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn read_garbage_is_invalid_response() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
        .mount(&server)
        .await;

    let err = WfsService::new().read(&descriptor(&server)).await.unwrap_err();
    assert!(matches!(err, ProtocolError::InvalidResponse(_)));
}

#[tokio::test]
async fn commit_posts_transaction() {
    let server = MockServer::start().await;
    let answer = r#"<wfs:TransactionResponse xmlns:wfs="http://www.opengis.net/wfs" xmlns:ogc="http://www.opengis.net/ogc"><wfs:TransactionSummary><wfs:totalInserted>1</wfs:totalInserted><wfs:totalUpdated>0</wfs:totalUpdated><wfs:totalDeleted>1</wfs:totalDeleted></wfs:TransactionSummary><wfs:InsertResults><wfs:Feature><ogc:FeatureId fid="patios.40"/></wfs:Feature></wfs:InsertResults></wfs:TransactionResponse>"#;

    Mock::given(method("POST"))
        .and(path("/geoserver/ows"))
        .and(header("content-type", "text/xml"))
        .and(body_string_contains("<wfs:Insert>"))
        .and(body_string_contains("<wfs:Delete typeName=\"feature:patios\">"))
        .respond_with(ResponseTemplate::new(200).set_body_string(answer))
        .expect(1)
        .mount(&server)
        .await;

    let features = vec![
        Feature::new(json!({"type": "Point", "coordinates": [1.0, 2.0]})),
        Feature::default()
            .with_id("patios.2")
            .with_state(FeatureState::Delete),
    ];
    let resp = WfsService::new()
        .commit(&descriptor(&server), &features)
        .await
        .unwrap();
    assert!(resp.is_success());
    assert_eq!(resp.inserted_ids, vec!["patios.40"]);
    assert_eq!(resp.total_deleted, 1);
}

#[tokio::test]
async fn commit_without_dirty_features_sends_nothing() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let resp = WfsService::new()
        .commit(&descriptor(&server), &[Feature::default().with_id("patios.1")])
        .await
        .unwrap();
    assert!(resp.is_success());
}

#[tokio::test]
async fn commit_exception_is_rejected_response() {
    let server = MockServer::start().await;
    let body = r#"<ows:ExceptionReport xmlns:ows="http://www.opengis.net/ows"><ows:Exception><ows:ExceptionText>Feature type patios is read only</ows:ExceptionText></ows:Exception></ows:ExceptionReport>"#;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;

    let resp = WfsService::new()
        .commit(
            &descriptor(&server),
            &[Feature::new(json!({"type": "Point", "coordinates": [0.0, 0.0]}))],
        )
        .await
        .unwrap();
    assert!(!resp.is_success());
    assert_eq!(resp.message.as_deref(), Some("Feature type patios is read only"));
}

#[tokio::test]
#[ignore] // Requires a live GeoServer at GEOLAYER_HOST with a published layer.
async fn live_geoserver_read() {
    let source = geolayer_core::DataSource::from_env().expect("GEOLAYER_HOST must be set");
    let layer = std::env::var("GEOLAYER_TEST_LAYER").unwrap_or_else(|_| "topp:states".into());
    let d = ProtocolDescriptor::new(source.service_url("ows"), layer, "the_geom", source.projection_code);
    let fc = WfsService::new().read(&d).await.unwrap();
    assert!(!fc.is_empty());
}
