//! Integration tests for the FIPE client and source against a mock API.

use catalog_core::{BrandId, FipeConfig, ModelId, ReferenceTableId, YearId};
use catalog_source::{CatalogSource, FipeClient, FipeSource, SourceError};
use mockito::{Matcher, Mock, ServerGuard};

/// Config pointing at the mock server, with fast retries and no throttling.
fn test_config(server: &ServerGuard) -> FipeConfig {
    FipeConfig {
        base_url: server.url(),
        max_requests: 1000,
        per_seconds: 1,
        retry_delay_ms: 1,
        timeout_secs: 5,
        ..FipeConfig::default()
    }
}

async fn mock_json(server: &mut ServerGuard, endpoint: &str, body: &str) -> Mock {
    server
        .mock("POST", format!("/{endpoint}").as_str())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body)
        .create_async()
        .await
}

async fn mock_price(server: &mut ServerGuard, year: &str, body: &str) -> Mock {
    server
        .mock("POST", "/ConsultarValorComTodosParametros")
        .match_body(Matcher::UrlEncoded("anoModelo".into(), year.into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body)
        .expect(1)
        .create_async()
        .await
}

#[tokio::test]
async fn test_fetch_assembles_snapshot() {
    let mut server = mockito::Server::new_async().await;

    mock_json(
        &mut server,
        "ConsultarTabelaDeReferencia",
        r#"[{ "Codigo": 313, "Mes": "outubro/2024 " }, { "Codigo": 312, "Mes": "setembro/2024 " }]"#,
    )
    .await;
    mock_json(
        &mut server,
        "ConsultarMarcas",
        r#"[{ "Label": "Toyota", "Value": "56" }, { "Label": "Volkswagen", "Value": "59" }]"#,
    )
    .await;
    let models = server
        .mock("POST", "/ConsultarModelos")
        .match_body(Matcher::UrlEncoded("codigoMarca".into(), "56".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{ "Modelos": [{ "Label": "Corolla XEi 2.0", "Value": 5585 }], "Anos": [] }"#,
        )
        .expect(1)
        .create_async()
        .await;
    mock_json(
        &mut server,
        "ConsultarAnoModelo",
        r#"[{ "Label": "2024 Gasolina", "Value": "2024-1" }, { "Label": "2023 Gasolina", "Value": "2023-1" }]"#,
    )
    .await;
    let price_2024 = mock_price(
        &mut server,
        "2024",
        r#"{ "Valor": "R$ 150.000,00", "CodigoFipe": "002161-0", "Combustivel": "Gasolina", "AnoModelo": 2024 }"#,
    )
    .await;
    let price_2023 = mock_price(
        &mut server,
        "2023",
        r#"{ "Valor": "R$ 140.500,50", "CodigoFipe": "002161-0", "Combustivel": "Gasolina", "AnoModelo": 2023 }"#,
    )
    .await;

    let config = FipeConfig {
        max_brands: Some(1),
        ..test_config(&server)
    };
    let source = FipeSource::new(&config).expect("create source");
    let snapshot = source.fetch().await.expect("fetch snapshot");

    models.assert_async().await;
    price_2024.assert_async().await;
    price_2023.assert_async().await;

    assert_eq!(snapshot.reference_tables.len(), 1);
    assert_eq!(snapshot.reference_tables[0].id, ReferenceTableId(313));
    assert_eq!(snapshot.reference_tables[0].month, "outubro/2024");

    assert_eq!(snapshot.brands.len(), 1);
    assert_eq!(snapshot.brands[0].id, BrandId(56));
    assert_eq!(snapshot.models.len(), 1);
    assert_eq!(snapshot.models[0].brand_id, BrandId(56));

    assert_eq!(snapshot.vehicles.len(), 2);
    let years: Vec<YearId> = snapshot.vehicles.iter().map(|v| v.year_id).collect();
    assert_eq!(years, vec![YearId(2024), YearId(2023)]);
    assert!((snapshot.vehicles[1].price - 140_500.50).abs() < 1e-6);
    assert_eq!(snapshot.vehicles[0].model_id, ModelId(5585));
    assert_eq!(snapshot.vehicles[0].reference_table_id, ReferenceTableId(313));
    assert_eq!(snapshot.years.len(), 2);
    assert_eq!(snapshot.years[0].description, "2024 Gasolina");

    let stats = source.client().stats();
    assert_eq!(stats.total_requests, 6);
    assert_eq!(stats.succeeded, 6);
    assert_eq!(stats.by_endpoint["ConsultarValorComTodosParametros"], 2);
}

#[tokio::test]
async fn test_rate_limited_requests_are_retried_then_reported() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/ConsultarMarcas")
        .with_status(429)
        .expect(3)
        .create_async()
        .await;

    let client = FipeClient::new(&test_config(&server)).expect("create client");
    let err = client
        .brands(ReferenceTableId(313))
        .await
        .expect_err("rate limited request must fail");

    mock.assert_async().await;
    assert!(matches!(
        err,
        SourceError::RateLimited { attempts: 3, .. }
    ));
    assert!(err.is_transient());

    let stats = client.stats();
    assert_eq!(stats.total_requests, 3);
    assert_eq!(stats.rate_limited, 3);
    assert_eq!(stats.succeeded, 0);
}

#[tokio::test]
async fn test_server_error_is_not_retried() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/ConsultarTabelaDeReferencia")
        .with_status(500)
        .with_body("boom")
        .expect(1)
        .create_async()
        .await;

    let client = FipeClient::new(&test_config(&server)).expect("create client");
    let err = client
        .reference_tables()
        .await
        .expect_err("server error must fail");

    mock.assert_async().await;
    match err {
        SourceError::Http {
            status, message, ..
        } => {
            assert_eq!(status, 500);
            assert_eq!(message, "boom");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_price_api_error_body() {
    let mut server = mockito::Server::new_async().await;
    mock_json(
        &mut server,
        "ConsultarValorComTodosParametros",
        r#"{ "codigo": "0", "erro": "nadaencontrado" }"#,
    )
    .await;

    let client = FipeClient::new(&test_config(&server)).expect("create client");
    let err = client
        .price(ReferenceTableId(313), BrandId(56), ModelId(5585), "2024-1")
        .await
        .expect_err("API error must fail");

    assert!(matches!(err, SourceError::Api { ref message, .. } if message == "nadaencontrado"));
}

#[tokio::test]
async fn test_malformed_body_is_a_parse_error() {
    let mut server = mockito::Server::new_async().await;
    mock_json(&mut server, "ConsultarMarcas", "<html>maintenance</html>").await;

    let client = FipeClient::new(&test_config(&server)).expect("create client");
    let err = client
        .brands(ReferenceTableId(313))
        .await
        .expect_err("HTML body must fail");

    assert!(matches!(err, SourceError::Parse { .. }));
}

#[tokio::test]
async fn test_empty_reference_list_fails_fetch() {
    let mut server = mockito::Server::new_async().await;
    mock_json(&mut server, "ConsultarTabelaDeReferencia", "[]").await;

    let source = FipeSource::new(&test_config(&server)).expect("create source");
    let err = source.fetch().await.expect_err("no editions must fail");
    assert!(matches!(err, SourceError::InvalidValue { .. }));
}

#[tokio::test]
async fn test_transport_errors_are_retried_then_reported() {
    // Bind and release a port so nothing listens on it
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        listener.local_addr().expect("local addr").port()
    };

    let config = FipeConfig {
        base_url: format!("http://127.0.0.1:{port}/api/veiculos"),
        max_requests: 1000,
        per_seconds: 1,
        max_retries: 2,
        retry_delay_ms: 1,
        timeout_secs: 5,
        ..FipeConfig::default()
    };
    let client = FipeClient::new(&config).expect("create client");
    let err = client
        .reference_tables()
        .await
        .expect_err("closed port must fail");

    assert!(matches!(err, SourceError::Network(_)));
    assert!(err.is_transient());

    let stats = client.stats();
    assert_eq!(stats.total_requests, 2);
    assert_eq!(stats.failed, 2);
    assert_eq!(stats.succeeded, 0);
}

#[tokio::test]
async fn test_fetch_with_single_price_request_in_flight() {
    let mut server = mockito::Server::new_async().await;

    mock_json(
        &mut server,
        "ConsultarTabelaDeReferencia",
        r#"[{ "Codigo": 313, "Mes": "outubro/2024 " }]"#,
    )
    .await;
    mock_json(
        &mut server,
        "ConsultarMarcas",
        r#"[{ "Label": "Fiat", "Value": "21" }]"#,
    )
    .await;
    mock_json(
        &mut server,
        "ConsultarModelos",
        r#"{ "Modelos": [{ "Label": "Uno Mille", "Value": "4403" }] }"#,
    )
    .await;
    mock_json(
        &mut server,
        "ConsultarAnoModelo",
        r#"[
            { "Label": "2013 Flex", "Value": "2013-1" },
            { "Label": "2012 Flex", "Value": "2012-1" },
            { "Label": "2011 Flex", "Value": "2011-1" }
        ]"#,
    )
    .await;

    let mut price_mocks = Vec::new();
    for (year, price) in [("2013", "25.000,00"), ("2012", "22.000,00"), ("2011", "19.500,00")] {
        let body = format!(
            r#"{{ "Valor": "R$ {price}", "CodigoFipe": "001267-9", "Combustivel": "Flex", "AnoModelo": {year} }}"#
        );
        price_mocks.push(mock_price(&mut server, year, &body).await);
    }

    let config = FipeConfig {
        max_concurrent_requests: 1,
        ..test_config(&server)
    };
    let source = FipeSource::new(&config).expect("create source");
    let snapshot = source.fetch().await.expect("fetch snapshot");

    for mock in &price_mocks {
        mock.assert_async().await;
    }

    let years: Vec<YearId> = snapshot.vehicles.iter().map(|v| v.year_id).collect();
    assert_eq!(years, vec![YearId(2013), YearId(2012), YearId(2011)]);
    let prices: Vec<f64> = snapshot.vehicles.iter().map(|v| v.price).collect();
    assert_eq!(prices, vec![25_000.0, 22_000.0, 19_500.0]);
    assert_eq!(source.client().stats().by_endpoint["ConsultarValorComTodosParametros"], 3);
}
