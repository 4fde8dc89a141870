//! Integration tests for the harvester
//!
//! These tests use wiremock to create mock directory sites and run the
//! full category cycle end-to-end over the HTTP backend.

use lead_harvest::config::Config;
use lead_harvest::output::{CsvStore, TabularStore};
use lead_harvest::render::http::HttpBackend;
use lead_harvest::state::{JsonStatusFile, StatusReporter};
use lead_harvest::{CrawlUnit, Harvester};
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

/// Matches requests without the given query parameter
struct MissingQueryParam(&'static str);

impl Match for MissingQueryParam {
    fn matches(&self, request: &Request) -> bool {
        !request.url.query_pairs().any(|(key, _)| key == self.0)
    }
}

/// Creates a test configuration writing into `dir` without any pacing
fn create_test_config(dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.crawler = config.crawler.without_delays();
    config.crawler.navigation_timeout_ms = 5_000;
    config.output.directory = dir.path().to_path_buf();
    config.output.status_path = dir.path().join("status.json");
    config
}

fn listing_html(slugs: &[&str], pages: u32) -> String {
    let mut html = String::from("<html><body><ul>");
    for slug in slugs {
        html.push_str(&format!(
            r#"<li><a class="duration-200" href="/{}/">{}</a></li>"#,
            slug, slug
        ));
    }
    html.push_str("</ul><nav>");
    for page in 2..=pages {
        html.push_str(&format!(r#"<a href="/miel/?page={}">{}</a>"#, page, page));
    }
    html.push_str("</nav></body></html>");
    html
}

fn detail_html(name: &str, body: &str) -> String {
    format!(
        r#"<html><head><title>{} | Proveedores.com</title></head><body><div class="flex-1"><h1>{}</h1><p>{}</p></div></body></html>"#,
        name, name, body
    )
}

async fn mount_listing(server: &MockServer, page: u32, html: String) {
    let mock = Mock::given(method("GET")).and(path("/miel/"));
    let mock = if page == 1 {
        mock.and(MissingQueryParam("page"))
    } else {
        mock.and(query_param("page", page.to_string()))
    };
    mock.respond_with(ResponseTemplate::new(200).set_body_string(html))
        .mount(server)
        .await;
}

async fn mount_detail(server: &MockServer, slug: &str, html: String) {
    Mock::given(method("GET"))
        .and(path(format!("/{}/", slug)))
        .respond_with(ResponseTemplate::new(200).set_body_string(html))
        .expect(1)
        .mount(server)
        .await;
}

fn unit(config: &Config, server: &MockServer) -> CrawlUnit {
    config.unit_for_url(&format!("{}/miel/", server.uri()), None)
}

#[tokio::test]
async fn test_full_harvest_over_two_listing_pages() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_listing(&server, 1, listing_html(&["acme-foods", "miel-sur", "sin-datos"], 2)).await;
    mount_listing(&server, 2, listing_html(&["colmenas-norte"], 2)).await;

    mount_detail(
        &server,
        "acme-foods",
        detail_html(
            "Acme Foods",
            "Contacto: ventas@acme.example, fabricamos y exportamos productos",
        ),
    )
    .await;
    mount_detail(
        &server,
        "miel-sur",
        detail_html("Miel Sur", "Apicultores en Granada. Tel 958 12 34 56"),
    )
    .await;
    mount_detail(
        &server,
        "colmenas-norte",
        detail_html("Colmenas Norte", "Distribuidor en Asturias"),
    )
    .await;
    // a missing page is retried like any transport failure, never stored
    Mock::given(method("GET"))
        .and(path("/sin-datos/"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_string("<html><body><h1>Página no encontrada</h1></body></html>"),
        )
        .expect(3)
        .mount(&server)
        .await;

    let config = create_test_config(&dir);
    let unit = unit(&config, &server);
    let mut status = StatusReporter::new(JsonStatusFile::new(dir.path().join("status.json")));
    let harvester = Harvester::new(config, HttpBackend::new().unwrap()).unwrap();

    let report = harvester.run_category(&unit, &mut status).await.unwrap();

    assert_eq!(report.label, "Miel");
    assert_eq!(report.urls_found, 4);
    assert_eq!(report.records, 3);
    assert_eq!(report.failed_urls, vec![format!("{}/sin-datos/", server.uri())]);

    let rows = CsvStore.read_sheet(&dir.path().join("miel.csv")).unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].name, "Acme Foods");
    assert_eq!(rows[0].email, "ventas@acme.example");
    assert_eq!(rows[0].provider_type, "Fabricantes, Exportadores");
    assert_eq!(rows[0].category, "Miel");
    assert_eq!(rows[1].name, "Miel Sur");
    assert_eq!(rows[1].region, "Granada");
    assert_eq!(rows[2].name, "Colmenas Norte");
    assert_eq!(rows[2].url, format!("{}/colmenas-norte/", server.uri()));

    let failed = std::fs::read_to_string(dir.path().join("miel_failed_urls.txt")).unwrap();
    assert_eq!(failed.lines().count(), 1);

    let published: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("status.json")).unwrap())
            .unwrap();
    assert_eq!(published["phase"], "completed");
    assert_eq!(published["itemsDone"], 3);
    assert_eq!(published["itemsFailed"], 1);
    assert_eq!(published["totalPages"], 2);
}

#[tokio::test]
async fn test_block_page_is_retried() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_listing(&server, 1, listing_html(&["acme-foods"], 1)).await;
    Mock::given(method("GET"))
        .and(path("/acme-foods/"))
        .respond_with(
            ResponseTemplate::new(429)
                .set_body_string("<html><body><h1>Error 1015</h1><p>You are being rate limited</p></body></html>"),
        )
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    mount_detail(
        &server,
        "acme-foods",
        detail_html("Acme Foods", "ventas@acme.example"),
    )
    .await;

    let config = create_test_config(&dir);
    let unit = unit(&config, &server);
    let harvester = Harvester::new(config, HttpBackend::new().unwrap()).unwrap();

    let report = harvester
        .run_category(&unit, &mut StatusReporter::silent())
        .await
        .unwrap();

    assert_eq!(report.records, 1);
    assert!(report.failed_urls.is_empty());
    assert!(!dir.path().join("miel_failed_urls.txt").exists());

    let rows = CsvStore.read_sheet(&unit.output).unwrap();
    assert_eq!(rows[0].name, "Acme Foods");
}

#[tokio::test]
async fn test_server_error_is_retried_then_stored() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_listing(&server, 1, listing_html(&["acme-foods"], 1)).await;
    Mock::given(method("GET"))
        .and(path("/acme-foods/"))
        .respond_with(
            ResponseTemplate::new(503)
                .set_body_string("<html><body><h1>Service Unavailable</h1></body></html>"),
        )
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    mount_detail(&server, "acme-foods", detail_html("Acme Foods", "")).await;

    let config = create_test_config(&dir);
    let unit = unit(&config, &server);
    let harvester = Harvester::new(config, HttpBackend::new().unwrap()).unwrap();

    let report = harvester
        .run_category(&unit, &mut StatusReporter::silent())
        .await
        .unwrap();

    assert_eq!(report.records, 1);
    let rows = CsvStore.read_sheet(&unit.output).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].name, "Acme Foods");
}

#[tokio::test]
async fn test_second_run_resumes_without_refetching() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_listing(&server, 1, listing_html(&["acme-foods", "miel-sur"], 1)).await;
    mount_detail(&server, "acme-foods", detail_html("Acme Foods", "")).await;
    mount_detail(&server, "miel-sur", detail_html("Miel Sur", "")).await;

    let config = create_test_config(&dir);
    let unit = unit(&config, &server);
    let harvester = Harvester::new(config, HttpBackend::new().unwrap()).unwrap();

    let first = harvester
        .run_category(&unit, &mut StatusReporter::silent())
        .await
        .unwrap();
    let second = harvester
        .run_category(&unit, &mut StatusReporter::silent())
        .await
        .unwrap();

    assert_eq!(first.records, 2);
    assert_eq!(second.records, 0);
    assert_eq!(second.skipped, 2);
    assert_eq!(second.total_leads, 2);
    assert_eq!(CsvStore.read_sheet(&unit.output).unwrap().len(), 2);
}

#[tokio::test]
async fn test_unreachable_listing_fails_category() {
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir);
    let unit = config.unit_for_url("http://127.0.0.1:9/miel/", None);
    let mut status = StatusReporter::new(JsonStatusFile::new(dir.path().join("status.json")));
    let harvester = Harvester::new(config, HttpBackend::new().unwrap()).unwrap();

    let result = harvester.run_category(&unit, &mut status).await;

    assert!(result.is_err());
    let published: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("status.json")).unwrap())
            .unwrap();
    assert_eq!(published["phase"], "error");
    assert!(published["error"].is_string());
}
