//! Integration tests for the watcher
//!
//! These tests use wiremock to stand in for both the course catalog and the
//! Telegram Bot API, and run full crawl-reconcile-notify cycles end-to-end.

use course_watch::config::Config;
use course_watch::crawler::{crawl, run_watch};
use course_watch::model::CourseRecord;
use course_watch::notify::TelegramNotifier;
use course_watch::storage::{
    CourseStore, RunRecord, RunStats, RunStatus, SqliteStorage, StorageError, StorageResult,
};
use course_watch::WatchError;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

const DETAIL: &str = "/acfor-fo/actividades/101";
const ACTION: &str = "/acfor-fo/actividades/101/solicitud";

/// Creates a test configuration pointing at the mock catalog and mock Bot API
fn create_test_config(catalog: &MockServer, telegram: &MockServer) -> Config {
    let mut config = Config::default();
    config.crawler.root_url = format!("{}/", catalog.uri());
    config.crawler.allowed_domains = vec!["127.0.0.1".to_string()];
    config.crawler.request_delay_ms = 100; // Short for testing
    config.crawler.request_timeout_secs = 5;
    config.notifier.bot_token = Some("123:abc".to_string());
    config.notifier.chat_id = Some("-1001".to_string());
    config.notifier.api_base = telegram.uri();
    config
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(
        format!("<html><head><title>Catálogo</title></head><body>{}</body></html>", body),
        "text/html; charset=utf-8",
    )
}

fn listing_page(hrefs: &[&str]) -> ResponseTemplate {
    let links: String = hrefs
        .iter()
        .map(|href| format!(r#"<li><a href="{}">Curso</a></li>"#, href))
        .collect();
    html(format!("<ul>{}</ul>", links))
}

fn detail_page(title: Option<&str>, rows: &[(&str, &str)]) -> ResponseTemplate {
    let title = title
        .map(|t| format!(r#"<h1><span class="convocatoria-titulo">{}</span></h1>"#, t))
        .unwrap_or_default();
    let rows: String = rows
        .iter()
        .map(|(label, value)| {
            format!(
                r#"<div class="row">
                     <div class="col-xs-6 col-sm-4 col-md-2"><label>{}</label></div>
                     <div class="col-xs-6 col-sm-8 col-md-10"><span> {} </span></div>
                   </div>"#,
                label, value
            )
        })
        .collect();
    html(format!(
        r#"<div class="container page-body">{}{}<a href="{}">Solicitar plaza</a></div>"#,
        title, rows, ACTION
    ))
}

/// The detail page used by the basic scenarios: title plus three of five rows
fn three_field_detail() -> ResponseTemplate {
    detail_page(
        Some("Poda del aguacate"),
        &[
            ("Lugar de impartición:", "Güímar"),
            ("Período de impartición:", "Del 2 al 6 de junio"),
            ("Plazas disponibles:", "15"),
        ],
    )
}

async fn mount_catalog(catalog: &MockServer, detail_fetches: u64) {
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(listing_page(&[DETAIL, ACTION]))
        .mount(catalog)
        .await;

    Mock::given(method("GET"))
        .and(path(DETAIL))
        .respond_with(three_field_detail())
        .expect(detail_fetches)
        .mount(catalog)
        .await;

    Mock::given(method("GET"))
        .and(path(ACTION))
        .respond_with(html("Solicitud enviada".to_string()))
        .expect(0)
        .mount(catalog)
        .await;
}

async fn mount_telegram(telegram: &MockServer, messages: u64) {
    Mock::given(method("POST"))
        .and(path("/bot123:abc/sendMessage"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(r#"{"ok":true}"#, "application/json"),
        )
        .expect(messages)
        .mount(telegram)
        .await;
}

fn form_value(request: &Request, key: &str) -> Option<String> {
    url::form_urlencoded::parse(&request.body)
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

#[tokio::test]
async fn test_new_course_is_stored_and_announced() {
    let catalog = MockServer::start().await;
    let telegram = MockServer::start().await;
    mount_catalog(&catalog, 1).await;
    mount_telegram(&telegram, 1).await;

    let config = create_test_config(&catalog, &telegram);
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("cursos.db");
    let store = SqliteStorage::new(&db_path).unwrap();
    let notifier = TelegramNotifier::new(&config.notifier, reqwest::Client::new()).unwrap();

    let outcome = run_watch(&config, store, &notifier).await.unwrap();

    let address = format!("{}{}", catalog.uri(), DETAIL);
    assert_eq!(outcome.new_courses.len(), 1);
    assert_eq!(
        outcome.new_courses[0],
        CourseRecord {
            address: address.clone(),
            title: "Poda del aguacate".to_string(),
            location: "Güímar".to_string(),
            period: "Del 2 al 6 de junio".to_string(),
            schedule: String::new(),
            available_slots: "15".to_string(),
            cost: String::new(),
        }
    );
    assert_eq!(outcome.pages_fetched, 2);
    assert_eq!(outcome.pages_failed, 0);

    // Exactly one record persisted
    let store = SqliteStorage::new(&db_path).unwrap();
    assert_eq!(store.count_courses().unwrap(), 1);
    assert!(store.exists(&address).unwrap());

    // Exactly one course block, two fields empty
    let requests = telegram.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(form_value(&requests[0], "chat_id").as_deref(), Some("-1001"));
    assert_eq!(form_value(&requests[0], "parse_mode").as_deref(), Some("Markdown"));
    assert_eq!(form_value(&requests[0], "message_thread_id"), None);
    assert_eq!(
        form_value(&requests[0], "text").unwrap(),
        format!(
            "¡Hay cursos nuevos!\n\n\
             *Curso 1:*\n\
             Título: Poda del aguacate\n\
             Lugar: Güímar\n\
             Período: Del 2 al 6 de junio\n\
             Horario: \n\
             Plazas: 15\n\
             Costo: \n\
             [Ver más]({})\n\n",
            address
        )
    );
}

#[tokio::test]
async fn test_known_course_is_fetched_but_not_announced() {
    let catalog = MockServer::start().await;
    let telegram = MockServer::start().await;
    mount_catalog(&catalog, 1).await;
    mount_telegram(&telegram, 0).await;

    let config = create_test_config(&catalog, &telegram);
    let address = format!("{}{}", catalog.uri(), DETAIL);
    let mut store = SqliteStorage::new_in_memory().unwrap();
    store
        .insert(&CourseRecord::new(address, "Poda del aguacate"))
        .unwrap();
    let notifier = TelegramNotifier::new(&config.notifier, reqwest::Client::new()).unwrap();

    let outcome = run_watch(&config, store, &notifier).await.unwrap();

    assert!(outcome.new_courses.is_empty());
    assert_eq!(outcome.known_courses, 1);
}

#[tokio::test]
async fn test_second_run_finds_nothing_new() {
    let catalog = MockServer::start().await;
    let telegram = MockServer::start().await;
    mount_catalog(&catalog, 2).await;
    mount_telegram(&telegram, 1).await;

    let config = create_test_config(&catalog, &telegram);
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("cursos.db");
    let notifier = TelegramNotifier::new(&config.notifier, reqwest::Client::new()).unwrap();

    let first = run_watch(&config, SqliteStorage::new(&db_path).unwrap(), &notifier)
        .await
        .unwrap();
    let second = run_watch(&config, SqliteStorage::new(&db_path).unwrap(), &notifier)
        .await
        .unwrap();

    assert_eq!(first.new_courses.len(), 1);
    assert!(second.new_courses.is_empty());
    assert_eq!(second.known_courses, 1);

    let store = SqliteStorage::new(&db_path).unwrap();
    assert_eq!(store.count_courses().unwrap(), 1);

    let latest = store.get_latest_run().unwrap().unwrap();
    assert_eq!(Some(latest.id), second.run_id);
    assert_eq!(latest.status, RunStatus::Completed);
    assert_eq!(latest.new_courses, 0);
}

#[tokio::test]
async fn test_page_without_title_is_skipped() {
    let catalog = MockServer::start().await;
    let telegram = MockServer::start().await;
    mount_telegram(&telegram, 0).await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(listing_page(&[DETAIL]))
        .mount(&catalog)
        .await;
    Mock::given(method("GET"))
        .and(path(DETAIL))
        .respond_with(detail_page(None, &[("Importe:", "Gratuito")]))
        .expect(1)
        .mount(&catalog)
        .await;

    let config = create_test_config(&catalog, &telegram);
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("cursos.db");
    let notifier = TelegramNotifier::new(&config.notifier, reqwest::Client::new()).unwrap();

    let outcome = run_watch(&config, SqliteStorage::new(&db_path).unwrap(), &notifier)
        .await
        .unwrap();

    assert!(outcome.new_courses.is_empty());
    assert_eq!(outcome.pages_skipped, 2);
    assert_eq!(
        SqliteStorage::new(&db_path).unwrap().count_courses().unwrap(),
        0
    );
}

#[tokio::test]
async fn test_redirect_off_domain_is_never_followed() {
    let catalog = MockServer::start().await;
    let telegram = MockServer::start().await;
    let elsewhere = MockServer::start().await;
    mount_telegram(&telegram, 0).await;

    let elsewhere_port = url::Url::parse(&elsewhere.uri())
        .unwrap()
        .port()
        .unwrap();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(listing_page(&[DETAIL]))
        .mount(&catalog)
        .await;
    Mock::given(method("GET"))
        .and(path(DETAIL))
        .respond_with(ResponseTemplate::new(302).insert_header(
            "Location",
            format!("http://localhost:{}{}", elsewhere_port, DETAIL).as_str(),
        ))
        .mount(&catalog)
        .await;
    Mock::given(method("GET"))
        .respond_with(three_field_detail())
        .expect(0)
        .mount(&elsewhere)
        .await;

    let config = create_test_config(&catalog, &telegram);
    let outcome = crawl(&config, SqliteStorage::new_in_memory().unwrap())
        .await
        .unwrap();

    assert!(outcome.new_courses.is_empty());
    assert_eq!(outcome.pages_fetched, 1);
    assert_eq!(outcome.pages_failed, 1);
}

#[tokio::test]
async fn test_failed_pages_do_not_stop_the_crawl() {
    let catalog = MockServer::start().await;
    let telegram = MockServer::start().await;
    mount_telegram(&telegram, 0).await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(listing_page(&[
            "/acfor-fo/actividades/1",
            "/acfor-fo/actividades/2",
            "/acfor-fo/actividades/3",
        ]))
        .mount(&catalog)
        .await;
    Mock::given(method("GET"))
        .and(path("/acfor-fo/actividades/1"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&catalog)
        .await;
    Mock::given(method("GET"))
        .and(path("/acfor-fo/actividades/2"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("%PDF-1.4", "application/pdf"))
        .mount(&catalog)
        .await;
    Mock::given(method("GET"))
        .and(path("/acfor-fo/actividades/3"))
        .respond_with(detail_page(Some("Elaboración de queso"), &[("Importe:", "20 €")]))
        .mount(&catalog)
        .await;

    let config = create_test_config(&catalog, &telegram);
    let outcome = crawl(&config, SqliteStorage::new_in_memory().unwrap())
        .await
        .unwrap();

    assert_eq!(outcome.pages_fetched, 2);
    assert_eq!(outcome.pages_failed, 2);
    assert_eq!(outcome.new_courses.len(), 1);
    assert_eq!(outcome.new_courses[0].title, "Elaboración de queso");
    assert_eq!(outcome.new_courses[0].cost, "20 €");
}

#[tokio::test]
async fn test_report_follows_discovery_order() {
    let catalog = MockServer::start().await;
    let telegram = MockServer::start().await;

    let hrefs: Vec<String> = (1..=4).map(|n| format!("/acfor-fo/actividades/{}", n)).collect();
    let href_refs: Vec<&str> = hrefs.iter().map(String::as_str).collect();
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(listing_page(&href_refs))
        .mount(&catalog)
        .await;
    for (n, href) in hrefs.iter().enumerate() {
        let title = format!("Curso número {}", n + 1);
        Mock::given(method("GET"))
            .and(path(href.as_str()))
            .respond_with(detail_page(Some(title.as_str()), &[]))
            .mount(&catalog)
            .await;
    }

    let mut config = create_test_config(&catalog, &telegram);
    config.crawler.max_concurrent_requests = 3;
    let outcome = crawl(&config, SqliteStorage::new_in_memory().unwrap())
        .await
        .unwrap();

    let titles: Vec<_> = outcome.new_courses.iter().map(|c| c.title.as_str()).collect();
    assert_eq!(
        titles,
        vec![
            "Curso número 1",
            "Curso número 2",
            "Curso número 3",
            "Curso número 4"
        ]
    );
}

#[tokio::test]
async fn test_notification_failure_keeps_the_run() {
    let catalog = MockServer::start().await;
    let telegram = MockServer::start().await;
    mount_catalog(&catalog, 1).await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&telegram)
        .await;

    let config = create_test_config(&catalog, &telegram);
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("cursos.db");
    let notifier = TelegramNotifier::new(&config.notifier, reqwest::Client::new()).unwrap();

    let outcome = run_watch(&config, SqliteStorage::new(&db_path).unwrap(), &notifier)
        .await
        .unwrap();

    assert_eq!(outcome.new_courses.len(), 1);
    assert_eq!(
        SqliteStorage::new(&db_path).unwrap().count_courses().unwrap(),
        1
    );
}

#[tokio::test]
async fn test_thread_id_is_forwarded() {
    let catalog = MockServer::start().await;
    let telegram = MockServer::start().await;
    mount_catalog(&catalog, 1).await;
    mount_telegram(&telegram, 1).await;

    let mut config = create_test_config(&catalog, &telegram);
    config.notifier.thread_id = Some("42".to_string());
    let notifier = TelegramNotifier::new(&config.notifier, reqwest::Client::new()).unwrap();

    run_watch(&config, SqliteStorage::new_in_memory().unwrap(), &notifier)
        .await
        .unwrap();

    let requests = telegram.received_requests().await.unwrap();
    assert_eq!(
        form_value(&requests[0], "message_thread_id").as_deref(),
        Some("42")
    );
}

/// Store whose reads fail; everything else goes to a real database
struct UnreadableStore {
    inner: SqliteStorage,
}

impl CourseStore for UnreadableStore {
    fn exists(&self, _address: &str) -> StorageResult<bool> {
        Err(StorageError::Sqlite(rusqlite::Error::InvalidQuery))
    }
    fn insert(&mut self, course: &CourseRecord) -> StorageResult<()> {
        self.inner.insert(course)
    }
    fn get_course(&self, address: &str) -> StorageResult<Option<CourseRecord>> {
        self.inner.get_course(address)
    }
    fn count_courses(&self) -> StorageResult<u64> {
        self.inner.count_courses()
    }
    fn recent_courses(&self, limit: usize) -> StorageResult<Vec<CourseRecord>> {
        self.inner.recent_courses(limit)
    }
    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64> {
        self.inner.create_run(config_hash)
    }
    fn complete_run(&mut self, run_id: i64, stats: &RunStats) -> StorageResult<()> {
        self.inner.complete_run(run_id, stats)
    }
    fn fail_run(&mut self, run_id: i64, stats: &RunStats) -> StorageResult<()> {
        self.inner.fail_run(run_id, stats)
    }
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        self.inner.get_run(run_id)
    }
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        self.inner.get_latest_run()
    }
}

#[tokio::test]
async fn test_store_read_failure_aborts_the_run() {
    let catalog = MockServer::start().await;
    let telegram = MockServer::start().await;
    mount_catalog(&catalog, 1).await;
    mount_telegram(&telegram, 0).await;

    let config = create_test_config(&catalog, &telegram);
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("cursos.db");
    let store = UnreadableStore {
        inner: SqliteStorage::new(&db_path).unwrap(),
    };
    let notifier = TelegramNotifier::new(&config.notifier, reqwest::Client::new()).unwrap();

    let result = run_watch(&config, store, &notifier).await;
    assert!(matches!(result, Err(WatchError::StorageError(_))));

    // The run is recorded as failed and nothing was stored
    let store = SqliteStorage::new(&db_path).unwrap();
    let run = store.get_latest_run().unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Failed);
    assert_eq!(store.count_courses().unwrap(), 0);
}

/// Records when each request arrives, then answers after a fixed delay
struct SlowDetail {
    arrivals: Arc<Mutex<Vec<Instant>>>,
    delay: Duration,
}

impl Respond for SlowDetail {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        self.arrivals.lock().unwrap().push(Instant::now());
        detail_page(Some("Apicultura"), &[("Importe:", "Gratuito")]).set_delay(self.delay)
    }
}

#[tokio::test]
async fn test_requests_in_flight_never_exceed_the_limit() {
    let catalog = MockServer::start().await;
    let telegram = MockServer::start().await;

    let hrefs: Vec<String> = (1..=8).map(|i| format!("/acfor-fo/actividades/{}", i)).collect();
    let hrefs: Vec<&str> = hrefs.iter().map(String::as_str).collect();
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(listing_page(&hrefs))
        .mount(&catalog)
        .await;

    let arrivals = Arc::new(Mutex::new(Vec::new()));
    let delay = Duration::from_millis(400);
    Mock::given(method("GET"))
        .and(path_regex(r"^/acfor-fo/actividades/\d+$"))
        .respond_with(SlowDetail {
            arrivals: Arc::clone(&arrivals),
            delay,
        })
        .expect(8)
        .mount(&catalog)
        .await;

    let mut config = create_test_config(&catalog, &telegram);
    config.crawler.max_concurrent_requests = 3;
    config.crawler.request_delay_ms = 10;

    let outcome = crawl(&config, SqliteStorage::new_in_memory().unwrap())
        .await
        .unwrap();
    assert_eq!(outcome.new_courses.len(), 8);

    // A fourth request can only start once a slow response has come back,
    // so no window shorter than the delay holds more than three arrivals
    let arrivals = arrivals.lock().unwrap().clone();
    let window = delay - Duration::from_millis(100);
    let busiest = arrivals
        .iter()
        .map(|start| {
            arrivals
                .iter()
                .filter(|t| **t >= *start && **t - *start < window)
                .count()
        })
        .max()
        .unwrap_or(0);
    assert!(busiest <= 3, "{} requests started within {:?}", busiest, window);
}
