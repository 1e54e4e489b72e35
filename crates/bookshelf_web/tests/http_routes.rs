use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bookshelf_core::{BookStore, NewBook};
use bookshelf_web::{build_router, AppState};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

struct RawResponse {
    status: u16,
    head: String,
    body: String,
}

impl RawResponse {
    fn header(&self, name: &str) -> Option<String> {
        let prefix = format!("{}:", name.to_ascii_lowercase());
        self.head
            .lines()
            .find(|line| line.to_ascii_lowercase().starts_with(&prefix))
            .map(|line| line[prefix.len()..].trim().to_string())
    }

    /// `bookshelf_flash=<token>` pair from `Set-Cookie`, ready to echo back.
    fn flash_cookie(&self) -> String {
        let value = self.header("set-cookie").expect("set-cookie header");
        value
            .split(';')
            .next()
            .expect("cookie pair")
            .trim()
            .to_string()
    }
}

async fn serve(store: Arc<BookStore>) -> SocketAddr {
    let app = build_router(AppState::new(store));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("listener addr");
    tokio::spawn(async move { axum::serve(listener, app).await.expect("serve app") });
    addr
}

async fn spawn_app() -> (SocketAddr, Arc<BookStore>) {
    let store = Arc::new(BookStore::open_in_memory().expect("open store"));
    let addr = serve(Arc::clone(&store)).await;
    (addr, store)
}

/// File-backed app plus the database path, for tests that reach around it.
async fn spawn_file_app(dir: &tempfile::TempDir) -> (SocketAddr, Arc<BookStore>, PathBuf) {
    let db_path = dir.path().join("new-books-collection.db");
    let store = Arc::new(BookStore::open(&db_path).expect("open file store"));
    let addr = serve(Arc::clone(&store)).await;
    (addr, store, db_path)
}

fn install_trigger(db_path: &Path, sql: &str) {
    let conn = rusqlite::Connection::open(db_path).expect("side connection");
    conn.execute_batch(sql).expect("install trigger");
}

async fn flash_text(addr: SocketAddr, resp: &RawResponse) -> String {
    let cookie = resp.flash_cookie();
    send(addr, "GET", "/", &[("Cookie", &cookie)], None).await.body
}

async fn send(
    addr: SocketAddr,
    method: &str,
    path: &str,
    headers: &[(&str, &str)],
    form_body: Option<&str>,
) -> RawResponse {
    let Some(body) = form_body else {
        return send_raw(addr, method, path, headers, "").await;
    };
    let length = body.len().to_string();
    let mut all = headers.to_vec();
    all.push(("Content-Type", "application/x-www-form-urlencoded"));
    all.push(("Content-Length", length.as_str()));
    send_raw(addr, method, path, &all, body).await
}

async fn send_raw(
    addr: SocketAddr,
    method: &str,
    path: &str,
    headers: &[(&str, &str)],
    body: &str,
) -> RawResponse {
    let mut stream = tokio::net::TcpStream::connect(addr)
        .await
        .expect("connect server");
    let mut req = format!("{method} {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n");
    for (k, v) in headers {
        req.push_str(&format!("{k}: {v}\r\n"));
    }
    req.push_str("\r\n");
    req.push_str(body);
    stream
        .write_all(req.as_bytes())
        .await
        .expect("write request");
    let mut response = String::new();
    stream
        .read_to_string(&mut response)
        .await
        .expect("read response");
    let (head, body) = response
        .split_once("\r\n\r\n")
        .expect("http response must have separator");
    let status = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|s| s.parse::<u16>().ok())
        .expect("http status");
    RawResponse {
        status,
        head: head.to_string(),
        body: body.to_string(),
    }
}

async fn get(addr: SocketAddr, path: &str) -> RawResponse {
    send(addr, "GET", path, &[], None).await
}

async fn post(addr: SocketAddr, path: &str, body: &str) -> RawResponse {
    send(addr, "POST", path, &[], Some(body)).await
}

fn count(store: &BookStore) -> u64 {
    store
        .with_service(|service| service.count_books())
        .expect("count books")
}

fn seed(store: &BookStore, name: &str, author: &str, rating: f64) -> i64 {
    store
        .with_service(|service| service.add_book(NewBook::new(name, author, rating)))
        .expect("seed book")
        .id
}

#[tokio::test]
async fn empty_library_renders_notice() {
    let (addr, _store) = spawn_app().await;

    let resp = get(addr, "/").await;
    assert_eq!(resp.status, 200);
    assert!(resp
        .header("content-type")
        .unwrap_or_default()
        .starts_with("text/html"));
    assert!(resp.body.contains("Library is empty."));
    assert!(resp.body.contains("href=\"/add\""));
}

#[tokio::test]
async fn add_form_renders_empty_fields() {
    let (addr, _store) = spawn_app().await;

    let resp = get(addr, "/add").await;
    assert_eq!(resp.status, 200);
    assert!(resp.body.contains("name=\"name\" value=\"\""));
    assert!(!resp.body.contains("This field is required."));
}

#[tokio::test]
async fn add_book_redirects_and_flash_is_shown_once() {
    let (addr, store) = spawn_app().await;

    let resp = post(addr, "/add", "name=Dune&author=Herbert&rating=4.8").await;
    assert_eq!(resp.status, 303);
    assert_eq!(resp.header("location").as_deref(), Some("/"));
    assert_eq!(count(&store), 1);

    let cookie = resp.flash_cookie();
    let first = send(addr, "GET", "/", &[("Cookie", &cookie)], None).await;
    assert_eq!(first.status, 200);
    assert!(first.body.contains("Dune - Herbert - 4.8/10"));
    assert!(first.body.contains("Book added successfully"));
    assert!(first
        .header("set-cookie")
        .unwrap_or_default()
        .contains("Max-Age=0"));

    let second = send(addr, "GET", "/", &[("Cookie", &cookie)], None).await;
    assert!(second.body.contains("Dune - Herbert - 4.8/10"));
    assert!(!second.body.contains("Book added successfully"));
}

#[tokio::test]
async fn add_with_empty_name_rerenders_without_insert() {
    let (addr, store) = spawn_app().await;

    let resp = post(addr, "/add", "name=&author=Herbert&rating=4.8").await;
    assert_eq!(resp.status, 200);
    assert!(resp.body.contains("This field is required."));
    assert!(resp.body.contains("value=\"Herbert\""));
    assert!(resp.header("set-cookie").is_none());
    assert_eq!(count(&store), 0);
}

#[tokio::test]
async fn add_with_bad_rating_reports_float_error() {
    let (addr, store) = spawn_app().await;

    let resp = post(addr, "/add", "name=Dune&author=Herbert&rating=great").await;
    assert_eq!(resp.status, 200);
    assert!(resp.body.contains("Not a valid float value."));
    assert_eq!(count(&store), 0);
}

#[tokio::test]
async fn duplicate_book_redirects_with_error_flash() {
    let (addr, store) = spawn_app().await;
    seed(&store, "Dune", "Herbert", 4.8);

    let resp = post(addr, "/add", "name=Dune&author=Someone&rating=3").await;
    assert_eq!(resp.status, 303);
    assert_eq!(count(&store), 1);

    let cookie = resp.flash_cookie();
    let page = send(addr, "GET", "/", &[("Cookie", &cookie)], None).await;
    assert!(page.body.contains("alert-danger"));
    assert!(page
        .body
        .contains("Error adding book: a book with this name already exists"));
}

#[tokio::test]
async fn delete_existing_book_via_get_and_post() {
    let (addr, store) = spawn_app().await;
    let dune = seed(&store, "Dune", "Herbert", 4.8);
    let neuromancer = seed(&store, "Neuromancer", "Gibson", 4.1);

    let resp = get(addr, &format!("/delete/{dune}")).await;
    assert_eq!(resp.status, 303);
    assert_eq!(count(&store), 1);
    let cookie = resp.flash_cookie();
    let page = send(addr, "GET", "/", &[("Cookie", &cookie)], None).await;
    assert!(page.body.contains("Book deleted successfully"));
    assert!(!page.body.contains("Dune"));

    let resp = send(
        addr,
        "POST",
        &format!("/delete/{neuromancer}"),
        &[("Content-Length", "0")],
        None,
    )
    .await;
    assert_eq!(resp.status, 303);
    assert_eq!(count(&store), 0);
}

#[tokio::test]
async fn delete_missing_book_is_not_found() {
    let (addr, store) = spawn_app().await;
    seed(&store, "Dune", "Herbert", 4.8);

    let resp = get(addr, "/delete/999").await;
    assert_eq!(resp.status, 404);
    assert!(resp.body.contains("Not Found"));
    assert_eq!(count(&store), 1);
}

#[tokio::test]
async fn edit_rating_round_trip() {
    let (addr, store) = spawn_app().await;
    let id = seed(&store, "Dune", "Herbert", 4.8);
    seed(&store, "Neuromancer", "Gibson", 4.1);

    let form = get(addr, &format!("/edit_rating/{id}")).await;
    assert_eq!(form.status, 200);
    assert!(form.body.contains("Book Name: Dune"));
    assert!(form.body.contains("name=\"rating\" value=\"4.8\""));

    let invalid = post(addr, &format!("/edit_rating/{id}"), "rating=abc").await;
    assert_eq!(invalid.status, 200);
    assert!(invalid.body.contains("Not a valid float value."));
    assert!(invalid.body.contains("value=\"abc\""));

    let resp = post(addr, &format!("/edit_rating/{id}"), "rating=4.9").await;
    assert_eq!(resp.status, 303);
    let cookie = resp.flash_cookie();
    let page = send(addr, "GET", "/", &[("Cookie", &cookie)], None).await;
    assert!(page.body.contains("Book rating edited successfully"));
    assert!(page.body.contains("Dune - Herbert - 4.9/10"));
    assert!(page.body.contains("Neuromancer - Gibson - 4.1/10"));
}

#[tokio::test]
async fn edit_rating_of_missing_or_malformed_id_is_not_found() {
    let (addr, _store) = spawn_app().await;

    assert_eq!(get(addr, "/edit_rating/7").await.status, 404);
    assert_eq!(post(addr, "/edit_rating/7", "rating=1").await.status, 404);
    assert_eq!(get(addr, "/edit_rating/seven").await.status, 404);
    assert_eq!(get(addr, "/no/such/page").await.status, 404);
}

#[tokio::test]
async fn book_text_is_html_escaped() {
    let (addr, store) = spawn_app().await;
    seed(&store, "<i>Dune</i>", "Herbert & Son", 4.0);

    let page = get(addr, "/").await;
    assert!(page.body.contains("&lt;i&gt;Dune&lt;/i&gt; - Herbert &amp; Son - 4/10"));
    assert!(!page.body.contains("<i>Dune</i>"));
}

#[tokio::test]
async fn books_added_over_http_are_written_to_the_database_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (addr, _store, db_path) = spawn_file_app(&dir).await;

    let resp = post(addr, "/add", "name=Dune&author=Herbert&rating=4.8").await;
    assert_eq!(resp.status, 303);

    let other = BookStore::open(&db_path).expect("second connection");
    let books = other
        .with_service(|service| service.list_books())
        .expect("list books");
    assert_eq!(books.len(), 1);
    assert_eq!(books[0].name, "Dune");
    assert_eq!(books[0].rating, 4.8);
    other.close().expect("close second connection");
}

#[tokio::test]
async fn add_without_form_body_rerenders_required_errors() {
    let (addr, store) = spawn_app().await;

    let empty = send(addr, "POST", "/add", &[("Content-Length", "0")], None).await;
    assert_eq!(empty.status, 200);
    assert!(empty.body.contains("This field is required."));

    let multipart_body = "--xyz\r\nContent-Disposition: form-data; name=\"name\"\r\n\r\nDune\r\n--xyz--\r\n";
    let length = multipart_body.len().to_string();
    let multipart = send_raw(
        addr,
        "POST",
        "/add",
        &[
            ("Content-Type", "multipart/form-data; boundary=xyz"),
            ("Content-Length", length.as_str()),
        ],
        multipart_body,
    )
    .await;
    assert_eq!(multipart.status, 200);
    assert!(multipart.body.contains("This field is required."));
    assert_eq!(count(&store), 0);
}

#[tokio::test]
async fn edit_rating_of_missing_book_is_not_found_whatever_the_body() {
    let (addr, store) = spawn_app().await;
    let id = seed(&store, "Dune", "Herbert", 4.8);

    let missing = send(addr, "POST", "/edit_rating/7", &[("Content-Length", "0")], None).await;
    assert_eq!(missing.status, 404);

    let empty = send(
        addr,
        "POST",
        &format!("/edit_rating/{id}"),
        &[("Content-Length", "0")],
        None,
    )
    .await;
    assert_eq!(empty.status, 200);
    assert!(empty.body.contains("This field is required."));
    assert!(empty.body.contains("Book Name: Dune"));
}

#[tokio::test]
async fn failed_delete_rolls_back_and_flashes_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (addr, store, db_path) = spawn_file_app(&dir).await;
    let id = seed(&store, "Dune", "Herbert", 4.8);
    install_trigger(
        &db_path,
        "CREATE TRIGGER keep_books BEFORE DELETE ON books \
         BEGIN SELECT RAISE(ABORT, 'books are permanent'); END;",
    );

    let resp = get(addr, &format!("/delete/{id}")).await;
    assert_eq!(resp.status, 303);
    assert_eq!(resp.header("location").as_deref(), Some("/"));
    assert_eq!(count(&store), 1);

    let page = flash_text(addr, &resp).await;
    assert!(page.contains("alert-danger"));
    assert!(page.contains("Error deleting book"));
    assert!(page.contains("Dune - Herbert - 4.8/10"));
}

#[tokio::test]
async fn failed_rating_update_rolls_back_and_flashes_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (addr, store, db_path) = spawn_file_app(&dir).await;
    let id = seed(&store, "Dune", "Herbert", 4.8);
    install_trigger(
        &db_path,
        "CREATE TRIGGER freeze_ratings BEFORE UPDATE ON books \
         BEGIN SELECT RAISE(ABORT, 'ratings are frozen'); END;",
    );

    let resp = post(addr, &format!("/edit_rating/{id}"), "rating=1.5").await;
    assert_eq!(resp.status, 303);

    let page = flash_text(addr, &resp).await;
    assert!(page.contains("alert-danger"));
    assert!(page.contains("Error editing book rating: constraint violation: ratings are frozen"));
    assert!(page.contains("Dune - Herbert - 4.8/10"));

    let stored = store
        .with_service(move |service| service.get_book(id))
        .expect("get book");
    assert_eq!(stored.rating, 4.8);
    assert_eq!(count(&store), 1);
}
