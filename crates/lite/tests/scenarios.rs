//! End-to-end request handling through the in-memory client.

use bytes::Bytes;
use http::StatusCode;
use lite::prelude::*;
use lite_test::{MultipartForm, TestClient};
use validator::Validate;

#[derive(LiteRequest)]
struct GetFoo {
    #[lite("path=id")]
    id: u64,
}

#[derive(Debug, Serialize, Deserialize, Describe, PartialEq)]
#[serde(rename = "response")]
struct FooResponse {
    id: u64,
    message: String,
}

fn hello(id: u64) -> FooResponse {
    FooResponse {
        id,
        message: "Hello World".to_string(),
    }
}

async fn get_foo(mut cx: Context<GetFoo>) -> Result<FooResponse, HttpError> {
    let request = cx.requests()?;
    Ok(hello(request.id))
}

async fn get_foo_xml(mut cx: Context<GetFoo>) -> Result<FooResponse, HttpError> {
    cx.set_content_type("application/xml");
    let request = cx.requests()?;
    Ok(hello(request.id))
}

#[derive(Debug, Deserialize, Describe)]
#[serde(rename = "request")]
struct NewFoo {
    id: f64,
}

#[derive(LiteRequest)]
struct CreateFoo {
    #[lite("req=body")]
    body: NewFoo,
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
async fn create_foo(mut cx: Context<CreateFoo>) -> Result<FooResponse, HttpError> {
    let request = cx.requests()?;
    Ok(hello(request.body.id as u64))
}

async fn delete_foo(mut cx: Context<GetFoo>) -> Result<(), HttpError> {
    cx.requests()?;
    Ok(())
}

fn app() -> App {
    let mut app = App::new().disable_local_save(true);
    app.get("/foo/:id", get_foo);
    app.get("/xml/:id", get_foo_xml);
    app.post("/foo", create_foo);
    app.delete("/foo/:id", delete_foo);
    app
}

fn client() -> TestClient {
    TestClient::new(app()).unwrap()
}

#[tokio::test]
async fn get_with_path_parameter() {
    let response = client().get("/foo/123").send().await;
    response
        .assert_status(StatusCode::OK)
        .assert_content_type("application/json");
    assert_eq!(response.text().unwrap(), r#"{"id":123,"message":"Hello World"}"#);
}

#[tokio::test]
async fn handler_switches_to_xml() {
    let response = client().get("/xml/123").send().await;
    response
        .assert_status(StatusCode::OK)
        .assert_content_type("application/xml");
    assert_eq!(
        response.text().unwrap(),
        "<response><id>123</id><message>Hello World</message></response>"
    );
}

#[tokio::test]
async fn post_json_body() {
    let response = client()
        .post("/foo")
        .content_type("application/json")
        .body(r#"{"id":123}"#)
        .send()
        .await;
    response.assert_status(StatusCode::CREATED);
    assert_eq!(response.text().unwrap(), r#"{"id":123,"message":"Hello World"}"#);
}

#[tokio::test]
async fn post_json_body_with_charset() {
    let response = client()
        .post("/foo")
        .content_type("Application/JSON; charset=utf-8")
        .body(r#"{"id":7}"#)
        .send()
        .await;
    response.assert_status(StatusCode::CREATED);
    assert_eq!(response.json::<FooResponse>().unwrap(), hello(7));
}

#[tokio::test]
async fn post_xml_body() {
    let response = client()
        .post("/foo")
        .content_type("application/xml")
        .body("<request><id>5</id></request>")
        .send()
        .await;
    response.assert_status(StatusCode::CREATED);
    assert_eq!(response.json::<FooResponse>().unwrap(), hello(5));
}

#[tokio::test]
async fn unterminated_xml_is_a_server_error() {
    let response = client()
        .post("/foo")
        .content_type("application/xml")
        .body("<request><id>abc</id>")
        .send()
        .await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let err: HttpError = response.json().unwrap();
    assert_eq!(err.context.as_deref(), Some(lite::core::REQUEST_BODY_ERROR_CONTEXT));
}

#[tokio::test]
async fn well_formed_xml_with_a_bad_value_is_a_bad_request() {
    let response = client()
        .post("/foo")
        .content_type("application/xml")
        .body("<request><id>abc</id></request>")
        .send()
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_content_type_is_a_bad_request() {
    let response = client()
        .post("/foo")
        .content_type("application/x-unknown")
        .body("id=1")
        .send()
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn delete_returns_no_content() {
    let response = client().delete("/foo/123").send().await;
    response.assert_status(StatusCode::NO_CONTENT);
    assert!(response.bytes().is_empty());
    assert!(response.content_type().is_none());
}

#[tokio::test]
async fn bad_path_parameter() {
    let response = client().get("/foo/abc").send().await;
    response.assert_status(StatusCode::BAD_REQUEST);
    response.assert_body_contains("path parameter `id`");

    let response = client().get("/foo/99999999999999999999999").send().await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[derive(LiteRequest)]
struct GetPet {
    #[lite("path=name")]
    name: String,
}

#[derive(Serialize, Describe)]
struct Pet {
    name: String,
}

async fn get_pet(mut cx: Context<GetPet>) -> Result<Pet, HttpError> {
    let request = cx.requests()?;
    Ok(Pet { name: request.name })
}

#[tokio::test]
async fn path_parameters_are_percent_decoded() {
    let mut app = App::new().disable_local_save(true);
    app.get("/pets/:name", get_pet);
    let client = TestClient::new(app).unwrap();

    let response = client.get("/pets/hello%20world").send().await;
    response.assert_status(StatusCode::OK);
    assert_eq!(response.text().unwrap(), r#"{"name":"hello world"}"#);

    let response = client.get("/pets/%C3%A9t%C3%A9%2Fhiver").send().await;
    assert_eq!(response.text().unwrap(), r#"{"name":"été/hiver"}"#);

    let response = client.get("/pets/%FF").send().await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[derive(Debug, Deserialize, Describe)]
struct Info {
    filename: String,
}

#[derive(Debug, Deserialize, Describe)]
struct UploadBody {
    info: Info,
    image: UploadedFile,
}

#[derive(LiteRequest)]
struct Upload {
    #[lite("req=body,multipart/form-data")]
    body: UploadBody,
}

#[derive(Serialize, Describe)]
struct Uploaded {
    filename: String,
    size: u64,
    content_type: Option<String>,
}

async fn upload(mut cx: Context<Upload>) -> Result<Uploaded, HttpError> {
    let request = cx.requests()?;
    Ok(Uploaded {
        filename: request.body.info.filename,
        size: request.body.image.data.len() as u64,
        content_type: request.body.image.content_type,
    })
}

#[tokio::test]
async fn multipart_upload() {
    let mut app = App::new();
    app.post("/upload", upload);
    let client = TestClient::new(app).unwrap();

    let form = MultipartForm::new().text("filename", "cat.png").file(
        "image",
        "cat.png",
        "image/png",
        Bytes::from_static(b"\x89PNG\r\n"),
    );
    let response = client.post("/upload").multipart(form).send().await;
    response.assert_status(StatusCode::CREATED);
    let body: serde_json::Value = response.json().unwrap();
    assert_eq!(body["filename"], "cat.png");
    assert_eq!(body["size"], 6);
    assert_eq!(body["content_type"], "image/png");
}

#[derive(Debug, Deserialize, Describe, Validate)]
struct NewPet {
    #[validate(length(min = 1, message = "name must not be empty"))]
    name: String,
}

#[derive(LiteRequest, Validate)]
#[lite(validate)]
struct CreatePet {
    #[lite("req=body,application/json")]
    #[validate(nested)]
    body: NewPet,
}

async fn create_pet(mut cx: Context<CreatePet>) -> Result<String, HttpError> {
    Ok(cx.requests()?.body.name)
}

#[tokio::test]
async fn validator_violations() {
    let mut app = App::new().validator(DefaultValidator);
    app.post("/pets", create_pet);
    let client = TestClient::new(app).unwrap();

    let response = client
        .post("/pets")
        .json(&serde_json::json!({"name": ""}))
        .send()
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let err: HttpError = response.json().unwrap();
    assert_eq!(err.context.as_deref(), Some(lite::core::CONSTRAINT_VIOLATION_CONTEXT));
    assert_eq!(err.violations.len(), 1);
    assert_eq!(err.violations[0].message, "name must not be empty");

    let response = client
        .post("/pets")
        .json(&serde_json::json!({"name": "Rex"}))
        .send()
        .await;
    response.assert_status(StatusCode::CREATED);
    assert_eq!(response.json::<String>().unwrap(), "Rex");
}

#[derive(LiteRequest)]
struct Search {
    #[lite("query=q")]
    q: String,
    #[lite("query=limit")]
    limit: u8,
    #[lite("query=tag")]
    tags: Vec<String>,
    #[lite("header=X-Verbose")]
    verbose: bool,
    #[lite("header=Authorization,isauth,scheme=bearer")]
    token: Option<String>,
    #[lite("cookie=session")]
    session: Option<String>,
}

#[derive(Serialize, Describe)]
struct SearchEcho {
    q: String,
    limit: u8,
    tags: Vec<String>,
    verbose: bool,
    token: Option<String>,
    session: Option<String>,
}

async fn search(mut cx: Context<Search>) -> Result<SearchEcho, HttpError> {
    let s = cx.requests()?;
    Ok(SearchEcho {
        q: s.q,
        limit: s.limit,
        tags: s.tags,
        verbose: s.verbose,
        token: s.token,
        session: s.session,
    })
}

#[tokio::test]
async fn parameters_from_every_location() {
    let mut app = App::new();
    app.get("/search", search);
    let client = TestClient::new(app).unwrap();

    let response = client
        .get("/search?q=cats&limit=5&tag=a&tag=b")
        .header("X-Verbose", "T")
        .bearer_token("abc")
        .cookie("session", "s-1")
        .send()
        .await;
    response.assert_status(StatusCode::OK);
    let body: serde_json::Value = response.json().unwrap();
    assert_eq!(
        body,
        serde_json::json!({
            "q": "cats",
            "limit": 5,
            "tags": ["a", "b"],
            "verbose": true,
            "token": "Bearer abc",
            "session": "s-1",
        })
    );

    // absent values take their zero value
    let response = client.get("/search").send().await;
    let body: serde_json::Value = response.json().unwrap();
    assert_eq!(body["q"], "");
    assert_eq!(body["limit"], 0);
    assert_eq!(body["tags"], serde_json::json!([]));
    assert_eq!(body["verbose"], false);
    assert!(body["token"].is_null());

    let response = client.get("/search?limit=256").send().await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

async fn teapot(_cx: ContextNoRequest) -> Result<String, HttpError> {
    Err(HttpError::new(StatusCode::IM_A_TEAPOT, "short and stout"))
}

async fn broken(_cx: ContextNoRequest) -> Result<String, anyhow::Error> {
    Err(anyhow::anyhow!("database is down"))
}

async fn accepted(mut cx: ContextNoRequest) -> Result<String, HttpError> {
    cx.set_status(StatusCode::ACCEPTED);
    cx.insert_header(
        http::header::LOCATION,
        http::HeaderValue::from_static("/jobs/1"),
    );
    Ok(cx.request_id().to_string())
}

#[tokio::test]
async fn handler_errors_and_overrides() {
    let mut app = App::new();
    app.get("/teapot", teapot);
    app.get("/broken", broken);
    app.post("/jobs", accepted);
    let client = TestClient::new(app).unwrap();

    let response = client.get("/teapot").send().await;
    response.assert_status(StatusCode::IM_A_TEAPOT);
    let err: HttpError = response.json().unwrap();
    assert_eq!(err.description, "short and stout");

    let response = client.get("/broken").send().await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    response.assert_body_contains("database is down");

    let response = client.post("/jobs").send().await;
    response
        .assert_status(StatusCode::ACCEPTED)
        .assert_header("location", "/jobs/1");
    let id: String = response.json().unwrap();
    assert_eq!(Some(id.as_str()), response.header_str("x-request-id"));
}

#[tokio::test]
async fn custom_media_type_alias() {
    let mut app = App::new();
    app.media_types_mut()
        .register("application/vnd.foo+json", MediaFamily::Json);
    app.post("/foo", create_foo);
    let client = TestClient::new(app).unwrap();

    let response = client
        .post("/foo")
        .content_type("application/vnd.foo+json")
        .body(r#"{"id":1}"#)
        .send()
        .await;
    response.assert_status(StatusCode::CREATED);
}

#[tokio::test]
async fn route_content_type_override_applies_at_runtime() {
    let mut app = App::new();
    app.get("/foo/:id", get_foo)
        .set_response_content_type("application/xml");
    let client = TestClient::new(app).unwrap();

    let response = client.get("/foo/1").send().await;
    response.assert_content_type("application/xml");
    assert_eq!(
        response.text().unwrap(),
        "<response><id>1</id><message>Hello World</message></response>"
    );
}
