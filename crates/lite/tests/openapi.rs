//! Shape of the generated OpenAPI document.

use http::StatusCode;
use lite::docs::Contact;
use lite::prelude::*;
use lite_test::TestClient;
use serde_yaml::Value;

#[derive(LiteRequest)]
struct GetFoo {
    #[lite("path=id")]
    id: u64,
    #[lite("query=verbose")]
    verbose: Option<bool>,
    #[lite("header=Authorization,isauth,scheme=bearer")]
    token: Option<String>,
}

#[derive(Serialize, Describe)]
#[serde(rename = "response")]
struct FooResponse {
    id: u64,
    message: String,
}

async fn get_foo(mut cx: Context<GetFoo>) -> Result<FooResponse, HttpError> {
    let request = cx.requests()?;
    Ok(FooResponse {
        id: request.id,
        message: "Hello World".to_string(),
    })
}

#[derive(Deserialize, Describe)]
struct Info {
    filename: String,
}

#[derive(Deserialize, Describe)]
#[serde(rename = "upload")]
struct UploadBody {
    info: Info,
    image: UploadedFile,
}

#[derive(LiteRequest)]
struct Upload {
    #[lite("req=body,multipart/form-data")]
    body: UploadBody,
}

async fn upload(mut cx: Context<Upload>) -> Result<(), HttpError> {
    cx.requests()?;
    Ok(())
}

fn app() -> App {
    let mut app = App::new().docs(|docs| {
        docs.title("Foo API")
            .version("1.2.0")
            .contact(Contact {
                name: Some("Foo Team".to_string()),
                url: None,
                email: Some("foo@example.com".to_string()),
            })
            .server("https://api.example.com", None)
            .tag("foo", Some("Foo operations".to_string()))
    });
    app.get("/foo/:id", get_foo)
        .summary("Fetch a foo")
        .add_tags(["foo"])
        .add_error_response(StatusCode::FORBIDDEN);
    app.post("/upload", upload).deprecated();
    app
}

fn keys(value: &Value) -> Vec<&str> {
    value
        .as_mapping()
        .map(|m| m.keys().filter_map(Value::as_str).collect())
        .unwrap_or_default()
}

fn document() -> Value {
    serde_yaml::from_str(&app().openapi_yaml().unwrap()).unwrap()
}

#[test]
fn document_metadata() {
    let doc = document();
    assert_eq!(doc["openapi"].as_str(), Some("3.0.3"));
    assert_eq!(doc["info"]["title"].as_str(), Some("Foo API"));
    assert_eq!(doc["info"]["version"].as_str(), Some("1.2.0"));
    assert_eq!(doc["info"]["contact"]["email"].as_str(), Some("foo@example.com"));
    assert_eq!(doc["servers"][0]["url"].as_str(), Some("https://api.example.com"));
    assert_eq!(doc["tags"][0]["name"].as_str(), Some("foo"));
    assert_eq!(keys(&doc["paths"]), vec!["/foo/{id}", "/upload"]);
}

#[test]
fn get_operation() {
    let doc = document();
    let op = &doc["paths"]["/foo/{id}"]["get"];
    assert_eq!(op["operationId"].as_str(), Some("GET/foo/:id"));
    assert_eq!(op["summary"].as_str(), Some("Fetch a foo"));
    assert_eq!(op["tags"][0].as_str(), Some("foo"));

    let refs: Vec<_> = op["parameters"]
        .as_sequence()
        .unwrap()
        .iter()
        .filter_map(|p| p["$ref"].as_str())
        .collect();
    assert_eq!(
        refs,
        vec!["#/components/parameters/id", "#/components/parameters/verbose"]
    );
    assert!(op["security"][0]["Authorization"].is_sequence());

    assert_eq!(
        keys(&op["responses"]),
        vec!["200", "400", "401", "404", "409", "500", "403"]
    );
    assert_eq!(
        op["responses"]["200"]["content"]["application/json"]["schema"]["$ref"].as_str(),
        Some("#/components/schemas/response")
    );
    assert_eq!(
        keys(&op["responses"]["404"]["content"]),
        vec!["application/json", "application/xml", "multipart/form-data"]
    );
    assert_eq!(
        op["responses"]["500"]["content"]["application/json"]["schema"]["$ref"].as_str(),
        Some("#/components/schemas/httpGenericError")
    );
}

#[test]
fn upload_operation() {
    let doc = document();
    let op = &doc["paths"]["/upload"]["post"];
    assert_eq!(op["deprecated"].as_bool(), Some(true));
    assert!(op.get("parameters").is_none());

    let body = &op["requestBody"]["content"]["multipart/form-data"]["schema"];
    assert_eq!(body["$ref"].as_str(), Some("#/components/schemas/upload"));

    // unit responses have no content
    let created = &op["responses"]["201"];
    assert_eq!(created["description"].as_str(), Some("Created"));
    assert!(created.get("content").is_none());
}

#[test]
fn components() {
    let doc = document();
    let components = &doc["components"];

    let mut schemas = keys(&components["schemas"]);
    schemas.sort_unstable();
    assert_eq!(
        schemas,
        vec!["Info", "httpGenericError", "response", "upload", "violation"]
    );
    assert_eq!(keys(&components["parameters"]), vec!["id", "verbose"]);

    let id = &components["parameters"]["id"];
    assert_eq!(id["in"].as_str(), Some("path"));
    assert_eq!(id["required"].as_bool(), Some(true));
    assert_eq!(id["schema"]["type"].as_str(), Some("integer"));
    assert_eq!(id["schema"]["format"].as_str(), Some("int64"));
    assert!(components["parameters"]["verbose"].get("required").is_none());

    let upload = &components["schemas"]["upload"];
    assert_eq!(upload["properties"]["info"]["$ref"].as_str(), Some("#/components/schemas/Info"));
    assert_eq!(upload["properties"]["image"]["format"].as_str(), Some("binary"));

    let auth = &components["securitySchemes"]["Authorization"];
    assert_eq!(auth["type"].as_str(), Some("http"));
    assert_eq!(auth["scheme"].as_str(), Some("bearer"));
}

#[derive(Deserialize, Describe)]
#[serde(rename = "attachment")]
struct AttachmentForm {
    info: Info,
    image: UploadedFile,
}

#[derive(LiteRequest)]
struct Attach {
    #[lite("path=id")]
    id: u64,
    #[lite("query=overwrite")]
    overwrite: Option<bool>,
    #[lite("cookie=session")]
    session: String,
    #[lite("req=body,multipart/form-data")]
    body: AttachmentForm,
}

async fn attach(mut cx: Context<Attach>) -> Result<(), HttpError> {
    cx.requests()?;
    Ok(())
}

#[test]
fn mixed_parameter_locations_with_a_multipart_body() {
    let mut app = App::new();
    app.put("/foo/:id/attachment", attach);
    let doc: Value = serde_yaml::from_str(&app.openapi_yaml().unwrap()).unwrap();
    let op = &doc["paths"]["/foo/{id}/attachment"]["put"];

    let refs: Vec<_> = op["parameters"]
        .as_sequence()
        .unwrap()
        .iter()
        .filter_map(|p| p["$ref"].as_str())
        .collect();
    assert_eq!(
        refs,
        vec![
            "#/components/parameters/id",
            "#/components/parameters/overwrite",
            "#/components/parameters/session",
        ]
    );

    let params = &doc["components"]["parameters"];
    assert_eq!(params["id"]["in"].as_str(), Some("path"));
    assert_eq!(params["id"]["required"].as_bool(), Some(true));
    assert_eq!(params["overwrite"]["in"].as_str(), Some("query"));
    assert!(params["overwrite"].get("required").is_none());
    assert_eq!(params["overwrite"]["schema"]["type"].as_str(), Some("boolean"));
    assert_eq!(params["session"]["in"].as_str(), Some("cookie"));
    assert_eq!(params["session"]["required"].as_bool(), Some(true));
    assert_eq!(params["session"]["schema"]["type"].as_str(), Some("string"));

    let body = &op["requestBody"];
    assert_eq!(keys(&body["content"]), vec!["multipart/form-data"]);
    assert_eq!(body["required"].as_bool(), Some(true));
    assert_eq!(
        body["content"]["multipart/form-data"]["schema"]["$ref"].as_str(),
        Some("#/components/schemas/attachment")
    );
    assert_eq!(
        doc["components"]["schemas"]["attachment"]["properties"]["image"]["format"].as_str(),
        Some("binary")
    );
}

#[tokio::test]
async fn document_is_served() {
    let client = TestClient::new(app()).unwrap();

    let response = client.get("/swagger/openapi.yaml").send().await;
    response.assert_status(StatusCode::OK);
    let served: Value = response.yaml().unwrap();
    assert_eq!(served, document());

    let response = client.get("/swagger").send().await;
    response
        .assert_status(StatusCode::OK)
        .assert_content_type("text/html")
        .assert_body_contains("/swagger/openapi.yaml");
}

#[test]
fn saved_document_matches_served_one() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("nested/openapi.yaml");
    let app = app().spec_file(file.to_string_lossy());
    app.save_openapi().unwrap();

    let saved: Value = serde_yaml::from_str(&std::fs::read_to_string(&file).unwrap()).unwrap();
    assert_eq!(saved, document());
}
