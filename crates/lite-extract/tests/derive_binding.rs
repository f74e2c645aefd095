//! Integration tests for request types built with the derive macros.

use bytes::Bytes;
use http::{Method, Uri};
use lite_core::{Location, RegistrationError};
use lite_extract::{
    bind_request, describe_request, DefaultValidator, ExtractionContextBuilder, MultipartConfig,
    UploadedFile,
};
use lite_macros::{Describe, LiteRequest};
use serde::Deserialize;
use validator::Validate;

#[derive(Debug, LiteRequest, Describe)]
struct Paging {
    #[lite("query=page")]
    page: Option<u32>,
    #[lite("query=limit")]
    limit: u32,
}

#[derive(Debug, LiteRequest)]
struct ListPets {
    #[lite("path=owner")]
    owner: u64,
    #[lite("query=tag")]
    tags: Vec<String>,
    #[lite("header=Authorization,isauth,scheme=bearer")]
    token: String,
    #[lite("cookie=session")]
    session: Option<String>,
    paging: Paging,
}

#[test]
fn binds_parameters_and_embedded_structs() {
    let desc = describe_request::<ListPets>().unwrap();
    let cx = ExtractionContextBuilder::new()
        .uri(Uri::from_static("/owners/9/pets?tag=cat&tag=dog&limit=10"))
        .path_param("owner", "9")
        .header("authorization", "Bearer abc")
        .header("cookie", "theme=dark; session=s-1")
        .build();

    let req: ListPets = bind_request(&cx, &desc, None).unwrap();
    assert_eq!(req.owner, 9);
    assert_eq!(req.tags, vec!["cat", "dog"]);
    assert_eq!(req.token, "Bearer abc");
    assert_eq!(req.session.as_deref(), Some("s-1"));
    assert_eq!(req.paging.page, None);
    assert_eq!(req.paging.limit, 10);
}

#[test]
fn embedded_fields_are_listed_in_declaration_order() {
    let desc = describe_request::<ListPets>().unwrap();
    let names: Vec<_> = desc
        .leaves()
        .filter_map(|f| f.location.parameter_name().map(str::to_string))
        .collect();
    assert_eq!(names, vec!["owner", "tag", "Authorization", "session", "page", "limit"]);
    assert!(matches!(desc.fields()[4].location, Location::Embedded(_)));
}

#[test]
fn unparsable_path_parameter_reports_its_name() {
    let desc = describe_request::<ListPets>().unwrap();
    let cx = ExtractionContextBuilder::new()
        .uri(Uri::from_static("/owners/x/pets"))
        .path_param("owner", "x")
        .build();
    let err = bind_request::<ListPets>(&cx, &desc, None).unwrap_err();
    assert_eq!(err.status, 400);
    assert!(err.description.contains("path parameter `owner`"));
}

#[derive(Debug, Deserialize, Describe, Validate)]
struct NewPet {
    #[validate(length(min = 1, message = "name must not be empty"))]
    name: String,
    #[validate(range(max = 30))]
    age: u8,
}

#[derive(Debug, LiteRequest, Validate)]
#[lite(validate)]
struct CreatePet {
    #[lite("req=body")]
    #[validate(nested)]
    body: NewPet,
}

fn json(body: &'static str) -> lite_extract::ExtractionContext {
    ExtractionContextBuilder::new()
        .method(Method::POST)
        .uri(Uri::from_static("/pets"))
        .header("content-type", "application/json; charset=utf-8")
        .body(body)
        .build()
}

#[test]
fn json_body_passes_validation() {
    let desc = describe_request::<CreatePet>().unwrap();
    let req: CreatePet =
        bind_request(&json(r#"{"name":"rex","age":3}"#), &desc, Some(&DefaultValidator)).unwrap();
    assert_eq!(req.body.name, "rex");
    assert_eq!(req.body.age, 3);
}

#[test]
fn validation_failures_list_violations() {
    let desc = describe_request::<CreatePet>().unwrap();
    let err = bind_request::<CreatePet>(
        &json(r#"{"name":"","age":40}"#),
        &desc,
        Some(&DefaultValidator),
    )
    .unwrap_err();

    assert_eq!(err.status, 400);
    assert_eq!(
        err.context.as_deref(),
        Some(lite_core::CONSTRAINT_VIOLATION_CONTEXT)
    );
    let paths: Vec<_> = err.violations.iter().map(|v| v.property_path.as_str()).collect();
    assert_eq!(paths, vec!["body.age", "body.name"]);
    assert_eq!(err.violations[1].message, "name must not be empty");
    assert_ne!(err.violations[0].id, err.violations[1].id);
}

#[test]
fn validation_is_skipped_without_a_validator() {
    let desc = describe_request::<CreatePet>().unwrap();
    let req: CreatePet = bind_request(&json(r#"{"name":"","age":40}"#), &desc, None).unwrap();
    assert_eq!(req.body.age, 40);
}

#[test]
fn malformed_bodies_are_request_body_errors() {
    let desc = describe_request::<CreatePet>().unwrap();
    let err = bind_request::<CreatePet>(&json(r#"{"name":"#), &desc, None).unwrap_err();
    assert_eq!(err.status, 400);
    assert_eq!(err.context.as_deref(), Some(lite_core::REQUEST_BODY_ERROR_CONTEXT));
}

#[derive(Debug, Deserialize, Describe)]
struct Info {
    filename: String,
}

#[derive(Debug, Deserialize, Describe)]
struct Upload {
    info: Info,
    image: UploadedFile,
}

#[derive(Debug, LiteRequest)]
struct UploadRequest {
    #[lite("req=body,multipart/form-data")]
    body: Upload,
}

#[tokio::test]
async fn multipart_upload_binds_values_and_files() {
    let payload = "--B\r\n\
        Content-Disposition: form-data; name=\"filename\"\r\n\r\n\
        cat.png\r\n\
        --B\r\n\
        Content-Disposition: form-data; name=\"image\"; filename=\"cat.png\"\r\n\
        Content-Type: image/png\r\n\r\n\
        PNG\r\n\
        --B--\r\n";
    let mut cx = ExtractionContextBuilder::new()
        .method(Method::POST)
        .uri(Uri::from_static("/upload"))
        .header("content-type", "multipart/form-data; boundary=B")
        .body(Bytes::from_static(payload.as_bytes()))
        .build();
    cx.load_multipart(&MultipartConfig::default()).await.unwrap();

    let desc = describe_request::<UploadRequest>().unwrap();
    let req: UploadRequest = bind_request(&cx, &desc, None).unwrap();
    assert_eq!(req.body.info.filename, "cat.png");
    assert_eq!(req.body.image.file_name.as_deref(), Some("cat.png"));
    assert_eq!(req.body.image.content_type.as_deref(), Some("image/png"));
    assert_eq!(req.body.image.data, Bytes::from_static(b"PNG"));
}

#[derive(Debug, LiteRequest)]
struct UntaggedScalar {
    #[lite("path=id")]
    id: u64,
    name: String,
}

#[derive(Debug, LiteRequest)]
struct TwoBodies {
    #[lite("req=body")]
    first: String,
    #[lite("req=body,text/plain")]
    second: String,
}

#[derive(Debug, LiteRequest)]
struct TwoContentTypes {
    #[lite("req=body,application/json,application/xml")]
    body: String,
}

#[derive(Debug, LiteRequest)]
struct BadTag {
    #[lite("matrix=id")]
    id: u64,
}

#[test]
fn registration_errors() {
    assert!(matches!(
        describe_request::<UntaggedScalar>(),
        Err(RegistrationError::Untagged { .. })
    ));
    assert!(matches!(
        describe_request::<TwoBodies>(),
        Err(RegistrationError::MultipleBodies { .. })
    ));
    assert!(matches!(
        describe_request::<TwoContentTypes>(),
        Err(RegistrationError::MultipleContentTypes { count: 2, .. })
    ));
    let err = describe_request::<BadTag>().unwrap_err();
    assert_eq!(err.to_string(), "field `id`: unknown location `matrix`");
}
