use bytes::Bytes;
use core::convert::Infallible;
use http_body_util::{BodyExt, Full};
use hyper::{Request, Response};
use sigproxy_http_client::{Body, Client};
use std::time::Duration;
use tower::service_fn;

#[tokio::test]
async fn basic_request() {
    let client = service_fn(|req: Request<Body>| async move {
        assert_eq!(req.uri().path_and_query().unwrap(), "/path?query=1");
        let body = req.into_body().collect().await.unwrap().to_bytes();
        Ok::<_, Infallible>(Response::new(Full::new(body)))
    });
    let client = Client::builder().service(client);

    let req = Request::builder()
        .uri("https://example.com/path?query=1")
        .body(Body::from("echo"))
        .unwrap();
    let response = client.execute(req).await.unwrap();

    assert!(response.status().is_success());
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(body, "echo");
}

#[tokio::test]
async fn body_limit() {
    let client = service_fn(|_req: Request<Body>| async move {
        Ok::<_, Infallible>(Response::new(Full::new(Bytes::from(vec![0; 64]))))
    });
    let client = Client::builder()
        .content_length_limit(Some(16))
        .service(client);

    let req = Request::get("https://example.com/").body(Body::default()).unwrap();
    let response = client.execute(req).await.unwrap();

    assert!(response.into_body().collect().await.is_err());
}

#[tokio::test]
async fn timeout() {
    let client = service_fn(|_req: Request<Body>| async move {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok::<_, Infallible>(Response::new(Full::new(Bytes::new())))
    });
    let client = Client::builder()
        .timeout(Some(Duration::from_millis(10)))
        .service(client);

    let req = Request::get("https://example.com/").body(Body::default()).unwrap();
    let error = client.execute(req).await.unwrap_err();

    assert!(error.is_timeout());
}
