use crate::common::{TestApp, routes};

#[tokio::test]
async fn health_check_responds_without_authentication() {
    let app = TestApp::spawn().await;

    let res = app.get_without_token(routes::HEALTH).await;

    assert_eq!(res.status, 200);
    assert_eq!(res.body["status"], "ok");
}

#[tokio::test]
async fn openapi_document_lists_the_recipe_routes() {
    let app = TestApp::spawn().await;

    let res = app.get_without_token("/api-docs/openapi.json").await;

    assert_eq!(res.status, 200);
    assert!(res.body["paths"]["/api/v1/recipes/{id}"].is_object());
    assert!(res.body["paths"]["/api/health-check"].is_object());
}
