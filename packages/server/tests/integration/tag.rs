use serde_json::json;

use crate::common::{TestApp, routes, sample_recipe};

#[tokio::test]
async fn listing_requires_authentication() {
    let app = TestApp::spawn().await;

    let res = app.get_without_token(routes::TAGS).await;

    assert_eq!(res.status, 401);
}

#[tokio::test]
async fn lists_only_own_tags_by_name_descending() {
    let app = TestApp::spawn().await;
    let alice = app
        .create_authenticated_user("alice@example.com", "testpass123")
        .await;
    let bob = app
        .create_authenticated_user("bob@example.com", "testpass123")
        .await;

    let mut mine = sample_recipe("Mine");
    mine["tags"] = json!([{"name": "Dessert"}, {"name": "Vegan"}]);
    app.create_recipe(&alice, mine).await;
    let mut theirs = sample_recipe("Theirs");
    theirs["tags"] = json!([{"name": "Fruity"}]);
    app.create_recipe(&bob, theirs).await;

    let res = app.get_with_token(routes::TAGS, &alice).await;

    assert_eq!(res.status, 200);
    assert_eq!(res.names(None), vec!["Vegan", "Dessert"]);
}

#[tokio::test]
async fn assigned_only_returns_each_linked_tag_once() {
    let app = TestApp::spawn().await;
    let token = app
        .create_authenticated_user("test@example.com", "testpass123")
        .await;

    let mut eggs = sample_recipe("Eggs benedict");
    eggs["tags"] = json!([{"name": "Breakfast"}, {"name": "Unused"}]);
    let eggs = app.create_recipe(&token, eggs).await;
    let mut pancakes = sample_recipe("Pancakes");
    pancakes["tags"] = json!([{"name": "Breakfast"}]);
    app.create_recipe(&token, pancakes).await;

    // Detach "Unused" by retagging the first recipe.
    let res = app
        .patch_with_token(
            &routes::recipe(eggs.id()),
            &json!({"tags": [{"name": "Breakfast"}]}),
            &token,
        )
        .await;
    assert_eq!(res.status, 200, "{}", res.text);

    let all = app.get_with_token(routes::TAGS, &token).await;
    assert_eq!(all.names(None), vec!["Unused", "Breakfast"]);

    let path = format!("{}?assigned_only=1", routes::TAGS);
    let assigned = app.get_with_token(&path, &token).await;
    assert_eq!(assigned.names(None), vec!["Breakfast"]);
}

#[tokio::test]
async fn rename_updates_the_tag_everywhere() {
    let app = TestApp::spawn().await;
    let token = app
        .create_authenticated_user("test@example.com", "testpass123")
        .await;
    let mut payload = sample_recipe("Curry");
    payload["tags"] = json!([{"name": "After Dinner"}]);
    let recipe = app.create_recipe(&token, payload).await;
    let tag_id = recipe.body["tags"][0]["id"].as_i64().unwrap() as i32;

    let res = app
        .patch_with_token(&routes::tag(tag_id), &json!({"name": "Dessert"}), &token)
        .await;

    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["name"], "Dessert");

    let detail = app.get_with_token(&routes::recipe(recipe.id()), &token).await;
    assert_eq!(detail.names(Some("tags")), vec!["Dessert"]);
}

#[tokio::test]
async fn put_renames_as_well() {
    let app = TestApp::spawn().await;
    let token = app
        .create_authenticated_user("test@example.com", "testpass123")
        .await;
    let mut payload = sample_recipe("Curry");
    payload["tags"] = json!([{"name": "Spicy"}]);
    let recipe = app.create_recipe(&token, payload).await;
    let tag_id = recipe.body["tags"][0]["id"].as_i64().unwrap() as i32;

    let res = app
        .put_with_token(&routes::tag(tag_id), &json!({"name": "Hot"}), &token)
        .await;

    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["name"], "Hot");
}

#[tokio::test]
async fn rename_to_an_existing_name_conflicts() {
    let app = TestApp::spawn().await;
    let token = app
        .create_authenticated_user("test@example.com", "testpass123")
        .await;
    let mut payload = sample_recipe("Curry");
    payload["tags"] = json!([{"name": "Spicy"}, {"name": "Hot"}]);
    let recipe = app.create_recipe(&token, payload).await;
    let spicy = recipe.body["tags"]
        .as_array()
        .unwrap()
        .iter()
        .find(|t| t["name"] == "Spicy")
        .unwrap()["id"]
        .as_i64()
        .unwrap() as i32;

    let res = app
        .patch_with_token(&routes::tag(spicy), &json!({"name": "Hot"}), &token)
        .await;

    assert_eq!(res.status, 409);
    assert_eq!(res.body["code"], "CONFLICT");
}

#[tokio::test]
async fn blank_name_is_rejected() {
    let app = TestApp::spawn().await;
    let token = app
        .create_authenticated_user("test@example.com", "testpass123")
        .await;
    let mut payload = sample_recipe("Curry");
    payload["tags"] = json!([{"name": "Spicy"}]);
    let recipe = app.create_recipe(&token, payload).await;
    let tag_id = recipe.body["tags"][0]["id"].as_i64().unwrap() as i32;

    let res = app
        .patch_with_token(&routes::tag(tag_id), &json!({"name": "  "}), &token)
        .await;

    assert_eq!(res.status, 400);
    assert_eq!(res.body["field"], "name");
}

#[tokio::test]
async fn other_users_tag_cannot_be_renamed_or_deleted() {
    let app = TestApp::spawn().await;
    let alice = app
        .create_authenticated_user("alice@example.com", "testpass123")
        .await;
    let bob = app
        .create_authenticated_user("bob@example.com", "testpass123")
        .await;
    let mut payload = sample_recipe("Bob's");
    payload["tags"] = json!([{"name": "Private"}]);
    let recipe = app.create_recipe(&bob, payload).await;
    let tag_id = recipe.body["tags"][0]["id"].as_i64().unwrap() as i32;

    let rename = app
        .patch_with_token(&routes::tag(tag_id), &json!({"name": "Mine"}), &alice)
        .await;
    assert_eq!(rename.status, 404);

    let delete = app.delete_with_token(&routes::tag(tag_id), &alice).await;
    assert_eq!(delete.status, 404);

    let tags = app.get_with_token(routes::TAGS, &bob).await;
    assert_eq!(tags.names(None), vec!["Private"]);
}

#[tokio::test]
async fn delete_detaches_tag_from_recipes() {
    let app = TestApp::spawn().await;
    let token = app
        .create_authenticated_user("test@example.com", "testpass123")
        .await;
    let mut payload = sample_recipe("Curry");
    payload["tags"] = json!([{"name": "Spicy"}, {"name": "Dinner"}]);
    let recipe = app.create_recipe(&token, payload).await;
    let spicy = recipe.body["tags"]
        .as_array()
        .unwrap()
        .iter()
        .find(|t| t["name"] == "Spicy")
        .unwrap()["id"]
        .as_i64()
        .unwrap() as i32;

    let res = app.delete_with_token(&routes::tag(spicy), &token).await;
    assert_eq!(res.status, 204);

    let detail = app.get_with_token(&routes::recipe(recipe.id()), &token).await;
    assert_eq!(detail.names(Some("tags")), vec!["Dinner"]);
}
