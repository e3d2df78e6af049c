use serde_json::json;

use crate::common::{TestApp, routes, sample_recipe};

#[tokio::test]
async fn listing_requires_authentication() {
    let app = TestApp::spawn().await;

    let res = app.get_without_token(routes::INGREDIENTS).await;

    assert_eq!(res.status, 401);
}

#[tokio::test]
async fn lists_only_own_ingredients_by_name_descending() {
    let app = TestApp::spawn().await;
    let alice = app
        .create_authenticated_user("alice@example.com", "testpass123")
        .await;
    let bob = app
        .create_authenticated_user("bob@example.com", "testpass123")
        .await;

    let mut mine = sample_recipe("Mine");
    mine["ingredients"] = json!([{"name": "Flour"}, {"name": "Salt"}]);
    app.create_recipe(&alice, mine).await;
    let mut theirs = sample_recipe("Theirs");
    theirs["ingredients"] = json!([{"name": "Mango"}]);
    app.create_recipe(&bob, theirs).await;

    let res = app.get_with_token(routes::INGREDIENTS, &alice).await;

    assert_eq!(res.status, 200);
    assert_eq!(res.names(None), vec!["Salt", "Flour"]);
}

#[tokio::test]
async fn assigned_only_returns_each_linked_ingredient_once() {
    let app = TestApp::spawn().await;
    let token = app
        .create_authenticated_user("test@example.com", "testpass123")
        .await;

    let mut eggs = sample_recipe("Eggs benedict");
    eggs["ingredients"] = json!([{"name": "Eggs"}, {"name": "Saffron"}]);
    let eggs = app.create_recipe(&token, eggs).await;
    let mut pancakes = sample_recipe("Pancakes");
    pancakes["ingredients"] = json!([{"name": "Eggs"}]);
    app.create_recipe(&token, pancakes).await;

    // Detach "Saffron" by changing the ingredients of the first recipe.
    let res = app
        .patch_with_token(
            &routes::recipe(eggs.id()),
            &json!({"ingredients": [{"name": "Eggs"}]}),
            &token,
        )
        .await;
    assert_eq!(res.status, 200, "{}", res.text);

    let all = app.get_with_token(routes::INGREDIENTS, &token).await;
    assert_eq!(all.names(None), vec!["Saffron", "Eggs"]);

    let path = format!("{}?assigned_only=1", routes::INGREDIENTS);
    let assigned = app.get_with_token(&path, &token).await;
    assert_eq!(assigned.names(None), vec!["Eggs"]);
}

#[tokio::test]
async fn rename_updates_the_ingredient_everywhere() {
    let app = TestApp::spawn().await;
    let token = app
        .create_authenticated_user("test@example.com", "testpass123")
        .await;
    let mut payload = sample_recipe("Curry");
    payload["ingredients"] = json!([{"name": "Coriander"}]);
    let recipe = app.create_recipe(&token, payload).await;
    let ingredient_id = recipe.body["ingredients"][0]["id"].as_i64().unwrap() as i32;

    let res = app
        .patch_with_token(&routes::ingredient(ingredient_id), &json!({"name": "Flour"}), &token)
        .await;

    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["name"], "Flour");

    let detail = app.get_with_token(&routes::recipe(recipe.id()), &token).await;
    assert_eq!(detail.names(Some("ingredients")), vec!["Flour"]);
}

#[tokio::test]
async fn put_renames_as_well() {
    let app = TestApp::spawn().await;
    let token = app
        .create_authenticated_user("test@example.com", "testpass123")
        .await;
    let mut payload = sample_recipe("Curry");
    payload["ingredients"] = json!([{"name": "Chili"}]);
    let recipe = app.create_recipe(&token, payload).await;
    let ingredient_id = recipe.body["ingredients"][0]["id"].as_i64().unwrap() as i32;

    let res = app
        .put_with_token(&routes::ingredient(ingredient_id), &json!({"name": "Pepper"}), &token)
        .await;

    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["name"], "Pepper");
}

#[tokio::test]
async fn rename_to_an_existing_name_conflicts() {
    let app = TestApp::spawn().await;
    let token = app
        .create_authenticated_user("test@example.com", "testpass123")
        .await;
    let mut payload = sample_recipe("Curry");
    payload["ingredients"] = json!([{"name": "Chili"}, {"name": "Pepper"}]);
    let recipe = app.create_recipe(&token, payload).await;
    let chili = recipe.body["ingredients"]
        .as_array()
        .unwrap()
        .iter()
        .find(|t| t["name"] == "Chili")
        .unwrap()["id"]
        .as_i64()
        .unwrap() as i32;

    let res = app
        .patch_with_token(&routes::ingredient(chili), &json!({"name": "Pepper"}), &token)
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
    payload["ingredients"] = json!([{"name": "Chili"}]);
    let recipe = app.create_recipe(&token, payload).await;
    let ingredient_id = recipe.body["ingredients"][0]["id"].as_i64().unwrap() as i32;

    let res = app
        .patch_with_token(&routes::ingredient(ingredient_id), &json!({"name": "  "}), &token)
        .await;

    assert_eq!(res.status, 400);
    assert_eq!(res.body["field"], "name");
}

#[tokio::test]
async fn other_users_ingredient_cannot_be_renamed_or_deleted() {
    let app = TestApp::spawn().await;
    let alice = app
        .create_authenticated_user("alice@example.com", "testpass123")
        .await;
    let bob = app
        .create_authenticated_user("bob@example.com", "testpass123")
        .await;
    let mut payload = sample_recipe("Bob's");
    payload["ingredients"] = json!([{"name": "Truffle"}]);
    let recipe = app.create_recipe(&bob, payload).await;
    let ingredient_id = recipe.body["ingredients"][0]["id"].as_i64().unwrap() as i32;

    let rename = app
        .patch_with_token(&routes::ingredient(ingredient_id), &json!({"name": "Mine"}), &alice)
        .await;
    assert_eq!(rename.status, 404);

    let delete = app.delete_with_token(&routes::ingredient(ingredient_id), &alice).await;
    assert_eq!(delete.status, 404);

    let ingredients = app.get_with_token(routes::INGREDIENTS, &bob).await;
    assert_eq!(ingredients.names(None), vec!["Truffle"]);
}

#[tokio::test]
async fn delete_detaches_ingredient_from_recipes() {
    let app = TestApp::spawn().await;
    let token = app
        .create_authenticated_user("test@example.com", "testpass123")
        .await;
    let mut payload = sample_recipe("Curry");
    payload["ingredients"] = json!([{"name": "Chili"}, {"name": "Rice"}]);
    let recipe = app.create_recipe(&token, payload).await;
    let chili = recipe.body["ingredients"]
        .as_array()
        .unwrap()
        .iter()
        .find(|t| t["name"] == "Chili")
        .unwrap()["id"]
        .as_i64()
        .unwrap() as i32;

    let res = app.delete_with_token(&routes::ingredient(chili), &token).await;
    assert_eq!(res.status, 204);

    let detail = app.get_with_token(&routes::recipe(recipe.id()), &token).await;
    assert_eq!(detail.names(Some("ingredients")), vec!["Rice"]);
}
