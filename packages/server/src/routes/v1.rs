use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::handlers;
use crate::state::AppState;

pub fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/user", user_routes())
        .nest("/recipes", recipe_routes())
        .nest("/tags", tag_routes())
        .nest("/ingredients", ingredient_routes())
}

fn user_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::user::register))
        .routes(routes!(handlers::user::token))
        .routes(routes!(handlers::user::me, handlers::user::update_me))
}

fn recipe_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::recipe::list_recipes,
            handlers::recipe::create_recipe
        ))
        .routes(routes!(
            handlers::recipe::get_recipe,
            handlers::recipe::update_recipe,
            handlers::recipe::replace_recipe,
            handlers::recipe::delete_recipe
        ))
}

fn tag_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::tag::list_tags))
        .routes(routes!(
            handlers::tag::update_tag,
            handlers::tag::replace_tag,
            handlers::tag::delete_tag
        ))
}

fn ingredient_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::ingredient::list_ingredients))
        .routes(routes!(
            handlers::ingredient::update_ingredient,
            handlers::ingredient::replace_ingredient,
            handlers::ingredient::delete_ingredient
        ))
}
