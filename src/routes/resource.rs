//! Resource routes built from the resolved model.
//! Each resource gets its own fixed paths; handlers find the resource through an `Extension` layer.

use crate::config::ResolvedResource;
use crate::handlers::resource::{create, delete, list, read, update, update_from_body};
use crate::handlers::toggle::set_toggle;
use crate::state::AppState;
use axum::{
    routing::{get, put},
    Extension, Router,
};
use std::sync::Arc;

/// `{path}`, `{path}/` and `{path}/:id` for every mounted resource, plus `{path}/settings` where the
/// resource has a toggle. Static segments win over `:id`, so `settings` never reaches `read`.
pub fn resource_routes(state: AppState) -> Router {
    let mut router = Router::new();
    for resource in &state.model.resources {
        router = router.merge(one_resource(resource.clone()));
    }
    router.with_state(state)
}

fn one_resource(resource: Arc<ResolvedResource>) -> Router<AppState> {
    let base = resource.path.as_str();
    let collection = || get(list).post(create).put(update_from_body);
    let mut r = Router::new()
        .route(base, collection())
        .route(&format!("{}/", base), collection())
        .route(&format!("{}/:id", base), get(read).put(update).delete(delete));
    if resource.toggle.is_some() {
        r = r.route(&format!("{}/settings", base), put(set_toggle));
    }
    r.layer(Extension(resource))
}
