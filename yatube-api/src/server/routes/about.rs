use crate::server::{
    Result, ServerRouter,
    auth::CurrentUser,
    views::{AboutAuthorTemplate, AboutTechTemplate, Layout, render},
};
use axum::response::Html;
use axum_extra::routing::{RouterExt, TypedPath};

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_get(author)
        .typed_get(tech)
}

#[derive(TypedPath)]
#[typed_path("/about/author/")]
pub struct AboutAuthorPath;

#[derive(TypedPath)]
#[typed_path("/about/tech/")]
pub struct AboutTechPath;

async fn author(_: AboutAuthorPath, CurrentUser(user): CurrentUser) -> Result<Html<String>> {
    render(&AboutAuthorTemplate {
        layout: Layout::new("Об авторе", user.as_ref()),
    })
}

async fn tech(_: AboutTechPath, CurrentUser(user): CurrentUser) -> Result<Html<String>> {
    render(&AboutTechTemplate {
        layout: Layout::new("Технологии", user.as_ref()),
    })
}
