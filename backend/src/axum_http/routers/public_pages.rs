use std::sync::Arc;

use axum::{Router, extract::State, response::IntoResponse, routing::get};
use crates::{
    domain::repositories::{
        image_storage::ImageStorage, plans::PlanRepository, posts::PostRepository,
    },
    infra::{
        db::{
            postgres::postgres_connection::PgPoolSquad,
            repositories::{plans::PlanPostgres, posts::PostPostgres},
        },
        storages::local_images::LocalImageStorage,
    },
};
use tera::Context;
use tracing::error;

use crate::{
    axum_http::views::PageContext,
    config::config_model::DotEnvyConfig,
    usecases::{plans::PlanUseCase, posts::PostUseCase},
};

pub fn routes(db_pool: Arc<PgPoolSquad>, config: Arc<DotEnvyConfig>) -> Router {
    let plan_repository = PlanPostgres::new(Arc::clone(&db_pool));
    let post_repository = PostPostgres::new(Arc::clone(&db_pool));
    let image_storage = LocalImageStorage::new(config.uploads.dir.clone());

    router(
        Arc::new(PlanUseCase::new(Arc::new(plan_repository))),
        Arc::new(PostUseCase::new(
            Arc::new(post_repository),
            Arc::new(image_storage),
        )),
    )
}

pub fn router<P, R, S>(
    plan_usecase: Arc<PlanUseCase<P>>,
    post_usecase: Arc<PostUseCase<R, S>>,
) -> Router
where
    P: PlanRepository + Send + Sync + 'static,
    R: PostRepository + Send + Sync + 'static,
    S: ImageStorage + Send + Sync + 'static,
{
    Router::new()
        .route("/", get(home))
        .route("/speed-test", get(speed_test))
        .route("/about", get(about))
        .merge(
            Router::new()
                .route("/plans", get(plans_page::<P>))
                .with_state(plan_usecase),
        )
        .merge(
            Router::new()
                .route("/blog", get(blog_page::<R, S>))
                .with_state(post_usecase),
        )
}

pub async fn home(page: PageContext) -> impl IntoResponse {
    page.render("index.html", Context::new())
}

pub async fn speed_test(page: PageContext) -> impl IntoResponse {
    page.render("speed_test.html", Context::new())
}

pub async fn about(page: PageContext) -> impl IntoResponse {
    page.render("about.html", Context::new())
}

pub async fn plans_page<P>(
    State(usecase): State<Arc<PlanUseCase<P>>>,
    page: PageContext,
) -> impl IntoResponse
where
    P: PlanRepository + Send + Sync + 'static,
{
    let plans = usecase.list_active().await.unwrap_or_else(|err| {
        error!(error = %err, "public_pages: plans unavailable, rendering empty list");
        Vec::new()
    });

    let mut context = Context::new();
    context.insert("plans", &plans);
    page.render("plans.html", context)
}

pub async fn blog_page<R, S>(
    State(usecase): State<Arc<PostUseCase<R, S>>>,
    page: PageContext,
) -> impl IntoResponse
where
    R: PostRepository + Send + Sync + 'static,
    S: ImageStorage + Send + Sync + 'static,
{
    let posts = usecase.list_published().await.unwrap_or_else(|err| {
        error!(error = %err, "public_pages: posts unavailable, rendering empty list");
        Vec::new()
    });

    let mut context = Context::new();
    context.insert("posts", &posts);
    page.render("blog.html", context)
}
