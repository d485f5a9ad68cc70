use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::get};
use crates::{
    domain::{
        repositories::{
            image_storage::ImageStorage, plans::PlanRepository, posts::PostRepository,
        },
        value_objects::{plans::PlanDto, posts::PostDto},
    },
    infra::{
        db::{
            postgres::postgres_connection::PgPoolSquad,
            repositories::{plans::PlanPostgres, posts::PostPostgres},
        },
        storages::local_images::LocalImageStorage,
    },
};
use tracing::{error, info};

use crate::{
    axum_http::error_responses::AppError,
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
        .merge(
            Router::new()
                .route("/plans", get(list_plans::<P>))
                .with_state(plan_usecase),
        )
        .merge(
            Router::new()
                .route("/blog/posts", get(list_posts::<R, S>))
                .with_state(post_usecase),
        )
}

pub async fn list_plans<P>(
    State(usecase): State<Arc<PlanUseCase<P>>>,
) -> Result<Json<Vec<PlanDto>>, AppError>
where
    P: PlanRepository + Send + Sync + 'static,
{
    info!("api: plans list request received");
    let plans = usecase.list_active().await?;
    Ok(Json(plans))
}

/// Storage failures answer an empty list rather than an error.
pub async fn list_posts<R, S>(State(usecase): State<Arc<PostUseCase<R, S>>>) -> Json<Vec<PostDto>>
where
    R: PostRepository + Send + Sync + 'static,
    S: ImageStorage + Send + Sync + 'static,
{
    info!("api: blog posts request received");
    match usecase.list_published().await {
        Ok(posts) => Json(posts),
        Err(err) => {
            error!(error = %err, "api: failed to list posts, answering empty list");
            Json(Vec::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use chrono::{TimeZone, Utc};
    use crates::domain::{
        entities::{plans::PlanEntity, posts::PostEntity},
        repositories::{
            image_storage::MockImageStorage, plans::MockPlanRepository,
            posts::MockPostRepository,
        },
    };
    use tower::ServiceExt;

    fn app(plans: MockPlanRepository, posts: MockPostRepository) -> Router {
        router(
            Arc::new(PlanUseCase::new(Arc::new(plans))),
            Arc::new(PostUseCase::new(
                Arc::new(posts),
                Arc::new(MockImageStorage::new()),
            )),
        )
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn plans_endpoint_returns_parsed_features() {
        let mut plans = MockPlanRepository::new();
        plans.expect_list_active().returning(|| {
            Box::pin(async {
                Ok(vec![PlanEntity {
                    id: 4,
                    name: "Fibra 1G".to_string(),
                    price: "199,90".to_string(),
                    speed: "1 Gbps".to_string(),
                    features: "Wi-Fi 6\n\n Roteador incluso ".to_string(),
                    is_recommended: false,
                    display_order: 2,
                    is_active: true,
                    created_at: Utc::now(),
                }])
            })
        });

        let (status, body) = get_json(app(plans, MockPostRepository::new()), "/plans").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["id"], 4);
        assert_eq!(body[0]["speed"], "1 Gbps");
        assert_eq!(
            body[0]["features"],
            serde_json::json!(["Wi-Fi 6", "Roteador incluso"])
        );
        assert_eq!(body[0]["recommended"], false);
    }

    #[tokio::test]
    async fn plans_endpoint_failure_is_generic_500() {
        let mut plans = MockPlanRepository::new();
        plans
            .expect_list_active()
            .returning(|| Box::pin(async { Err(anyhow::anyhow!("relation plans does not exist")) }));

        let (status, body) = get_json(app(plans, MockPostRepository::new()), "/plans").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Internal server error");
    }

    #[tokio::test]
    async fn posts_endpoint_formats_date_and_image() {
        let mut posts = MockPostRepository::new();
        posts.expect_list_active().returning(|| {
            Box::pin(async {
                let published_at = Utc.with_ymd_and_hms(2025, 1, 5, 8, 30, 0).unwrap();
                Ok(vec![PostEntity {
                    id: 8,
                    title: "Manutencao programada".to_string(),
                    content: "## Aviso\nSem impacto".to_string(),
                    summary: "Aviso Sem impacto".to_string(),
                    category: "Avisos".to_string(),
                    image: "0f8e1c2a.png".to_string(),
                    external_url: "https://example.com/aviso".to_string(),
                    published_at,
                    is_active: true,
                    created_at: published_at,
                    updated_at: published_at,
                }])
            })
        });

        let (status, body) = get_json(app(MockPlanRepository::new(), posts), "/blog/posts").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["published_at"], "05/01/2025");
        assert_eq!(body[0]["image_url"], "/static/uploads/blog/0f8e1c2a.png");
        assert!(
            body[0]["content_html"]
                .as_str()
                .unwrap()
                .contains("<h2>Aviso</h2>")
        );
    }

    #[tokio::test]
    async fn posts_endpoint_failure_is_empty_list() {
        let mut posts = MockPostRepository::new();
        posts
            .expect_list_active()
            .returning(|| Box::pin(async { Err(anyhow::anyhow!("connection reset")) }));

        let (status, body) = get_json(app(MockPlanRepository::new(), posts), "/blog/posts").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!([]));
    }
}
