use std::sync::Arc;

use axum::{
    Extension, Router,
    extract::{Multipart, Path, State},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use crates::{
    domain::{
        entities::posts::PostEntity,
        repositories::{image_storage::ImageStorage, posts::PostRepository},
        value_objects::{
            posts::{PostFormModel, format_publication_date},
            uploads::{UploadedImage, resolve_post_image_url},
        },
    },
    infra::{
        db::{postgres::postgres_connection::PgPoolSquad, repositories::posts::PostPostgres},
        storages::local_images::LocalImageStorage,
    },
};
use serde::Serialize;
use tera::Context;
use tracing::{error, info, warn};

use crate::{
    auth::{AdminSession, SessionKeys},
    axum_http::{
        flash::{self, FlashMessage},
        views::PageContext,
    },
    config::config_model::DotEnvyConfig,
    usecases::posts::{PostError, PostUseCase, PostWriteOutcome},
};

const IMAGE_FIELD: &str = "image";

/// Values shown in the post form.
#[derive(Debug, Default, Serialize)]
pub struct PostFormView {
    pub id: Option<i64>,
    pub title: String,
    pub content: String,
    pub category: String,
    pub external_url: String,
    pub published_at: String,
    pub image_url: Option<String>,
}

impl From<PostEntity> for PostFormView {
    fn from(value: PostEntity) -> Self {
        Self {
            id: Some(value.id),
            image_url: Some(resolve_post_image_url(&value.image)),
            published_at: format_publication_date(value.published_at),
            title: value.title,
            content: value.content,
            category: value.category,
            external_url: value.external_url,
        }
    }
}

pub fn routes(db_pool: Arc<PgPoolSquad>, config: Arc<DotEnvyConfig>) -> Router {
    let post_repository = PostPostgres::new(Arc::clone(&db_pool));
    let image_storage = LocalImageStorage::new(config.uploads.dir.clone());

    router(Arc::new(PostUseCase::new(
        Arc::new(post_repository),
        Arc::new(image_storage),
    )))
}

pub fn router<R, S>(usecase: Arc<PostUseCase<R, S>>) -> Router
where
    R: PostRepository + Send + Sync + 'static,
    S: ImageStorage + Send + Sync + 'static,
{
    Router::new()
        .route("/blog", get(list_posts::<R, S>))
        .route("/blog/add", get(new_post_form).post(create_post::<R, S>))
        .route(
            "/blog/:post_id/edit",
            get(edit_post_form::<R, S>).post(update_post::<R, S>),
        )
        .route("/blog/:post_id/delete", post(delete_post::<R, S>))
        .with_state(usecase)
}

fn list_path(keys: &SessionKeys) -> String {
    format!("{}/blog", keys.admin_prefix())
}

fn add_path(keys: &SessionKeys) -> String {
    format!("{}/blog/add", keys.admin_prefix())
}

fn edit_path(keys: &SessionKeys, post_id: i64) -> String {
    format!("{}/blog/{post_id}/edit", keys.admin_prefix())
}

/// Collects the post fields and the optional image of a multipart form.
async fn read_post_form(
    mut multipart: Multipart,
) -> Result<(PostFormModel, Option<UploadedImage>), String> {
    let mut form = PostFormModel::default();
    let mut image = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| format!("Could not read the submitted form: {err}"))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if name == IMAGE_FIELD {
            let original_filename = field.file_name().unwrap_or_default().to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|err| format!("Could not read the uploaded image: {err}"))?;
            if !original_filename.is_empty() && !bytes.is_empty() {
                image = Some(UploadedImage {
                    original_filename,
                    bytes: bytes.to_vec(),
                });
            }
            continue;
        }

        let target = match name.as_str() {
            "title" => &mut form.title,
            "content" => &mut form.content,
            "category" => &mut form.category,
            "external_url" => &mut form.external_url,
            "published_at" => &mut form.published_at,
            _ => continue,
        };
        *target = field
            .text()
            .await
            .map_err(|err| format!("Could not read the submitted form: {err}"))?;
    }

    Ok((form, image))
}

fn outcome_flashes(outcome: PostWriteOutcome, success: String) -> Vec<FlashMessage> {
    outcome
        .warnings
        .into_iter()
        .map(FlashMessage::warning)
        .chain(std::iter::once(FlashMessage::success(success)))
        .collect()
}

fn write_error_flash(err: &PostError, action: &str) -> FlashMessage {
    match err {
        PostError::Validation(message) => FlashMessage::error(message.clone()),
        PostError::NotFound => FlashMessage::error("Post not found."),
        PostError::Internal(_) => FlashMessage::error(format!("Could not {action} the post.")),
    }
}

pub async fn list_posts<R, S>(
    State(usecase): State<Arc<PostUseCase<R, S>>>,
    AdminSession(admin): AdminSession,
    page: PageContext,
) -> Response
where
    R: PostRepository + Send + Sync + 'static,
    S: ImageStorage + Send + Sync + 'static,
{
    info!(admin_id = admin.id, "admin_posts: list request received");
    match usecase.list_published().await {
        Ok(posts) => {
            let mut context = Context::new();
            context.insert("posts", &posts);
            page.render("admin/posts.html", context)
        }
        Err(err) => page.error_page(err.status_code()),
    }
}

pub async fn new_post_form(AdminSession(_): AdminSession, page: PageContext) -> Response {
    let form = PostFormView {
        published_at: format_publication_date(Utc::now()),
        ..PostFormView::default()
    };

    let mut context = Context::new();
    context.insert("post", &form);
    page.render("admin/post_form.html", context)
}

pub async fn create_post<R, S>(
    State(usecase): State<Arc<PostUseCase<R, S>>>,
    Extension(keys): Extension<Arc<SessionKeys>>,
    AdminSession(admin): AdminSession,
    jar: CookieJar,
    multipart: Multipart,
) -> Response
where
    R: PostRepository + Send + Sync + 'static,
    S: ImageStorage + Send + Sync + 'static,
{
    let (form, image) = match read_post_form(multipart).await {
        Ok(parsed) => parsed,
        Err(message) => {
            warn!(admin_id = admin.id, reason = %message, "admin_posts: unreadable create form");
            let jar = flash::store(jar, vec![FlashMessage::error(message)]);
            return (jar, Redirect::to(&add_path(&keys))).into_response();
        }
    };

    match usecase.create(form, image).await {
        Ok(outcome) => {
            info!(admin_id = admin.id, post_id = outcome.post_id, "admin_posts: post created");
            let success = format!("Post \"{}\" added successfully!", outcome.title);
            let jar = flash::store(jar, outcome_flashes(outcome, success));
            (jar, Redirect::to(&list_path(&keys))).into_response()
        }
        Err(err) => {
            let jar = flash::store(jar, vec![write_error_flash(&err, "add")]);
            (jar, Redirect::to(&add_path(&keys))).into_response()
        }
    }
}

pub async fn edit_post_form<R, S>(
    State(usecase): State<Arc<PostUseCase<R, S>>>,
    AdminSession(_): AdminSession,
    Path(post_id): Path<i64>,
    page: PageContext,
) -> Response
where
    R: PostRepository + Send + Sync + 'static,
    S: ImageStorage + Send + Sync + 'static,
{
    match usecase.find_by_id(post_id).await {
        Ok(post) => {
            let mut context = Context::new();
            context.insert("post", &PostFormView::from(post));
            page.render("admin/post_form.html", context)
        }
        Err(err) => page.error_page(err.status_code()),
    }
}

pub async fn update_post<R, S>(
    State(usecase): State<Arc<PostUseCase<R, S>>>,
    Extension(keys): Extension<Arc<SessionKeys>>,
    AdminSession(admin): AdminSession,
    Path(post_id): Path<i64>,
    jar: CookieJar,
    multipart: Multipart,
) -> Response
where
    R: PostRepository + Send + Sync + 'static,
    S: ImageStorage + Send + Sync + 'static,
{
    let (form, image) = match read_post_form(multipart).await {
        Ok(parsed) => parsed,
        Err(message) => {
            warn!(admin_id = admin.id, post_id, reason = %message, "admin_posts: unreadable edit form");
            let jar = flash::store(jar, vec![FlashMessage::error(message)]);
            return (jar, Redirect::to(&edit_path(&keys, post_id))).into_response();
        }
    };

    match usecase.update(post_id, form, image).await {
        Ok(outcome) => {
            info!(admin_id = admin.id, post_id, "admin_posts: post updated");
            let jar = flash::store(
                jar,
                outcome_flashes(outcome, "Post updated successfully!".to_string()),
            );
            (jar, Redirect::to(&list_path(&keys))).into_response()
        }
        Err(PostError::NotFound) => {
            let jar = flash::store(jar, vec![FlashMessage::error("Post not found.")]);
            (jar, Redirect::to(&list_path(&keys))).into_response()
        }
        Err(err) => {
            let jar = flash::store(jar, vec![write_error_flash(&err, "update")]);
            (jar, Redirect::to(&edit_path(&keys, post_id))).into_response()
        }
    }
}

pub async fn delete_post<R, S>(
    State(usecase): State<Arc<PostUseCase<R, S>>>,
    Extension(keys): Extension<Arc<SessionKeys>>,
    AdminSession(admin): AdminSession,
    Path(post_id): Path<i64>,
    jar: CookieJar,
) -> Response
where
    R: PostRepository + Send + Sync + 'static,
    S: ImageStorage + Send + Sync + 'static,
{
    let message = match usecase.deactivate(post_id).await {
        Ok(title) => {
            info!(admin_id = admin.id, post_id, "admin_posts: post removed");
            FlashMessage::success(format!("Post \"{title}\" removed successfully!"))
        }
        Err(err) => {
            error!(admin_id = admin.id, post_id, error = %err, "admin_posts: failed to remove post");
            write_error_flash(&err, "remove")
        }
    };

    let jar = flash::store(jar, vec![message]);
    (jar, Redirect::to(&list_path(&keys))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        auth::SESSION_COOKIE,
        axum_http::{
            flash::FLASH_COOKIE,
            views::test_support::{session_keys, with_page_extensions},
        },
    };
    use axum::{
        body::Body,
        http::{Request, StatusCode, header},
    };
    use chrono::TimeZone;
    use crates::domain::{
        repositories::{image_storage::MockImageStorage, posts::MockPostRepository},
        value_objects::admin_auth::AdminIdentity,
    };
    use mockall::predicate::{always, eq};
    use tower::ServiceExt;

    const BOUNDARY: &str = "netfyber-test-boundary";

    fn app(posts: MockPostRepository, storage: MockImageStorage) -> Router {
        with_page_extensions(router(Arc::new(PostUseCase::new(
            Arc::new(posts),
            Arc::new(storage),
        ))))
    }

    fn session_cookie() -> String {
        let token = session_keys()
            .issue_token(
                &AdminIdentity {
                    id: 1,
                    username: "admin".to_string(),
                },
                Utc::now(),
            )
            .unwrap();
        format!("{SESSION_COOKIE}={token}")
    }

    fn multipart_body(fields: &[(&str, &str)], image: Option<(&str, &[u8])>) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        let (filename, bytes) = image.unwrap_or(("", b""));
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn multipart_request(uri: &str, body: Vec<u8>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .header(header::COOKIE, session_cookie())
            .body(Body::from(body))
            .unwrap()
    }

    fn valid_fields() -> Vec<(&'static str, &'static str)> {
        vec![
            ("title", "Nova torre"),
            ("content", "Mais **cobertura** em Palmas"),
            ("category", "Infraestrutura"),
            ("external_url", "https://example.com/torre"),
            ("published_at", "09/03/2025"),
        ]
    }

    fn stored_post(post_id: i64) -> PostEntity {
        let published_at = Utc.with_ymd_and_hms(2025, 3, 9, 0, 0, 0).unwrap();
        PostEntity {
            id: post_id,
            title: "Nova torre".to_string(),
            content: "Mais **cobertura** em Palmas".to_string(),
            summary: "Mais  em Palmas".to_string(),
            category: "Infraestrutura".to_string(),
            image: "1b2c3d.png".to_string(),
            external_url: "https://example.com/torre".to_string(),
            published_at,
            is_active: true,
            created_at: published_at,
            updated_at: published_at,
        }
    }

    #[tokio::test]
    async fn anonymous_admin_request_is_redirected_to_login() {
        let response = app(MockPostRepository::new(), MockImageStorage::new())
            .oneshot(Request::builder().uri("/blog").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/painel/login");
    }

    #[tokio::test]
    async fn create_without_image_uses_default_and_redirects_to_list() {
        let mut posts = MockPostRepository::new();
        posts
            .expect_insert()
            .withf(|post| {
                post.title == "Nova torre"
                    && post.image == "default.jpg"
                    && post.published_at == Utc.with_ymd_and_hms(2025, 3, 9, 0, 0, 0).unwrap()
            })
            .times(1)
            .returning(|_| Box::pin(async { Ok(12) }));
        let mut storage = MockImageStorage::new();
        storage.expect_save().never();

        let response = app(posts, storage)
            .oneshot(multipart_request(
                "/blog/add",
                multipart_body(&valid_fields(), None),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/painel/blog");
    }

    #[tokio::test]
    async fn create_with_image_stores_file_first() {
        let mut storage = MockImageStorage::new();
        storage
            .expect_save()
            .with(eq("torre.png".to_string()), always())
            .times(1)
            .returning(|_, _| Box::pin(async { Some("9f8e7d.png".to_string()) }));
        let mut posts = MockPostRepository::new();
        posts
            .expect_insert()
            .withf(|post| post.image == "9f8e7d.png")
            .returning(|_| Box::pin(async { Ok(13) }));

        let response = app(posts, storage)
            .oneshot(multipart_request(
                "/blog/add",
                multipart_body(&valid_fields(), Some(("torre.png", b"\x89PNG\r\n\x1a\n"))),
            ))
            .await
            .unwrap();

        assert_eq!(response.headers()[header::LOCATION], "/painel/blog");
    }

    #[tokio::test]
    async fn create_with_missing_fields_returns_to_form() {
        let mut posts = MockPostRepository::new();
        posts.expect_insert().never();

        let response = app(posts, MockImageStorage::new())
            .oneshot(multipart_request(
                "/blog/add",
                multipart_body(&[("title", "Sem conteudo")], None),
            ))
            .await
            .unwrap();

        assert_eq!(response.headers()[header::LOCATION], "/painel/blog/add");
        assert!(
            response
                .headers()
                .get_all(header::SET_COOKIE)
                .iter()
                .any(|c| c.to_str().unwrap().starts_with(FLASH_COOKIE))
        );
    }

    #[tokio::test]
    async fn edit_form_of_unknown_post_is_not_found() {
        let mut posts = MockPostRepository::new();
        posts
            .expect_find_by_id()
            .with(eq(99))
            .returning(|_| Box::pin(async { Ok(None) }));

        let response = app(posts, MockImageStorage::new())
            .oneshot(
                Request::builder()
                    .uri("/blog/99/edit")
                    .header(header::COOKIE, session_cookie())
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn edit_form_shows_stored_values() {
        let mut posts = MockPostRepository::new();
        posts
            .expect_find_by_id()
            .returning(|post_id| Box::pin(async move { Ok(Some(stored_post(post_id))) }));

        let response = app(posts, MockImageStorage::new())
            .oneshot(
                Request::builder()
                    .uri("/blog/5/edit")
                    .header(header::COOKIE, session_cookie())
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(body.contains("09&#x2F;03&#x2F;2025"));
        assert!(body.contains("Nova torre"));
    }

    #[tokio::test]
    async fn delete_deactivates_and_returns_to_list() {
        let mut posts = MockPostRepository::new();
        posts
            .expect_find_by_id()
            .returning(|post_id| Box::pin(async move { Ok(Some(stored_post(post_id))) }));
        posts
            .expect_deactivate()
            .with(eq(5))
            .times(1)
            .returning(|_| Box::pin(async { Ok(true) }));
        let mut storage = MockImageStorage::new();
        storage.expect_delete().never();

        let response = app(posts, storage)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/blog/5/delete")
                    .header(header::COOKIE, session_cookie())
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/painel/blog");
    }
}
