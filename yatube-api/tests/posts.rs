mod common;

use axum::http::StatusCode;
use common::{MultipartBody, SMALL_GIF, TestApp, body_text, location};
use yatube_common::pagination::PageRequest;
use yatube_db::client::PostFilter;

#[tokio::test]
async fn anonymous_create_redirects_to_login_and_creates_nothing() {
    let app = TestApp::new().await;

    let body = MultipartBody::default().text("text", "Без входа").finish();
    let response = app.post_multipart("/create/", body, None).await;

    assert_eq!(location(&response), "/auth/login/?next=%2Fcreate%2F");
    assert_eq!(app.db().count_posts(PostFilter::All).await.unwrap(), 0);
}

#[tokio::test]
async fn create_form_lists_groups() {
    let app = TestApp::new().await;
    let leo = app.user("leo").await;
    let cookie = app.login(&leo).await;
    app.group("classics", "Классика").await;

    let response = app.get("/create/", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let page = body_text(response).await;
    assert!(page.contains("enctype=\"multipart/form-data\""));
    assert!(page.contains("Классика"));
}

#[tokio::test]
async fn creating_a_post_with_an_image() {
    let app = TestApp::new().await;
    let leo = app.user("leo").await;
    let cookie = app.login(&leo).await;
    let group = app.group("classics", "Классика").await;

    let body = MultipartBody::default()
        .text("text", "Тестовый пост с картинкой")
        .text("group", &group.to_string())
        .file("image", "small.gif", "image/gif", SMALL_GIF)
        .finish();
    let response = app.post_multipart("/create/", body, Some(&cookie)).await;
    assert_eq!(location(&response), "/profile/leo/");

    let page = app
        .db()
        .fetch_posts(PostFilter::Author(leo.id), PageRequest::default())
        .await
        .unwrap();
    let [post] = page.items.as_slice() else {
        panic!("expected one post, got {:?}", page.items);
    };
    assert_eq!(post.content.text, "Тестовый пост с картинкой");
    assert_eq!(post.group.as_ref().map(|group| group.id), Some(group));
    assert_eq!(post.image.as_ref().unwrap().get(), "posts/small.gif");
    assert!(
        app.state
            .media
            .file_path(post.image.as_ref().unwrap())
            .is_file()
    );

    let image = app.get("/media/posts/small.gif", None).await;
    assert_eq!(image.status(), StatusCode::OK);
}

#[tokio::test]
async fn invalid_posts_are_rejected_with_errors() {
    let app = TestApp::new().await;
    let leo = app.user("leo").await;
    let cookie = app.login(&leo).await;

    let body = MultipartBody::default()
        .text("text", "Текст есть")
        .file("image", "notes.gif", "image/gif", b"plain text, not an image")
        .finish();
    let response = app.post_multipart("/create/", body, Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("class=\"error\""));

    let body = MultipartBody::default().text("text", "   ").finish();
    let response = app.post_multipart("/create/", body, Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Обязательное поле."));

    assert_eq!(app.db().count_posts(PostFilter::All).await.unwrap(), 0);
}

#[tokio::test]
async fn authors_can_edit_their_posts() {
    let app = TestApp::new().await;
    let leo = app.user("leo").await;
    let cookie = app.login(&leo).await;
    let post_id = app.post(&leo, None, "Черновик").await;
    let edit_uri = format!("/posts/{post_id}/edit/");

    let form = app.get(&edit_uri, Some(&cookie)).await;
    assert_eq!(form.status(), StatusCode::OK);
    assert!(body_text(form).await.contains("Черновик"));

    let body = MultipartBody::default()
        .text("text", "Чистовик")
        .text("theme", "Итог")
        .finish();
    let response = app.post_multipart(&edit_uri, body, Some(&cookie)).await;
    assert_eq!(location(&response), format!("/posts/{post_id}/"));

    let post = app.db().fetch_post(post_id).await.unwrap().unwrap();
    assert_eq!(post.content.text, "Чистовик");
    assert_eq!(post.content.theme, "Итог");
}

#[tokio::test]
async fn editing_keeps_or_clears_the_image() {
    let app = TestApp::new().await;
    let leo = app.user("leo").await;
    let cookie = app.login(&leo).await;

    let body = MultipartBody::default()
        .text("text", "С картинкой")
        .file("image", "small.gif", "image/gif", SMALL_GIF)
        .finish();
    app.post_multipart("/create/", body, Some(&cookie)).await;
    let page = app
        .db()
        .fetch_posts(PostFilter::All, PageRequest::default())
        .await
        .unwrap();
    let post_id = page.items[0].id;
    let edit_uri = format!("/posts/{post_id}/edit/");

    let body = MultipartBody::default().text("text", "Правка").finish();
    app.post_multipart(&edit_uri, body, Some(&cookie)).await;
    let post = app.db().fetch_post(post_id).await.unwrap().unwrap();
    assert_eq!(post.image.as_ref().unwrap().get(), "posts/small.gif");

    let body = MultipartBody::default()
        .text("text", "Без картинки")
        .text("image-clear", "on")
        .finish();
    app.post_multipart(&edit_uri, body, Some(&cookie)).await;
    let post = app.db().fetch_post(post_id).await.unwrap().unwrap();
    assert_eq!(post.image, None);
}

#[tokio::test]
async fn non_authors_cannot_edit() {
    let app = TestApp::new().await;
    let leo = app.user("leo").await;
    let anna = app.user("anna").await;
    let cookie = app.login(&anna).await;
    let post_id = app.post(&leo, None, "Оригинал").await;
    let edit_uri = format!("/posts/{post_id}/edit/");
    let detail_uri = format!("/posts/{post_id}/");

    let response = app.get(&edit_uri, Some(&cookie)).await;
    assert_eq!(location(&response), detail_uri);

    let body = MultipartBody::default().text("text", "Подделка").finish();
    let response = app.post_multipart(&edit_uri, body, Some(&cookie)).await;
    assert_eq!(location(&response), detail_uri);

    let post = app.db().fetch_post(post_id).await.unwrap().unwrap();
    assert_eq!(post.content.text, "Оригинал");
}

#[tokio::test]
async fn editing_a_missing_post_is_not_found() {
    let app = TestApp::new().await;
    let leo = app.user("leo").await;
    let cookie = app.login(&leo).await;

    let response = app.get("/posts/12345/edit/", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
