mod common;

use axum::http::StatusCode;
use common::{TestApp, body_text, location};

#[tokio::test]
async fn following_and_unfollowing() {
    let app = TestApp::new().await;
    let leo = app.user("leo").await;
    let anna = app.user("anna").await;
    let cookie = app.login(&anna).await;

    let response = app.get("/profile/leo/follow/", Some(&cookie)).await;
    assert_eq!(location(&response), "/profile/leo/");
    assert!(app.db().is_following(anna.id, leo.id).await.unwrap());

    // Following twice keeps a single row.
    app.get("/profile/leo/follow/", Some(&cookie)).await;
    assert_eq!(app.db().follow_counts(leo.id).await.unwrap().followers, 1);

    let profile = body_text(app.get("/profile/leo/", Some(&cookie)).await).await;
    assert!(profile.contains("Отписаться"));

    let response = app.get("/profile/leo/unfollow/", Some(&cookie)).await;
    assert_eq!(location(&response), "/profile/leo/");
    assert!(!app.db().is_following(anna.id, leo.id).await.unwrap());
}

#[tokio::test]
async fn users_cannot_follow_themselves() {
    let app = TestApp::new().await;
    let leo = app.user("leo").await;
    let cookie = app.login(&leo).await;

    let response = app.get("/profile/leo/follow/", Some(&cookie)).await;
    assert_eq!(location(&response), "/profile/leo/");
    assert!(!app.db().is_following(leo.id, leo.id).await.unwrap());

    let profile = body_text(app.get("/profile/leo/", Some(&cookie)).await).await;
    assert!(!profile.contains("Подписаться"));
}

#[tokio::test]
async fn feed_shows_only_followed_authors() {
    let app = TestApp::new().await;
    let leo = app.user("leo").await;
    let fyodor = app.user("fyodor").await;
    let anna = app.user("anna").await;
    let boris = app.user("boris").await;
    app.post(&leo, None, "Пост Льва").await;
    app.post(&fyodor, None, "Пост Фёдора").await;
    app.db().follow(anna.id, leo.id).await.unwrap();

    let anna_cookie = app.login(&anna).await;
    let feed = body_text(app.get("/follow/", Some(&anna_cookie)).await).await;
    assert!(feed.contains("Пост Льва"));
    assert!(!feed.contains("Пост Фёдора"));

    let boris_cookie = app.login(&boris).await;
    let feed = body_text(app.get("/follow/", Some(&boris_cookie)).await).await;
    assert!(!feed.contains("Пост Льва"));
}

#[tokio::test]
async fn following_an_unknown_user_is_not_found() {
    let app = TestApp::new().await;
    let anna = app.user("anna").await;
    let cookie = app.login(&anna).await;

    let response = app.get("/profile/nobody/follow/", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn commenting_on_posts() {
    let app = TestApp::new().await;
    let leo = app.user("leo").await;
    let anna = app.user("anna").await;
    let cookie = app.login(&anna).await;
    let post_id = app.post(&leo, None, "Обсудим").await;
    let comment_uri = format!("/posts/{post_id}/comment/");

    let response = app
        .post_form(
            &comment_uri,
            "text=%D0%A1%D0%BE%D0%B3%D0%BB%D0%B0%D1%81%D0%BD%D0%B0",
            Some(&cookie),
        )
        .await;
    assert_eq!(location(&response), format!("/posts/{post_id}/"));

    let comments = app.db().fetch_post_comments(post_id).await.unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].text, "Согласна");
    assert_eq!(comments[0].author.id, anna.id);

    let page = body_text(app.get(&format!("/posts/{post_id}/"), None).await).await;
    assert!(page.contains("Согласна"));
}

#[tokio::test]
async fn empty_and_anonymous_comments_are_not_saved() {
    let app = TestApp::new().await;
    let leo = app.user("leo").await;
    let cookie = app.login(&leo).await;
    let post_id = app.post(&leo, None, "Обсудим").await;
    let comment_uri = format!("/posts/{post_id}/comment/");

    let response = app.post_form(&comment_uri, "text=+++", Some(&cookie)).await;
    assert_eq!(location(&response), format!("/posts/{post_id}/"));

    let response = app.post_form(&comment_uri, "text=hello", None).await;
    assert!(location(&response).starts_with("/auth/login/?next="));

    assert!(app.db().fetch_post_comments(post_id).await.unwrap().is_empty());

    let response = app
        .post_form("/posts/12345/comment/", "text=hello", Some(&cookie))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn only_authors_delete_comments() {
    let app = TestApp::new().await;
    let leo = app.user("leo").await;
    let anna = app.user("anna").await;
    let post_id = app.post(&leo, None, "Обсудим").await;

    let anna_cookie = app.login(&anna).await;
    app.post_form(
        &format!("/posts/{post_id}/comment/"),
        "text=mine",
        Some(&anna_cookie),
    )
    .await;
    let comment_id = app.db().fetch_post_comments(post_id).await.unwrap()[0].id;
    let delete_uri = format!("/posts/{post_id}/comment/{comment_id}/delete/");

    let leo_cookie = app.login(&leo).await;
    let response = app.get(&delete_uri, Some(&leo_cookie)).await;
    assert_eq!(location(&response), format!("/posts/{post_id}/"));
    assert_eq!(app.db().fetch_post_comments(post_id).await.unwrap().len(), 1);

    let response = app.get(&delete_uri, Some(&anna_cookie)).await;
    assert_eq!(location(&response), format!("/posts/{post_id}/"));
    assert!(app.db().fetch_post_comments(post_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn deleting_a_comment_under_another_post_is_not_found() {
    let app = TestApp::new().await;
    let anna = app.user("anna").await;
    let post_id = app.post(&anna, None, "Обсудим").await;
    let other_post_id = app.post(&anna, None, "Другой пост").await;

    let cookie = app.login(&anna).await;
    app.post_form(
        &format!("/posts/{post_id}/comment/"),
        "text=mine",
        Some(&cookie),
    )
    .await;
    let comment_id = app.db().fetch_post_comments(post_id).await.unwrap()[0].id;

    let response = app
        .get(
            &format!("/posts/{other_post_id}/comment/{comment_id}/delete/"),
            Some(&cookie),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(app.db().fetch_post_comments(post_id).await.unwrap().len(), 1);
}
