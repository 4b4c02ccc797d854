use crate::{
    config::ServerSettings,
    server::{
        Result, ServerRouter,
        auth::{CurrentUser, removal_cookie, session_cookie, session_token, start_session},
        extract::{Form, Query},
        forms::{FieldErrors, LoginForm, NON_FIELD, SignupForm, safe_redirect_target},
        routes::posts::IndexPath,
        views::{Layout, LoggedOutTemplate, LoginTemplate, SignupTemplate, render},
    },
};
use axum::{
    extract::State,
    http::HeaderMap,
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::{
    extract::CookieJar,
    routing::{RouterExt, TypedPath},
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info};
use yatube_common::model::{
    auth::PasswordHash,
    user::{CreateUser, UserHandle},
};
use yatube_db::client::{DbClient, DbError};

const SIGNUP_TITLE: &str = "Регистрация";
const LOGIN_TITLE: &str = "Войти";
const LOGGED_OUT_TITLE: &str = "Вы вышли из системы";
const HANDLE_TAKEN: &str = "Пользователь с таким именем уже существует.";
const INVALID_LOGIN: &str = "Пожалуйста, введите правильные имя пользователя и пароль. \
    Оба поля могут быть чувствительны к регистру.";

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_get(signup_form)
        .typed_post(signup)
        .typed_get(login_form)
        .typed_post(login)
        .typed_get(logout)
        .typed_post(logout)
}

#[derive(TypedPath)]
#[typed_path("/auth/signup/")]
pub struct SignupPath;

#[derive(TypedPath)]
#[typed_path("/auth/login/")]
pub struct LoginPath;

#[derive(TypedPath)]
#[typed_path("/auth/logout/")]
pub struct LogoutPath;

fn render_signup(form: &SignupForm, errors: FieldErrors) -> Result<Html<String>> {
    render(&SignupTemplate {
        layout: Layout::new(SIGNUP_TITLE, None),
        username: form.username.clone(),
        first_name: form.first_name.clone(),
        last_name: form.last_name.clone(),
        email: form.email.clone(),
        errors,
    })
}

async fn signup_form(_: SignupPath, CurrentUser(user): CurrentUser) -> Result<Response> {
    if user.is_some() {
        return Ok(Redirect::to(&IndexPath.to_string()).into_response());
    }

    Ok(render_signup(&SignupForm::default(), FieldErrors::default())?.into_response())
}

async fn signup(
    _: SignupPath,
    State(db): State<Arc<DbClient>>,
    State(settings): State<Arc<ServerSettings>>,
    jar: CookieJar,
    Form(form): Form<SignupForm>,
) -> Result<Response> {
    let valid = match form.validate() {
        Ok(valid) => valid,
        Err(errors) => {
            debug!(?form, ?errors, "Rejected signup form");
            return Ok(render_signup(&form, errors)?.into_response());
        }
    };

    let password_hash = PasswordHash::generate(&valid.password)?;
    let create_user = CreateUser {
        handle: valid.handle,
        first_name: valid.first_name,
        last_name: valid.last_name,
        email: valid.email,
        password_hash,
    };

    let user_id = match db.create_user(&create_user).await {
        Ok(user_id) => user_id,
        Err(DbError::HandleTaken(handle)) => {
            debug!(%handle, "Signup with taken handle");
            let mut errors = FieldErrors::default();
            errors.add("username", HANDLE_TAKEN);
            return Ok(render_signup(&form, errors)?.into_response());
        }
        Err(err) => return Err(err.into()),
    };
    info!(user = %create_user.handle, "Signed up");

    let token = start_session(&db, &settings, user_id).await?;
    let jar = jar.add(session_cookie(&token, &settings));

    Ok((jar, Redirect::to(&IndexPath.to_string())).into_response())
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize)]
#[serde(default)]
struct LoginQuery {
    next: String,
}

fn render_login(username: &str, next: &str, errors: FieldErrors) -> Result<Html<String>> {
    render(&LoginTemplate {
        layout: Layout::new(LOGIN_TITLE, None),
        username: username.to_owned(),
        next: next.to_owned(),
        errors,
    })
}

async fn login_form(_: LoginPath, Query(query): Query<LoginQuery>) -> Result<Html<String>> {
    render_login("", &query.next, FieldErrors::default())
}

async fn login(
    _: LoginPath,
    State(db): State<Arc<DbClient>>,
    State(settings): State<Arc<ServerSettings>>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let credentials = match UserHandle::new(form.username.trim().to_owned()) {
        Ok(handle) => db.fetch_credentials(&handle).await?,
        Err(_) => None,
    };

    let Some(credentials) =
        credentials.filter(|credentials| credentials.password_hash.verify(&form.password))
    else {
        debug!(username = %form.username, "Failed login");
        let mut errors = FieldErrors::default();
        errors.add(NON_FIELD, INVALID_LOGIN);
        return Ok(render_login(&form.username, &form.next, errors)?.into_response());
    };

    let token = start_session(&db, &settings, credentials.user.id).await?;
    info!(user = %credentials.user.handle, "Logged in");

    let target = safe_redirect_target(&form.next)
        .map_or_else(|| IndexPath.to_string(), str::to_owned);
    let jar = jar.add(session_cookie(&token, &settings));

    Ok((jar, Redirect::to(&target)).into_response())
}

async fn logout(
    _: LogoutPath,
    State(db): State<Arc<DbClient>>,
    headers: HeaderMap,
    jar: CookieJar,
) -> Result<Response> {
    if let Some(token) = session_token(&headers)
        && db.delete_session(token.user_id, &token.hash()).await?
    {
        info!(user = %token.user_id, "Logged out");
    }

    let page = render(&LoggedOutTemplate {
        layout: Layout::new(LOGGED_OUT_TITLE, None),
    })?;
    Ok((jar.remove(removal_cookie()), page).into_response())
}
