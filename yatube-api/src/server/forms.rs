//! Submitted forms and their validation.

use axum::{
    body::Bytes,
    extract::multipart::{Multipart, MultipartError},
};
use serde::Deserialize;
use std::collections::BTreeMap;
use yatube_common::model::{
    Id,
    group::{Group, GroupMarker},
    post::{POST_THEME_MAX_LEN, Post, PostContent},
    user::{USER_NAME_MAX_LEN, UserHandle},
};

/// Key for errors that belong to the form as a whole.
pub const NON_FIELD: &str = "__all__";

pub const MIN_PASSWORD_CHARS: usize = 8;

const REQUIRED: &str = "Обязательное поле.";
const INVALID_CHOICE: &str =
    "Выберите корректный вариант. Вашего варианта нет среди допустимых значений.";
const INVALID_IMAGE: &str = "Загрузите правильное изображение. Файл, который вы загрузили, \
    поврежден или не является изображением.";

/// Validation messages keyed by field name.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct FieldErrors(BTreeMap<&'static str, Vec<String>>);

impl FieldErrors {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_default().push(message.into());
    }

    #[must_use]
    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    #[must_use]
    pub fn has(&self, field: &str) -> bool {
        !self.get(field).is_empty()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

fn max_length_message(max: usize) -> String {
    format!("Убедитесь, что это значение содержит не более {max} символов.")
}

/// An uploaded file with a non-empty body.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Bytes,
}

/// The raw post form, as submitted or as pre-filled from a post.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct PostForm {
    pub text: String,
    pub theme: String,
    /// Id of the chosen group; empty for none.
    pub group: String,
    pub image: Option<Upload>,
    pub clear_image: bool,
}

/// A post form that passed validation.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct ValidPostForm {
    pub content: PostContent,
    pub group: Option<Id<GroupMarker>>,
    pub image: Option<Upload>,
    pub clear_image: bool,
}

impl PostForm {
    #[must_use]
    pub fn from_post(post: &Post) -> Self {
        Self {
            text: post.content.text.clone(),
            theme: post.content.theme.clone(),
            group: post
                .group
                .as_ref()
                .map(|group| group.id.to_string())
                .unwrap_or_default(),
            image: None,
            clear_image: false,
        }
    }

    /// Reads `text`, `theme`, `group`, `image` and `image-clear`. Unknown
    /// fields are skipped.
    pub async fn from_multipart(multipart: &mut Multipart) -> Result<Self, MultipartError> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_owned) else {
                continue;
            };

            match name.as_str() {
                "text" => form.text = field.text().await?,
                "theme" => form.theme = field.text().await?,
                "group" => form.group = field.text().await?,
                "image-clear" => {
                    let value = field.text().await?;
                    form.clear_image = !value.is_empty() && value != "off";
                }
                "image" => {
                    let file_name = field.file_name().unwrap_or_default().to_owned();
                    let bytes = field.bytes().await?;
                    if !bytes.is_empty() {
                        form.image = Some(Upload { file_name, bytes });
                    }
                }
                _ => {}
            }
        }

        Ok(form)
    }

    /// `image_ok` reports whether an upload looks like an image; it is only
    /// consulted when a file was sent.
    pub fn validate(
        self,
        groups: &[Group],
        image_ok: impl FnOnce(&[u8]) -> bool,
    ) -> Result<ValidPostForm, FieldErrors> {
        let mut errors = FieldErrors::default();

        let text = self.text.trim();
        if text.is_empty() {
            errors.add("text", REQUIRED);
        }

        let theme = self.theme.trim();
        if theme.chars().count() > POST_THEME_MAX_LEN {
            errors.add("theme", max_length_message(POST_THEME_MAX_LEN));
        }

        let group_value = self.group.trim();
        let group = if group_value.is_empty() {
            None
        } else {
            let found = group_value
                .parse::<u64>()
                .ok()
                .and_then(|id| groups.iter().find(|group| u64::from(group.id) == id));
            if found.is_none() {
                errors.add("group", INVALID_CHOICE);
            }
            found.map(|group| group.id)
        };

        if let Some(upload) = &self.image
            && !image_ok(&upload.bytes)
        {
            errors.add("image", INVALID_IMAGE);
        }

        let valid = ValidPostForm {
            content: PostContent {
                text: text.to_owned(),
                theme: theme.to_owned(),
            },
            group,
            image: self.image,
            clear_image: self.clear_image,
        };
        errors.into_result(valid)
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize)]
#[serde(default)]
pub struct CommentForm {
    pub text: String,
}

impl CommentForm {
    /// The trimmed text, if there is any.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        Some(self.text.trim()).filter(|text| !text.is_empty())
    }
}

#[derive(Clone, Eq, PartialEq, Default, Hash, Deserialize)]
#[serde(default)]
pub struct SignupForm {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password1: String,
    pub password2: String,
}

impl std::fmt::Debug for SignupForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignupForm")
            .field("username", &self.username)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct ValidSignupForm {
    pub handle: UserHandle,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

impl SignupForm {
    pub fn validate(&self) -> Result<ValidSignupForm, FieldErrors> {
        let mut errors = FieldErrors::default();

        let username = self.username.trim();
        let handle = if username.is_empty() {
            errors.add("username", REQUIRED);
            None
        } else {
            match UserHandle::new(username.to_owned()) {
                Ok(handle) => Some(handle),
                Err(_) => {
                    errors.add(
                        "username",
                        "Введите правильное имя пользователя. Оно может содержать только буквы, \
                         цифры и знаки @/./+/-/_.",
                    );
                    None
                }
            }
        };

        let first_name = self.first_name.trim();
        if first_name.chars().count() > USER_NAME_MAX_LEN {
            errors.add("first_name", max_length_message(USER_NAME_MAX_LEN));
        }
        let last_name = self.last_name.trim();
        if last_name.chars().count() > USER_NAME_MAX_LEN {
            errors.add("last_name", max_length_message(USER_NAME_MAX_LEN));
        }

        let email = self.email.trim();
        if !email.is_empty() && !looks_like_email(email) {
            errors.add("email", "Введите правильный адрес электронной почты.");
        }

        if self.password1.is_empty() {
            errors.add("password1", REQUIRED);
        }
        if self.password2.is_empty() {
            errors.add("password2", REQUIRED);
        } else if self.password1 != self.password2 {
            errors.add("password2", "Введенные пароли не совпадают.");
        } else {
            if self.password1.chars().count() < MIN_PASSWORD_CHARS {
                errors.add(
                    "password2",
                    format!(
                        "Введённый пароль слишком короткий. Он должен содержать как минимум \
                         {MIN_PASSWORD_CHARS} символов."
                    ),
                );
            }
            if self.password1.chars().all(|c| c.is_ascii_digit()) {
                errors.add("password2", "Введённый пароль состоит только из цифр.");
            }
        }

        match handle {
            Some(handle) if errors.is_empty() => Ok(ValidSignupForm {
                handle,
                first_name: first_name.to_owned(),
                last_name: last_name.to_owned(),
                email: email.to_owned(),
                password: self.password1.clone(),
            }),
            _ => Err(errors),
        }
    }
}

fn looks_like_email(email: &str) -> bool {
    email.split_once('@').is_some_and(|(local, domain)| {
        !local.is_empty()
            && domain.contains('.')
            && !domain.starts_with('.')
            && !domain.ends_with('.')
            && !email.chars().any(char::is_whitespace)
    })
}

#[derive(Clone, Eq, PartialEq, Default, Hash, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    pub next: String,
}

impl std::fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginForm")
            .field("username", &self.username)
            .field("next", &self.next)
            .finish_non_exhaustive()
    }
}

/// Redirect targets must stay on this site.
#[must_use]
pub fn safe_redirect_target(next: &str) -> Option<&str> {
    let is_local = next.starts_with('/') && !next.starts_with("//") && !next.contains('\\');
    is_local.then_some(next)
}

#[cfg(test)]
mod tests {
    use crate::server::forms::{
        CommentForm, PostForm, SignupForm, Upload, safe_redirect_target,
    };
    use axum::body::Bytes;
    use yatube_common::model::{
        Id,
        group::{Group, GroupSlug},
    };

    fn group() -> Group {
        Group {
            id: Id::from(42_u64),
            title: "Test group".to_owned(),
            slug: GroupSlug::new("test-slug".to_owned()).unwrap(),
            description: String::new(),
        }
    }

    fn post_form(text: &str) -> PostForm {
        PostForm {
            text: text.to_owned(),
            ..PostForm::default()
        }
    }

    #[test]
    fn text_is_required_and_trimmed() {
        let errors = post_form("   ").validate(&[], |_| true).unwrap_err();
        assert!(errors.has("text"));

        let valid = post_form("  Текст  ").validate(&[], |_| true).unwrap();
        assert_eq!(valid.content.text, "Текст");
        assert_eq!(valid.group, None);
    }

    #[test]
    fn theme_is_limited_to_fifty_chars() {
        let mut form = post_form("Text");
        form.theme = "я".repeat(50);
        assert!(form.clone().validate(&[], |_| true).is_ok());

        form.theme.push('я');
        let errors = form.validate(&[], |_| true).unwrap_err();
        assert!(errors.has("theme"));
        assert!(!errors.has("text"));
    }

    #[test]
    fn group_must_exist() {
        let mut form = post_form("Text");
        form.group = "42".to_owned();
        assert_eq!(
            form.clone().validate(&[group()], |_| true).unwrap().group,
            Some(Id::from(42_u64))
        );

        form.group = "43".to_owned();
        assert!(form.clone().validate(&[group()], |_| true).unwrap_err().has("group"));

        form.group = "not-a-number".to_owned();
        assert!(form.validate(&[group()], |_| true).unwrap_err().has("group"));
    }

    #[test]
    fn uploads_must_be_images() {
        let mut form = post_form("Text");
        form.image = Some(Upload {
            file_name: "notes.txt".to_owned(),
            bytes: Bytes::from_static(b"hello"),
        });

        let errors = form.clone().validate(&[], |_| false).unwrap_err();
        assert!(errors.has("image"));
        assert!(form.validate(&[], |_| true).unwrap().image.is_some());
    }

    #[test]
    fn comment_text_is_trimmed() {
        let blank = CommentForm {
            text: " \n ".to_owned(),
        };
        assert_eq!(blank.text(), None);

        let comment = CommentForm {
            text: " Хороший пост ".to_owned(),
        };
        assert_eq!(comment.text(), Some("Хороший пост"));
    }

    fn signup(password1: &str, password2: &str) -> SignupForm {
        SignupForm {
            username: "leo".to_owned(),
            email: "leo@example.com".to_owned(),
            password1: password1.to_owned(),
            password2: password2.to_owned(),
            ..SignupForm::default()
        }
    }

    #[test]
    fn signup_password_rules() {
        assert!(signup("correct horse", "correct horse").validate().is_ok());
        assert!(signup("short", "short").validate().unwrap_err().has("password2"));
        assert!(signup("1234567890", "1234567890").validate().unwrap_err().has("password2"));
        assert!(signup("correct horse", "other horse").validate().unwrap_err().has("password2"));
        assert!(signup("", "").validate().unwrap_err().has("password1"));
    }

    #[test]
    fn signup_username_and_email() {
        let mut form = signup("correct horse", "correct horse");
        form.username = "not valid".to_owned();
        form.email = "nope".to_owned();

        let errors = form.validate().unwrap_err();
        assert!(errors.has("username"));
        assert!(errors.has("email"));
    }

    #[test]
    fn redirects_stay_local() {
        assert_eq!(safe_redirect_target("/create/"), Some("/create/"));
        assert_eq!(safe_redirect_target("//evil.example"), None);
        assert_eq!(safe_redirect_target("https://evil.example"), None);
        assert_eq!(safe_redirect_target(""), None);
    }
}
