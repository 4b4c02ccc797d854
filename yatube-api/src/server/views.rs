//! View models and askama templates.

use crate::server::{
    ServerError,
    forms::{FieldErrors, PostForm},
    media::MediaStore,
    routes::{
        groups::GroupPath,
        posts::{EditPostPath, PostDetailPath},
        profiles::ProfilePath,
    },
};
use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use time::{format_description::BorrowedFormatItem, macros::format_description};
use yatube_common::{
    model::{comment::Comment, follow::FollowCounts, group::Group, post::Post, user::User},
    pagination::{Page, PageWindow},
};

const DATE_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[day].[month].[year] [hour]:[minute]");

pub fn render<T: Template>(template: &T) -> Result<Html<String>, ServerError> {
    Ok(Html(template.render()?))
}

/// Renders an error page. Falls back to plain text if the template fails.
pub fn render_error_page(status: StatusCode, path: &str) -> Response {
    let layout = Layout::new(status.canonical_reason().unwrap_or("Error"), None);
    let rendered = if status == StatusCode::NOT_FOUND {
        NotFoundTemplate {
            layout,
            path: path.to_owned(),
        }
        .render()
    } else {
        ErrorTemplate {
            layout,
            status: status.as_u16(),
            message: if status.is_client_error() {
                "Запрос не может быть обработан.".to_owned()
            } else {
                "Что-то пошло не так. Попробуйте позже.".to_owned()
            },
        }
        .render()
    };

    match rendered {
        Ok(html) => (status, Html(html)).into_response(),
        Err(_) => (status, status.to_string()).into_response(),
    }
}

/// Page chrome shared by every template.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct Layout {
    pub title: String,
    pub user: Option<LinkView>,
}

impl Layout {
    pub fn new(title: impl Into<String>, user: Option<&User>) -> Self {
        Self {
            title: title.into(),
            user: user.map(|user| LinkView {
                label: user.handle.get().to_owned(),
                url: ProfilePath::for_user(user).to_string(),
            }),
        }
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct LinkView {
    pub label: String,
    pub url: String,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct PostView {
    pub id: String,
    pub url: String,
    pub edit_url: String,
    pub text: String,
    pub theme: String,
    pub excerpt: String,
    pub created: String,
    pub author: LinkView,
    pub author_handle: String,
    pub group: Option<LinkView>,
    pub image_url: Option<String>,
}

impl PostView {
    #[must_use]
    pub fn new(post: &Post) -> Self {
        Self {
            id: post.id.to_string(),
            url: PostDetailPath { post_id: post.id }.to_string(),
            edit_url: EditPostPath { post_id: post.id }.to_string(),
            text: post.content.text.clone(),
            theme: post.content.theme.clone(),
            excerpt: post.excerpt().to_owned(),
            created: format_date(post.id.created_at()),
            author: LinkView {
                label: post.author.display_name(),
                url: ProfilePath::for_user(&post.author).to_string(),
            },
            author_handle: post.author.handle.get().to_owned(),
            group: post.group.as_ref().map(|group| LinkView {
                label: group.title.clone(),
                url: GroupPath {
                    slug: group.slug.clone(),
                }
                .to_string(),
            }),
            image_url: post.image.as_ref().map(MediaStore::url),
        }
    }
}

fn format_date(date: time::UtcDateTime) -> String {
    date.format(DATE_FORMAT).unwrap_or_default()
}

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct PageLinkView {
    pub number: u64,
    pub current: bool,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct PaginationView {
    pub number: u64,
    pub num_pages: u64,
    pub previous: Option<u64>,
    pub next: Option<u64>,
    pub pages: Vec<PageLinkView>,
}

impl From<PageWindow> for PaginationView {
    fn from(window: PageWindow) -> Self {
        Self {
            number: window.number(),
            num_pages: window.num_pages(),
            previous: window.previous_page_number(),
            next: window.next_page_number(),
            pages: (1..=window.num_pages())
                .map(|number| PageLinkView {
                    number,
                    current: number == window.number(),
                })
                .collect(),
        }
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct PostListView {
    pub posts: Vec<PostView>,
    pub pagination: PaginationView,
}

impl From<&Page<Post>> for PostListView {
    fn from(page: &Page<Post>) -> Self {
        Self {
            posts: page.items.iter().map(PostView::new).collect(),
            pagination: page.window.into(),
        }
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct CommentView {
    pub author: LinkView,
    pub text: String,
    pub created: String,
    pub delete_url: Option<String>,
}

impl CommentView {
    /// `delete_url` is only offered to the comment's author.
    #[must_use]
    pub fn new(comment: &Comment, delete_url: Option<String>) -> Self {
        Self {
            author: LinkView {
                label: comment.author.display_name(),
                url: ProfilePath::for_user(&comment.author).to_string(),
            },
            text: comment.text.clone(),
            created: format_date(comment.id.created_at()),
            delete_url,
        }
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct GroupOption {
    pub value: String,
    pub title: String,
    pub selected: bool,
}

#[must_use]
pub fn group_options(groups: &[Group], selected: &str) -> Vec<GroupOption> {
    groups
        .iter()
        .map(|group| {
            let value = group.id.to_string();
            GroupOption {
                selected: value == selected,
                value,
                title: group.title.clone(),
            }
        })
        .collect()
}

#[derive(Template)]
#[template(path = "posts/index.html")]
pub struct IndexTemplate {
    pub layout: Layout,
    pub heading: String,
    pub list: PostListView,
}

#[derive(Template)]
#[template(path = "posts/group_list.html")]
pub struct GroupListTemplate {
    pub layout: Layout,
    pub title: String,
    pub description: String,
    pub list: PostListView,
}

#[derive(Template)]
#[template(path = "posts/profile.html")]
pub struct ProfileTemplate {
    pub layout: Layout,
    pub author_name: String,
    pub author_handle: String,
    pub follow_url: String,
    pub unfollow_url: String,
    pub counts: FollowCounts,
    pub posts_count: u64,
    pub following: bool,
    /// Signed in and looking at someone else's profile.
    pub can_follow: bool,
    pub list: PostListView,
}

#[derive(Template)]
#[template(path = "posts/post_detail.html")]
pub struct PostDetailTemplate {
    pub layout: Layout,
    pub post: PostView,
    pub author_posts_count: u64,
    pub can_edit: bool,
    pub can_comment: bool,
    pub comment_url: String,
    pub comments: Vec<CommentView>,
}

#[derive(Template)]
#[template(path = "posts/create.html")]
pub struct PostFormTemplate {
    pub layout: Layout,
    pub is_edit: bool,
    pub action: String,
    pub form: PostForm,
    pub current_image: Option<String>,
    pub groups: Vec<GroupOption>,
    pub errors: FieldErrors,
}

#[derive(Template)]
#[template(path = "posts/follow.html")]
pub struct FollowIndexTemplate {
    pub layout: Layout,
    pub heading: String,
    pub list: PostListView,
}

#[derive(Template)]
#[template(path = "about/author.html")]
pub struct AboutAuthorTemplate {
    pub layout: Layout,
}

#[derive(Template)]
#[template(path = "about/tech.html")]
pub struct AboutTechTemplate {
    pub layout: Layout,
}

#[derive(Template)]
#[template(path = "users/signup.html")]
pub struct SignupTemplate {
    pub layout: Layout,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub errors: FieldErrors,
}

#[derive(Template)]
#[template(path = "users/login.html")]
pub struct LoginTemplate {
    pub layout: Layout,
    pub username: String,
    pub next: String,
    pub errors: FieldErrors,
}

#[derive(Template)]
#[template(path = "users/logged_out.html")]
pub struct LoggedOutTemplate {
    pub layout: Layout,
}

#[derive(Template)]
#[template(path = "core/404.html")]
pub struct NotFoundTemplate {
    pub layout: Layout,
    pub path: String,
}

#[derive(Template)]
#[template(path = "core/error.html")]
pub struct ErrorTemplate {
    pub layout: Layout,
    pub status: u16,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use crate::server::views::{PaginationView, PostView};
    use yatube_common::{
        model::{
            Id,
            group::{GroupRef, GroupSlug},
            post::{ImagePath, Post, PostContent},
            user::{User, UserHandle},
        },
        pagination::PageRequest,
    };

    #[test]
    fn post_view_links() {
        let post = Post {
            id: Id::from(5_u64),
            author: User {
                id: Id::from(1_u64),
                handle: UserHandle::new("leo".to_owned()).unwrap(),
                first_name: "Lev".to_owned(),
                last_name: "Tolstoy".to_owned(),
            },
            group: Some(GroupRef {
                id: Id::from(2_u64),
                title: "Classics".to_owned(),
                slug: GroupSlug::new("classics".to_owned()).unwrap(),
            }),
            content: PostContent {
                text: "Text".to_owned(),
                theme: String::new(),
            },
            image: Some(ImagePath::new("posts/war.gif".to_owned()).unwrap()),
        };

        let view = PostView::new(&post);
        assert_eq!(view.url, "/posts/5/");
        assert_eq!(view.edit_url, "/posts/5/edit/");
        assert_eq!(view.author.url, "/profile/leo/");
        assert_eq!(view.author.label, "Lev Tolstoy");
        assert_eq!(view.group.unwrap().url, "/group/classics/");
        assert_eq!(view.image_url.as_deref(), Some("/media/posts/war.gif"));
    }

    #[test]
    fn pagination_marks_current_page() {
        let view = PaginationView::from(PageRequest::new(2).locate(25));
        assert_eq!(view.previous, Some(1));
        assert_eq!(view.next, Some(3));
        assert_eq!(
            view.pages
                .iter()
                .filter(|page| page.current)
                .map(|page| page.number)
                .collect::<Vec<_>>(),
            [2]
        );
    }
}
