// Post service - feeds, detail page, and author-only create/edit
use std::sync::Arc;

use super::{require_login, Submission};
use crate::auth::SessionUser;
use crate::error::{AppError, Result};
use crate::forms::{self, FormErrors, PostForm, INVALID_GROUP};
use crate::media::{self, MediaStore};
use crate::models::{ImageUpdate, NewPost, PostCard, PostChanges, PostFilter};
use crate::pagination::{Page, PageWindow, POSTS_PER_PAGE};
use crate::repository::BlogRepository;
use crate::views::{DetailView, FeedView, GroupView, PostFormView, ProfileView};

pub struct PostService {
    repo: Arc<dyn BlogRepository>,
    media: MediaStore,
}

/// Values derived from a submission that passed validation.
struct CleanPost {
    group_id: Option<i64>,
    image: Option<image::ImageFormat>,
}

impl PostService {
    pub fn new(repo: Arc<dyn BlogRepository>, media: MediaStore) -> Self {
        Self { repo, media }
    }

    /// Count, clamp, then fetch only the rows of the resolved page.
    async fn page_of(&self, filter: PostFilter, requested: i64) -> Result<Page<PostCard>> {
        let total = self.repo.count_posts(filter).await?;
        let window = PageWindow::resolve(requested, total, POSTS_PER_PAGE);
        let items = self
            .repo
            .list_posts(filter, window.limit(), window.offset())
            .await?;
        Ok(Page::from_window(items, window))
    }

    /// Site-wide feed, newest first.
    pub async fn index(&self, page: i64) -> Result<FeedView> {
        Ok(FeedView {
            page: self.page_of(PostFilter::All, page).await?,
        })
    }

    pub async fn group_posts(&self, slug: &str, page: i64) -> Result<GroupView> {
        let group = self
            .repo
            .find_group_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("group {}", slug)))?;

        let page = self.page_of(PostFilter::Group(group.id), page).await?;
        Ok(GroupView { group, page })
    }

    pub async fn profile(&self, username: &str, page: i64) -> Result<ProfileView> {
        let author = self
            .repo
            .find_user_by_username(username)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user {}", username)))?;

        let page = self.page_of(PostFilter::Author(author.id), page).await?;
        Ok(ProfileView {
            posts_count: page.total_items,
            author,
            page,
        })
    }

    pub async fn post_detail(&self, id: i64) -> Result<DetailView> {
        let post = self
            .repo
            .find_post(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("post {}", id)))?;

        let author_posts_count = self
            .repo
            .count_posts(PostFilter::Author(post.author_id))
            .await?;
        Ok(DetailView {
            post,
            author_posts_count,
        })
    }

    /// Callers that may submit the create form.
    pub fn authorize_create<'a>(&self, caller: Option<&'a SessionUser>) -> Result<&'a SessionUser> {
        require_login(caller, "/create/")
    }

    pub async fn create_form(&self, caller: Option<&SessionUser>) -> Result<PostFormView> {
        self.authorize_create(caller)?;
        self.form_view(PostForm::default(), FormErrors::new(), None, None)
            .await
    }

    /// On success the caller becomes the author; redirects to their profile.
    pub async fn create(
        &self,
        caller: Option<&SessionUser>,
        form: PostForm,
    ) -> Result<Submission<String, PostFormView>> {
        let caller = self.authorize_create(caller)?;

        let clean = match self.validate(&form).await? {
            Ok(clean) => clean,
            Err(errors) => {
                tracing::debug!(user_id = caller.id, "Rejected new post: {:?}", errors.fields);
                let view = self.form_view(form, errors, None, None).await?;
                return Ok(Submission::Rejected(view));
            }
        };

        let image = match (&form.image, clean.image) {
            (Some(upload), Some(format)) => Some(self.media.save_post_image(upload, format).await?),
            _ => None,
        };

        let created = self
            .repo
            .create_post(NewPost {
                author_id: caller.id,
                text: form.text.trim().to_string(),
                group_id: clean.group_id,
                image: image.clone(),
            })
            .await;
        let post = match created {
            Ok(post) => post,
            Err(e) => {
                if let Some(path) = &image {
                    self.media.remove(path).await;
                }
                return Err(e);
            }
        };

        tracing::info!(post_id = post.id, author_id = caller.id, "Post created");
        Ok(Submission::Accepted(format!("/profile/{}/", caller.username)))
    }

    /// Load the post and check the caller may edit it.
    /// Anonymous callers go to login before the post is even looked up.
    pub async fn authorize_edit(&self, caller: Option<&SessionUser>, id: i64) -> Result<PostCard> {
        let caller = require_login(caller, format!("/posts/{}/edit/", id))?;

        let post = self
            .repo
            .find_post(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("post {}", id)))?;

        if !post.is_written_by(caller.id) {
            tracing::debug!(post_id = id, user_id = caller.id, "Edit refused, not the author");
            return Err(AppError::NotAuthor { post_id: id });
        }
        Ok(post)
    }

    pub async fn edit_form(&self, caller: Option<&SessionUser>, id: i64) -> Result<PostFormView> {
        let post = self.authorize_edit(caller, id).await?;
        self.form_view(
            PostForm::from_post(&post),
            FormErrors::new(),
            Some(id),
            post.image,
        )
        .await
    }

    /// Invalid submissions change nothing. Redirects to the detail page on success.
    pub async fn edit(
        &self,
        caller: Option<&SessionUser>,
        id: i64,
        form: PostForm,
    ) -> Result<Submission<String, PostFormView>> {
        let post = self.authorize_edit(caller, id).await?;

        let clean = match self.validate(&form).await? {
            Ok(clean) => clean,
            Err(errors) => {
                tracing::debug!(post_id = id, "Rejected post edit: {:?}", errors.fields);
                let view = self.form_view(form, errors, Some(id), post.image).await?;
                return Ok(Submission::Rejected(view));
            }
        };

        let image = match (&form.image, clean.image) {
            (Some(upload), Some(format)) => {
                ImageUpdate::Replace(self.media.save_post_image(upload, format).await?)
            }
            _ if form.clear_image => ImageUpdate::Clear,
            _ => ImageUpdate::Keep,
        };

        let stored = match &image {
            ImageUpdate::Replace(path) => Some(path.clone()),
            _ => None,
        };
        let updated = self
            .repo
            .update_post(
                id,
                PostChanges {
                    text: form.text.trim().to_string(),
                    group_id: clean.group_id,
                    image,
                },
            )
            .await
            .and_then(|post| post.ok_or_else(|| AppError::NotFound(format!("post {}", id))));
        if let Err(e) = updated {
            if let Some(path) = &stored {
                self.media.remove(path).await;
            }
            return Err(e);
        }

        tracing::info!(post_id = id, "Post updated");
        Ok(Submission::Accepted(format!("/posts/{}/", id)))
    }

    /// Field rules, then the checks that need storage: the group must exist and
    /// the upload must decode as an image. Nothing is written here.
    async fn validate(
        &self,
        form: &PostForm,
    ) -> Result<std::result::Result<CleanPost, FormErrors>> {
        let mut errors = forms::collect(form);

        let group_id = match form.group_id() {
            Ok(Some(id)) => match self.repo.find_group_by_id(id).await? {
                Some(group) => Some(group.id),
                None => {
                    errors.add("group", INVALID_GROUP);
                    None
                }
            },
            Ok(None) => None,
            Err(()) => {
                errors.add("group", INVALID_GROUP);
                None
            }
        };

        let image = match &form.image {
            Some(upload) => match media::validate_image(upload).await? {
                Ok(format) => Some(format),
                Err(message) => {
                    errors.add("image", message);
                    None
                }
            },
            None => None,
        };

        if errors.is_empty() {
            Ok(Ok(CleanPost { group_id, image }))
        } else {
            Ok(Err(errors))
        }
    }

    async fn form_view(
        &self,
        mut form: PostForm,
        errors: FormErrors,
        post_id: Option<i64>,
        current_image: Option<String>,
    ) -> Result<PostFormView> {
        // Uploads are never echoed back into the page.
        form.image = None;
        Ok(PostFormView {
            form,
            errors,
            groups: self.repo.list_groups().await?,
            is_edit: post_id.is_some(),
            post_id,
            current_image,
        })
    }
}
