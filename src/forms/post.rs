use axum::body::Bytes;
use axum::extract::Multipart;
use serde::Serialize;
use validator::Validate;

use super::not_blank;
use crate::error::{AppError, Result};
use crate::models::PostCard;

pub const INVALID_GROUP: &str =
    "Select a valid choice. That choice is not one of the available choices.";

/// A file sent in the `image` field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// Post create/edit submission. `group` holds the raw selector value.
#[derive(Debug, Clone, Default, Validate, Serialize)]
pub struct PostForm {
    #[validate(custom(function = "not_blank"))]
    pub text: String,
    pub group: String,
    #[serde(skip)]
    pub image: Option<ImageUpload>,
    pub clear_image: bool,
}

impl PostForm {
    /// Form pre-filled from an existing post, as shown on the edit page.
    pub fn from_post(post: &PostCard) -> Self {
        Self {
            text: post.text.clone(),
            group: post.group_id.map(|id| id.to_string()).unwrap_or_default(),
            image: None,
            clear_image: false,
        }
    }

    /// `Ok(None)` when no group was chosen, `Err(())` when the value is not an id.
    pub fn group_id(&self) -> std::result::Result<Option<i64>, ()> {
        let raw = self.group.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        raw.parse::<i64>().map(Some).map_err(|_| ())
    }

    /// Read the `text`, `group`, `image` and `image-clear` fields of a multipart body.
    /// Unknown fields are ignored; a file input left empty counts as no upload.
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(format!("Malformed form data: {}", e)))?
        {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "image" => {
                    let file_name = field.file_name().unwrap_or_default().to_string();
                    let content_type = field.content_type().map(str::to_string);
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| AppError::BadRequest(format!("Malformed upload: {}", e)))?;
                    if !file_name.is_empty() {
                        form.image = Some(ImageUpload {
                            file_name,
                            content_type,
                            bytes,
                        });
                    }
                }
                "text" | "group" | "image-clear" => {
                    let value = field
                        .text()
                        .await
                        .map_err(|e| AppError::BadRequest(format!("Malformed form data: {}", e)))?;
                    match name.as_str() {
                        "text" => form.text = value,
                        "group" => form.group = value,
                        _ => form.clear_image = matches!(value.as_str(), "on" | "true" | "1"),
                    }
                }
                _ => {}
            }
        }

        Ok(form)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::{collect, REQUIRED};

    #[test]
    fn blank_text_is_rejected() {
        let form = PostForm {
            text: "   ".into(),
            ..Default::default()
        };
        let errors = collect(&form);
        assert_eq!(errors.field("text"), [REQUIRED]);
    }

    #[test]
    fn text_only_form_is_valid() {
        let form = PostForm {
            text: "Hello".into(),
            ..Default::default()
        };
        assert!(collect(&form).is_empty());
    }

    #[test]
    fn group_selector_parsing() {
        let mut form = PostForm::default();
        assert_eq!(form.group_id(), Ok(None));
        form.group = "12".into();
        assert_eq!(form.group_id(), Ok(Some(12)));
        form.group = "music".into();
        assert_eq!(form.group_id(), Err(()));
    }
}
