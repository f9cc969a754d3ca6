//! # Request payloads
//!
//! Bodies are deserialized loosely (every field is an optional JSON value) so
//! that type mismatches surface as field errors with a 422, not as a
//! deserialization failure.

use std::str::FromStr;

use rf_core::{
    CommentDraft, FieldErrors, PostDraft, VotableType, VoteDirection, VoteTarget,
};
use serde::Deserialize;
use serde_json::Value;

const TITLE_MIN_CHARS: usize = 3;

#[derive(Debug, Default, Deserialize)]
pub struct StorePostRequest {
    pub title: Option<Value>,
    pub content: Option<Value>,
}

impl StorePostRequest {
    pub fn validate(self) -> Result<PostDraft, FieldErrors> {
        let mut errors = FieldErrors::new();
        let title = required_string(&mut errors, "title", self.title);
        let content = required_string(&mut errors, "content", self.content);

        if let Some(title) = &title {
            if title.chars().count() < TITLE_MIN_CHARS {
                errors.add(
                    "title",
                    format!("The title field must be at least {TITLE_MIN_CHARS} characters."),
                );
            }
        }

        match (title, content) {
            (Some(title), Some(content)) if errors.is_empty() => Ok(PostDraft { title, content }),
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct StoreCommentRequest {
    pub post_id: Option<Value>,
    pub parent_id: Option<Value>,
    pub content: Option<Value>,
}

impl StoreCommentRequest {
    /// Shape checks only; the service verifies the post and parent exist.
    pub fn validate(self) -> Result<CommentDraft, FieldErrors> {
        let mut errors = FieldErrors::new();
        let post_id = required_integer(&mut errors, "post_id", self.post_id);
        let parent_id = optional_integer(&mut errors, "parent_id", self.parent_id);
        let content = required_string(&mut errors, "content", self.content);

        match (post_id, parent_id, content) {
            (Some(post_id), Ok(parent_id), Some(content)) if errors.is_empty() => {
                Ok(CommentDraft { post_id, parent_id, content })
            }
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct StoreVoteRequest {
    pub votable_type: Option<Value>,
    pub votable_id: Option<Value>,
    pub vote: Option<Value>,
}

impl StoreVoteRequest {
    pub fn validate(self) -> Result<(VoteTarget, VoteDirection), FieldErrors> {
        let mut errors = FieldErrors::new();
        let kind = one_of::<VotableType>(&mut errors, "votable_type", self.votable_type);
        let id = required_integer(&mut errors, "votable_id", self.votable_id);
        let direction = one_of::<VoteDirection>(&mut errors, "vote", self.vote);

        match (kind, id, direction) {
            (Some(kind), Some(id), Some(direction)) => Ok((VoteTarget::new(kind, id), direction)),
            _ => Err(errors),
        }
    }
}

/// `post_id` reads as "post id" in messages.
fn attribute(field: &str) -> String {
    field.replace('_', " ")
}

/// Absent, `null` and blank strings all count as missing. Strings are trimmed.
fn present(value: Option<Value>) -> Option<Value> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.trim().is_empty() => None,
        Some(Value::String(s)) => Some(Value::String(s.trim().to_string())),
        Some(other) => Some(other),
    }
}

fn required_string(errors: &mut FieldErrors, field: &str, value: Option<Value>) -> Option<String> {
    match present(value) {
        None => {
            errors.add(field, format!("The {} field is required.", attribute(field)));
            None
        }
        Some(Value::String(s)) => Some(s),
        Some(_) => {
            errors.add(field, format!("The {} field must be a string.", attribute(field)));
            None
        }
    }
}

/// Integers may arrive as JSON numbers or numeric strings.
fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn required_integer(errors: &mut FieldErrors, field: &str, value: Option<Value>) -> Option<i64> {
    let Some(value) = present(value) else {
        errors.add(field, format!("The {} field is required.", attribute(field)));
        return None;
    };
    let parsed = as_integer(&value);
    if parsed.is_none() {
        errors.add(field, format!("The {} field must be an integer.", attribute(field)));
    }
    parsed
}

/// `Err(())` marks a present but non-integer value; the message is already recorded.
fn optional_integer(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<Value>,
) -> Result<Option<i64>, ()> {
    match present(value) {
        None => Ok(None),
        Some(value) => match as_integer(&value) {
            Some(id) => Ok(Some(id)),
            None => {
                errors.add(field, format!("The {} field must be an integer.", attribute(field)));
                Err(())
            }
        },
    }
}

fn one_of<T: FromStr>(errors: &mut FieldErrors, field: &str, value: Option<Value>) -> Option<T> {
    let Some(value) = present(value) else {
        errors.add(field, format!("The {} field is required.", attribute(field)));
        return None;
    };
    let parsed = value.as_str().and_then(|s| T::from_str(s).ok());
    if parsed.is_none() {
        errors.add(field, format!("The selected {} is invalid.", attribute(field)));
    }
    parsed
}
