//! User entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(unique)]
    pub email: String,

    /// Argon2 hash of the account password
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Access token (bearer auth)
    #[sea_orm(unique, nullable)]
    #[serde(skip_serializing)]
    pub token: Option<String>,

    /// Can this account sign in?
    #[sea_orm(default_value = true)]
    pub is_active: bool,

    /// Has the email been verified?
    #[sea_orm(default_value = false)]
    pub is_verified: bool,

    /// Pending email verification token
    #[sea_orm(nullable)]
    #[serde(skip_serializing)]
    pub verify_token: Option<String>,

    /// Pending password reset token
    #[sea_orm(nullable)]
    #[serde(skip_serializing)]
    pub reset_token: Option<String>,

    pub created_at: DateTimeWithTimeZone,
}

impl Model {
    /// Display name: the local-part of the email (text before `@`).
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.email.split('@').next().unwrap_or(&self.email)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::post::Entity")]
    Post,

    #[sea_orm(has_many = "super::like::Entity")]
    Like,

    #[sea_orm(has_many = "super::comment::Entity")]
    Comment,
}

impl Related<super::post::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Post.def()
    }
}

impl Related<super::like::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Like.def()
    }
}

impl Related<super::comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
