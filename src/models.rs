//! Row types for the `donors`, `insults` and `announcements` relations.

use std::{fmt, str::FromStr};

use chrono::NaiveDateTime;
use diesel::{
    backend::Backend,
    deserialize::{self, FromSql, FromSqlRow},
    expression::AsExpression,
    prelude::*,
    serialize::{self, Output, ToSql},
    sql_types::Text,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A donor identity holding an unlock code.
#[derive(Queryable, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Donor {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub code: String,
    pub created_at: NaiveDateTime,
    pub is_admin: bool,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::donors)]
pub struct NewDonor<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub code: &'a str,
    pub is_admin: bool,
    pub created_at: NaiveDateTime,
}

/// Outcome of an idempotent donor registration.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Registration {
    /// A new donor row was written.
    Inserted,
    /// An existing donor was promoted to admin.
    Updated,
    /// The donor already existed and nothing changed.
    Exists,
}

impl fmt::Display for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Inserted => "inserted",
            Self::Updated => "updated",
            Self::Exists => "exists",
        })
    }
}

/// Moderation state of an insult.
#[derive(
    AsExpression, FromSqlRow, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash,
)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "snake_case")]
pub enum InsultStatus {
    Pending,
    Approved,
    Rejected,
    RejectedDuplicate,
}

impl InsultStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 4] = [
        Self::Pending,
        Self::Approved,
        Self::Rejected,
        Self::RejectedDuplicate,
    ];

    /// Stored representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::RejectedDuplicate => "rejected_duplicate",
        }
    }

    /// Whether the status is one of the rejected variants.
    #[must_use]
    pub const fn is_rejected(self) -> bool {
        matches!(self, Self::Rejected | Self::RejectedDuplicate)
    }
}

impl fmt::Display for InsultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// A status string that names none of the known moderation states.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown insult status '{0}'")]
pub struct UnknownStatus(pub String);

impl FromStr for InsultStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            // rows written by the first moderation release used a display label
            "rejected_duplicate" | "Rejected - Duplicate" => Ok(Self::RejectedDuplicate),
            other => Err(UnknownStatus(other.to_owned())),
        }
    }
}

impl<DB> ToSql<Text, DB> for InsultStatus
where
    DB: Backend,
    str: ToSql<Text, DB>,
{
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, DB>) -> serialize::Result {
        <str as ToSql<Text, DB>>::to_sql(self.as_str(), out)
    }
}

impl<DB> FromSql<Text, DB> for InsultStatus
where
    DB: Backend,
    String: FromSql<Text, DB>,
{
    fn from_sql(bytes: DB::RawValue<'_>) -> deserialize::Result<Self> {
        let raw = <String as FromSql<Text, DB>>::from_sql(bytes)?;
        Ok(raw.parse::<Self>()?)
    }
}

/// A submitted insult as stored.
#[derive(Queryable, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Insult {
    pub id: i32,
    pub text: String,
    pub submitted_by_name: Option<String>,
    pub submitted_by_email: String,
    pub show_name: bool,
    pub status: InsultStatus,
    pub rejection_reason: Option<String>,
    pub approved_by_email: Option<String>,
    pub click_count: i32,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::insults)]
pub struct NewInsult<'a> {
    pub text: &'a str,
    pub submitted_by_name: Option<&'a str>,
    pub submitted_by_email: &'a str,
    pub show_name: bool,
    pub status: InsultStatus,
    pub rejection_reason: Option<&'a str>,
    pub approved_by_email: Option<&'a str>,
    pub created_at: NaiveDateTime,
}

/// An approved insult as exposed to the public pool.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PublicInsult {
    pub id: i32,
    pub text: String,
    pub display_name: String,
    pub click_count: i32,
    pub created_at: NaiveDateTime,
}

/// A time-boxed announcement.
#[derive(Queryable, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Announcement {
    pub id: i32,
    pub title: String,
    pub body: String,
    pub category: String,
    pub starts_at: NaiveDateTime,
    pub ends_at: NaiveDateTime,
    pub created_by_email: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::announcements)]
pub struct NewAnnouncement<'a> {
    pub title: &'a str,
    pub body: &'a str,
    pub category: &'a str,
    pub starts_at: NaiveDateTime,
    pub ends_at: NaiveDateTime,
    pub created_by_email: Option<&'a str>,
    pub created_at: NaiveDateTime,
}

/// Replacement values for an announcement edit.
#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::announcements)]
pub struct AnnouncementChanges<'a> {
    pub title: &'a str,
    pub body: &'a str,
    pub category: &'a str,
    pub starts_at: NaiveDateTime,
    pub ends_at: NaiveDateTime,
}
