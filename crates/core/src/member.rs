//! Member record types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

/// Unique identifier for a member record
///
/// Assigned by the store on insert. Ids start at 1 and are never handed out
/// twice, even after the record holding the highest id is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberId(pub i64);

impl MemberId {
    /// The id following this one
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MemberId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<i64>().map(MemberId)
    }
}

impl From<i64> for MemberId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

/// A persisted member profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    pub name: String,
    pub email: String,
    pub profession: String,
    pub about: String,
    /// Raw image bytes (avatar)
    #[serde(default)]
    pub image: Vec<u8>,
}

impl Member {
    /// Build a record from an assigned id and the caller supplied fields
    pub fn from_draft(id: MemberId, draft: MemberDraft) -> Self {
        Self {
            id,
            name: draft.name,
            email: draft.email,
            profession: draft.profession,
            about: draft.about,
            image: draft.image,
        }
    }

    /// Overwrite every mutable field with the draft's values
    pub fn apply(&mut self, draft: MemberDraft) {
        self.name = draft.name;
        self.email = draft.email;
        self.profession = draft.profession;
        self.about = draft.about;
        self.image = draft.image;
    }

    /// The mutable fields of this record
    pub fn to_draft(&self) -> MemberDraft {
        MemberDraft {
            name: self.name.clone(),
            email: self.email.clone(),
            profession: self.profession.clone(),
            about: self.about.clone(),
            image: self.image.clone(),
        }
    }
}

/// Caller supplied fields for creating or updating a member
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberDraft {
    pub name: String,
    pub email: String,
    pub profession: String,
    pub about: String,
    #[serde(default)]
    pub image: Vec<u8>,
}

impl MemberDraft {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        profession: impl Into<String>,
        about: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            profession: profession.into(),
            about: about.into(),
            image: Vec::new(),
        }
    }

    pub fn with_image(mut self, image: Vec<u8>) -> Self {
        self.image = image;
        self
    }
}
