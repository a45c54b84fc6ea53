//! Explicit editing session context.
//!
//! Every mutating operation takes a [`Session`] instead of reading an
//! ambient "current user" or "current roadmap".

use serde::{Deserialize, Serialize};

use crate::error::RoadmapError;
use crate::types::{AuthorId, RoadmapId};

/// Who is acting, and on which roadmap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Authenticated identity, if any.
    pub author_id: Option<AuthorId>,
    /// Roadmap being viewed or edited.
    pub roadmap_id: RoadmapId,
}

impl Session {
    /// Session for an authenticated author.
    pub fn authenticated(author_id: AuthorId, roadmap_id: RoadmapId) -> Self {
        Self {
            author_id: Some(author_id),
            roadmap_id,
        }
    }

    /// Read-only session without identity.
    pub fn anonymous(roadmap_id: RoadmapId) -> Self {
        Self {
            author_id: None,
            roadmap_id,
        }
    }

    /// Whether an identity is present.
    pub fn is_authenticated(&self) -> bool {
        self.author_id.is_some()
    }

    /// The author, or `NotAuthenticated`.
    pub fn require_author(&self) -> Result<&AuthorId, RoadmapError> {
        self.author_id.as_ref().ok_or(RoadmapError::NotAuthenticated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymous_cannot_mutate() {
        let session = Session::anonymous(RoadmapId::new("rust"));
        assert!(matches!(session.require_author(), Err(RoadmapError::NotAuthenticated)));
    }

    #[test]
    fn test_authenticated_author() {
        let session = Session::authenticated(AuthorId::new("alice"), RoadmapId::new("rust"));
        assert_eq!(session.require_author().unwrap().as_str(), "alice");
    }
}
