//! Bookmark use cases.

use crate::model::bookmark::Bookmark;
use crate::model::topic::{Topic, TopicId};
use crate::repo::bookmark_repo::BookmarkRepository;
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type BookmarkServiceResult<T> = Result<T, BookmarkServiceError>;

#[derive(Debug)]
pub enum BookmarkServiceError {
    Repo(RepoError),
}

impl Display for BookmarkServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for BookmarkServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<RepoError> for BookmarkServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Result of a toggle call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookmarkToggle {
    Added(Bookmark),
    Removed,
}

/// Bookmark service facade.
pub struct BookmarkService<R: BookmarkRepository> {
    repo: R,
}

impl<R: BookmarkRepository> BookmarkService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Bookmarks `topic`, snapshotting its current title.
    pub fn add_bookmark(&self, user_id: &str, topic: &Topic) -> BookmarkServiceResult<Bookmark> {
        self.repo
            .add_bookmark(user_id, topic.id, topic.title.as_str())
            .map_err(Into::into)
    }

    pub fn remove_bookmark(&self, user_id: &str, topic_id: TopicId) -> BookmarkServiceResult<bool> {
        self.repo
            .remove_bookmark(user_id, topic_id)
            .map_err(Into::into)
    }

    pub fn is_bookmarked(&self, user_id: &str, topic_id: TopicId) -> BookmarkServiceResult<bool> {
        Ok(self.repo.find_bookmark(user_id, topic_id)?.is_some())
    }

    /// Removes the bookmark when present, otherwise adds one.
    pub fn toggle_bookmark(
        &self,
        user_id: &str,
        topic: &Topic,
    ) -> BookmarkServiceResult<BookmarkToggle> {
        if self.repo.remove_bookmark(user_id, topic.id)? {
            return Ok(BookmarkToggle::Removed);
        }
        let bookmark = self.add_bookmark(user_id, topic)?;
        Ok(BookmarkToggle::Added(bookmark))
    }

    /// Newest first.
    pub fn list_bookmarks(&self, user_id: &str) -> BookmarkServiceResult<Vec<Bookmark>> {
        self.repo.list_bookmarks(user_id).map_err(Into::into)
    }
}
