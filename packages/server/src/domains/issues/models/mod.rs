pub mod image;
pub mod issue;
pub mod note;
pub mod response;
pub mod update;
pub mod vote;

pub use image::IssueImage;
pub use issue::{Issue, IssueCategory, IssueChanges, IssueSeverity, IssueStatus, NewIssue};
pub use note::InternalNote;
pub use response::AdminResponse;
pub use update::IssueUpdate;
pub use vote::{IssueVote, VoteOutcome, VoteType};
