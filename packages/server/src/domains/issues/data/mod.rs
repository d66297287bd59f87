pub mod issue;

pub use issue::{
    AdminResponseData, InternalNoteData, IssueData, IssueDetailData, IssueImageData,
    IssueUpdateData, Viewer,
};
