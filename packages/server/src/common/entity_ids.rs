//! Typed ID definitions for all domain entities.

pub use super::id::Id;

// ============================================================================
// Entity marker types
// ============================================================================

/// Marker type for User entities.
pub struct User;

/// Marker type for Issue entities.
pub struct Issue;

/// Marker type for IssueVote entities.
pub struct IssueVote;

/// Marker type for AdminResponse entities.
pub struct AdminResponse;

/// Marker type for InternalNote entities.
pub struct InternalNote;

/// Marker type for IssueUpdate entities.
pub struct IssueUpdate;

/// Marker type for IssueImage entities.
pub struct IssueImage;

/// Marker type for County entities.
pub struct County;

/// Marker type for Constituency entities.
pub struct Constituency;

/// Marker type for Ward entities.
pub struct Ward;

/// Marker type for AnalyticsSnapshot entities.
pub struct AnalyticsSnapshot;

// ============================================================================
// Type aliases - the primary API
// ============================================================================

pub type UserId = Id<User>;
pub type IssueId = Id<Issue>;
pub type VoteId = Id<IssueVote>;
pub type ResponseId = Id<AdminResponse>;
pub type NoteId = Id<InternalNote>;
pub type UpdateId = Id<IssueUpdate>;
pub type ImageId = Id<IssueImage>;
pub type CountyId = Id<County>;
pub type ConstituencyId = Id<Constituency>;
pub type WardId = Id<Ward>;
pub type SnapshotId = Id<AnalyticsSnapshot>;
