//! Domain types - pure data shared by the generator, validator and interpreter

pub mod action;
pub mod commit;
pub mod convention;
pub mod prerelease;
pub mod release_config;
pub mod tag;
pub mod version;

pub use action::{
    ActionKind, ChangelogDestFile, ChangelogFormat, CheckoutDetails, ConfigureDetails,
    CreateBranch, MakeCommitsDetails, MergeDetails, ReleaseDetails, RepoAction,
    WriteChangelogsDetails,
};
pub use commit::{convert_commit_spec, convert_commit_specs, CommitDefinition, CommitSpec};
pub use convention::CommitConvention;
pub use prerelease::Prerelease;
pub use release_config::{BranchReleasePolicy, ReleaseConfig};
pub use tag::TagFormat;
pub use version::ReleaseVersion;
