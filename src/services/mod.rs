//! Batch workflows: collection and publishing.
//!
//! Each service owns its injected boundary handles and runs one sequential
//! pass per invocation. The two workflows share nothing but the record store.

pub mod collect;
pub mod publish;

pub use collect::{CollectError, CollectReport, CollectService};
pub use publish::{
    select_candidates, EligibleRow, MessageStyle, Outcome, PublishError, PublishMode,
    PublishReport, PublishService, RowOutcome,
};
