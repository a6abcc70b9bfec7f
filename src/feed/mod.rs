mod controller;
mod source;
mod view;

pub use controller::{FeedController, LoadOutcome, LoadTicket, SubmitOutcome};
pub use source::FeedSource;
pub use view::{
    Affordance, CatalogStats, FeedCard, FeedMode, LoadTrigger, ANONYMOUS_SHARER,
};
