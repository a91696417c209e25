//! Routing and presentation
//!
//! For every event of a subscription, each of its rules is evaluated in
//! order; rules that pass get their own rendered [`Presentation`].
//!
//! | filter         | event types                                | music |
//! |----------------|--------------------------------------------|-------|
//! | `all`          | any                                        | no    |
//! | `music_live`   | liveScheduled, liveStarted                 | yes   |
//! | `music_normal` | premiereScheduled, premiereStarted, uploaded | yes |
//! | `music`        | liveStarted, premiereStarted, uploaded     | yes   |
//! | `available`    | liveStarted, premiereStarted, uploaded     | no    |

pub mod presentation;
pub mod rule;
pub mod table;

pub use presentation::{Author, Footer, Presentation};
pub use rule::{FilterMode, PresentationStyle, RecipientKind, RoutingRule};
pub use table::RoutingTable;
