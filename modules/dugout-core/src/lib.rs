pub mod debate;
pub mod engagement;
pub mod generator;
pub mod ingestor;
pub mod interaction;
pub mod personas;
pub mod ranking;
pub mod submit;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod traits;

pub use ingestor::RssFeedSource;
pub use interaction::InteractionScheduler;
pub use personas::{ContentGenerator, PersonaGenerator};
pub use traits::{Dice, FeedSource, ForumStore, ThreadDice};
