pub mod match_record;
pub mod models;
pub mod pair;

pub use match_record::{Match, MatchStatus, MatchUpdate, PairSide, SwipeAction};
pub use models::{AgeRange, Gender, MatchPreferences, PublicUser, User, UserProfile};
pub use pair::{canonical_pair, CanonicalPair, PairKey};
