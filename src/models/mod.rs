mod anime;

pub use anime::{AnimeMeta, GenreMatch, Recommendation, Suggestion};
