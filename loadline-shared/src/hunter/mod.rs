/// Load Hunter: offer parsing and hunt-plan matching
///
/// Brokers blast load offers by email. The parser turns one email into a
/// [`parser::LoadOffer`]; the matcher scores that offer against a tenant's
/// active hunt plans. Both halves are pure; the worker owns the queue and
/// the database writes.

pub mod matching;
pub mod parser;

pub use matching::{match_offer, MatchOutcome};
pub use parser::{parse_offer, LoadOffer, ParseError};
