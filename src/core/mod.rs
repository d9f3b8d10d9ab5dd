// Core routine exports
pub mod codec;
pub mod identifier;
pub mod people;
pub mod resolver;
pub mod tender;

pub use codec::{decode, encode, CodecError, Decoded, TokenFormat};
pub use identifier::{is_uuid_shape, MatchCandidateSet, Operator, Predicate, TenderField, TenderFilter};
pub use people::compute_initials;
pub use resolver::{resolve, ResolveError, TenderLookup};
pub use tender::{generate_tender_id, EditableField};
