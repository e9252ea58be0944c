//! Rowan language implementation for Kotlin
//!
//! Connects [`KtSyntaxKind`] to Rowan's generic CST infrastructure.

use rowan::Language;

use super::KtSyntaxKind;

/// Language implementation for Kotlin
///
/// Zero-sized marker tying our syntax kinds to Rowan's tree types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct KotlinLanguage;

impl Language for KotlinLanguage {
    type Kind = KtSyntaxKind;

    fn kind_from_raw(raw: rowan::SyntaxKind) -> Self::Kind {
        // Raw kinds only ever come from `kind_to_raw`, so an unknown value
        // means a foreign green node was spliced in.
        KtSyntaxKind::from_raw(raw.0).unwrap_or(KtSyntaxKind::Error)
    }

    fn kind_to_raw(kind: Self::Kind) -> rowan::SyntaxKind {
        kind.into()
    }
}
