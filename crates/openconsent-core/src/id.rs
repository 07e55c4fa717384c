use crate::consent_type::ConsentType;
use crate::error::{CoreError, Result};

/// Generates a globally-unique, type-tagged intent id for a consent.
///
/// The prefix lets other parts of the system infer the consent type from the
/// id alone, e.g. `PDC_0b00e9a1-...` for a domestic payment consent.
pub fn generate_intent_id(consent_type: ConsentType) -> String {
    format!("{}{}", consent_type.intent_id_prefix(), uuid::Uuid::new_v4())
}

/// Validates that an id carries the prefix of the given consent type.
pub fn validate_intent_id(id: &str, consent_type: ConsentType) -> Result<()> {
    if id.len() > consent_type.intent_id_prefix().len()
        && id.starts_with(consent_type.intent_id_prefix())
    {
        Ok(())
    } else {
        Err(CoreError::invalid_intent_id(id))
    }
}
