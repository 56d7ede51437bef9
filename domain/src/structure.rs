//! Structural rules on the normalized prompt: emptiness, leading params, length.

use crate::CheckError;

/// Longest accepted prompt, in characters.
pub const MAX_PROMPT_CHARS: usize = 6000;

/// Run the structural checks in order; the first failure wins.
pub fn check_structure(prompt: &str, allow_empty: bool) -> Result<(), CheckError> {
    if !allow_empty && prompt.is_empty() {
        return Err(CheckError::PromptEmpty);
    }
    // A prompt made only of parameters is never a valid request.
    if prompt.starts_with("--") {
        return Err(CheckError::PromptEmptyWithParams);
    }
    if prompt.chars().count() > MAX_PROMPT_CHARS {
        return Err(CheckError::PromptTooLong);
    }
    Ok(())
}
