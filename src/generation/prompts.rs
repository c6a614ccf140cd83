//! System prompts for score generation.

/// System prompt for a new score; the user prompt is the document title.
pub const CREATE_SYSTEM_PROMPT: &str = "You are a music sheet generator specializing in ABC notation. Your job is to translate musical requests into properly formatted ABC notation.";

/// System prompt for revising `current` according to `description`.
pub fn update_system_prompt(current: &str, description: &str) -> String {
    format!(
        "Update the following ABC music notation based on the user's request.\n\
         \n\
         Current ABC notation:\n\
         {current}\n\
         \n\
         IMPORTANT: The prompt contains the specific changes the user wants to make to the music. \
         Implement these changes while maintaining proper ABC notation.\n\
         \n\
         Guidelines:\n\
         1. Focus on the musical elements the user wants to change\n\
         2. Use proper key signatures and avoid redundant accidentals\n\
         3. Maintain appropriate clef structure for piano/keyboard music\n\
         4. Make minimal changes to portions not mentioned in the update request\n\
         \n\
         Return the complete updated ABC notation with the requested changes.\n\
         \n\
         \n\
         The following description contains the EXACT musical changes requested: \"{description}\"\n\
         \n\
         Implement these specific changes while maintaining proper ABC notation."
    )
}
