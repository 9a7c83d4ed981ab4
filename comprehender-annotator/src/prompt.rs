//! Prompt templates for JavaDoc generation.

/// Characters of class source sent with a class prompt.
pub const CLASS_SNIPPET_LIMIT: usize = 1000;

const METHOD_TEMPLATE: &str = "\
You are a senior Java developer documenting production code.

Write one JavaDoc comment for the method below, following these rules:

- Use the `/** ... */` block format.
- Open with a one-line summary of what the method does, in active voice.
- Add an @param line for every parameter with a short description (e.g. \"User's name\").
- Add an @return line when the method returns a value (e.g. \"List of users\", \"True if deleted\").
- Leave out articles (the, a, an) in @param and @return descriptions.
- Be clear and brief.

Example:
/**
 * Deletes a user by ID.
 *
 * @param id ID of user
 * @return True if deleted
 */

Output the comment block only. No Markdown, no code fences, no language tag.

Method:
";

const CLASS_TEMPLATE: &str = "\
You are a senior Java engineer. Write a short JavaDoc comment describing what the Java class below does.

- Use the `/** ... */` block format.
- Two or three lines describing the class's purpose, in a professional tone.
- Output the comment block only. No code, no Markdown, no code fences, no language tag.

Class:
";

/// Prompt asking for a method's JavaDoc block.
pub fn method_prompt(method_source: &str) -> String {
    format!(
        "{}{}\n\nReturn only the comment block.\n",
        METHOD_TEMPLATE, method_source
    )
}

/// Prompt asking for a class's JavaDoc block. The source is truncated to
/// [`CLASS_SNIPPET_LIMIT`] characters.
pub fn class_prompt(class_source: &str) -> String {
    format!("{}{}\n", CLASS_TEMPLATE, truncate_chars(class_source, CLASS_SNIPPET_LIMIT))
}

fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
